pub mod champions;
pub mod html;
