use crate::error::AppError;

/// Continental routing value for Account-V1 and Match-V5 endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionalRoute {
    Americas,
    Europe,
    Asia,
}

impl RegionalRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionalRoute::Americas => "americas",
            RegionalRoute::Europe => "europe",
            RegionalRoute::Asia => "asia",
        }
    }
}

const PLATFORM_TO_REGIONAL: &[(&str, RegionalRoute)] = &[
    // AMERICAS
    ("na1", RegionalRoute::Americas),
    ("br1", RegionalRoute::Americas),
    ("la1", RegionalRoute::Americas),
    ("la2", RegionalRoute::Americas),
    ("oc1", RegionalRoute::Americas),
    // EUROPE
    ("euw1", RegionalRoute::Europe),
    ("eun1", RegionalRoute::Europe),
    ("tr1", RegionalRoute::Europe),
    ("ru", RegionalRoute::Europe),
    // ASIA
    ("kr", RegionalRoute::Asia),
    ("jp1", RegionalRoute::Asia),
];

/// Maps a platform code (e.g. "la2") onto its regional route.
///
/// Case-insensitive. Fails when the platform is not in the table; the error
/// lists every supported code.
pub fn resolve(platform: &str) -> Result<RegionalRoute, AppError> {
    let key = platform.trim().to_lowercase();
    PLATFORM_TO_REGIONAL
        .iter()
        .find(|(p, _)| *p == key)
        .map(|(_, r)| *r)
        .ok_or_else(|| {
            let mut supported: Vec<&str> =
                PLATFORM_TO_REGIONAL.iter().map(|(p, _)| *p).collect();
            supported.sort_unstable();
            AppError::UnsupportedPlatform {
                platform: platform.to_string(),
                supported: supported.join(", "),
            }
        })
}

/// Human-facing server label shown in reports (e.g. la2 -> LAS).
pub fn server_label(platform: &str) -> String {
    match platform.to_lowercase().as_str() {
        "la2" => "LAS".to_string(),
        "la1" => "LAN".to_string(),
        "na1" => "NA".to_string(),
        "br1" => "BR".to_string(),
        "euw1" => "EUW".to_string(),
        "eun1" => "EUNE".to_string(),
        "tr1" => "TR".to_string(),
        "ru" => "RU".to_string(),
        "kr" => "KR".to_string(),
        "jp1" => "JP".to_string(),
        "oc1" => "OCE".to_string(),
        other => other.to_uppercase(),
    }
}
