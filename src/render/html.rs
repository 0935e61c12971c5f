use crate::cache::{MatchRow, Report};
use crate::error::AppError;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

const DDRAGON_CDN: &str = "https://ddragon.leagueoflegends.com/cdn";

/// Every value a template may reference, by field. Rendering checks the
/// template's `{{key}}` tokens against these names in both directions, so a
/// typo in either place fails instead of leaving stray tokens in the output.
#[derive(Debug)]
pub struct TemplateContext {
    pub title: String,
    pub avatar: String,
    pub invoker_name: String,
    pub subtitle: String,
    pub platform: String,
    pub server: String,
    pub level: String,
    pub matches_rows: String,
    pub generated_at: String,
    pub profile_icon_url: String,
}

impl TemplateContext {
    pub fn from_report(report: &Report) -> Self {
        let display_name = report.display_name.as_str();
        let initials: String = display_name
            .trim()
            .chars()
            .take(2)
            .collect::<String>()
            .to_uppercase();
        let subtitle = match report.filters.range.as_str() {
            "last_year" => "History of the last year".to_string(),
            "last_month" => "History of the last month".to_string(),
            _ => format!("History of the last {} matches", report.count),
        };
        let profile_icon_url = report
            .profile_icon_id
            .map(|id| {
                format!(
                    "{DDRAGON_CDN}/{}/img/profileicon/{id}.png",
                    report.ddragon_version
                )
            })
            .unwrap_or_default();

        TemplateContext {
            title: format!("LoL Profile · {display_name}"),
            avatar: initials,
            invoker_name: display_name.to_string(),
            subtitle,
            platform: report.platform.clone(),
            server: report.server.clone(),
            level: report
                .level
                .map(|l| l.to_string())
                .unwrap_or_else(|| "-".to_string()),
            matches_rows: rows_html(&report.rows),
            generated_at: report.generated_at.clone(),
            profile_icon_url,
        }
    }

    fn entries(&self) -> [(&'static str, &str); 10] {
        [
            ("title", &self.title),
            ("avatar", &self.avatar),
            ("invoker_name", &self.invoker_name),
            ("subtitle", &self.subtitle),
            ("platform", &self.platform),
            ("server", &self.server),
            ("level", &self.level),
            ("matches_rows", &self.matches_rows),
            ("generated_at", &self.generated_at),
            ("profile_icon_url", &self.profile_icon_url),
        ]
    }
}

/// Collects the `{{key}}` tokens a template declares.
pub fn placeholders(template: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
        rest = &rest[open + 2..];
        let Some(close) = rest.find("}}") else { break };
        let key = &rest[..close];
        if !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            found.insert(key.to_string());
        }
        rest = &rest[close + 2..];
    }
    found
}

/// Substitutes the context into the template, after validating that the
/// template's tokens and the context's fields match exactly.
pub fn render(template: &str, ctx: &TemplateContext) -> Result<String, AppError> {
    let declared = placeholders(template);
    let entries = ctx.entries();
    let known: BTreeSet<String> = entries.iter().map(|(k, _)| k.to_string()).collect();

    let missing: Vec<&String> = declared.difference(&known).collect();
    if !missing.is_empty() {
        return Err(AppError::Template(format!(
            "template references unknown placeholders: {}",
            missing
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }
    let unused: Vec<&String> = known.difference(&declared).collect();
    if !unused.is_empty() {
        return Err(AppError::Template(format!(
            "context keys never used by template: {}",
            unused
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )));
    }

    let mut html = template.to_string();
    for (key, value) in entries {
        html = html.replace(&format!("{{{{{key}}}}}"), value);
    }
    Ok(html)
}

/// Template names are matched loosely: lowercase, with spaces, underscores
/// and dots folded to dashes.
pub fn normalize_template_name(name: &str) -> String {
    name.trim()
        .to_lowercase()
        .replace([' ', '_', '.'], "-")
}

pub fn load_template(dir: &Path, name: &str) -> Result<String, AppError> {
    let path = dir.join(format!("{name}.html"));
    fs::read_to_string(&path)
        .map_err(|_| AppError::Template(format!("Template not found: {}", path.display())))
}

pub fn slugify(value: &str) -> String {
    value
        .to_lowercase()
        .replace(['#', ' '], "-")
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '-')
        .collect()
}

pub fn rows_html(rows: &[MatchRow]) -> String {
    rows.iter().map(row_html).collect::<Vec<_>>().join("\n")
}

fn row_html(row: &MatchRow) -> String {
    let pill_class = if row.win { "win" } else { "loss" };
    let pill_text = if row.win { "Victory" } else { "Defeat" };
    let champ_img = format!(
        "{DDRAGON_CDN}/{}/img/champion/{}.png",
        row.ddragon_version, row.champ_id
    );

    let mut items_html = String::new();
    for item_id in &row.items {
        if *item_id != 0 {
            items_html.push_str(&format!(
                "<img src=\"{DDRAGON_CDN}/{}/img/item/{item_id}.png\" class=\"item-icon\" \
                 alt=\"Item {item_id}\" title=\"Item {item_id}\" />",
                row.ddragon_version
            ));
        } else {
            items_html.push_str("<div class=\"item-empty\"></div>");
        }
    }

    format!(
        "<tr>\
         <td><div class='champ-cell'><img src='{champ_img}' class='champ-icon' alt='{champ}' />\
         <span>{champ}</span></div></td>\
         <td>{kda}</td>\
         <td><div class='items-row'>{items_html}</div></td>\
         <td><span class=\"pill {pill_class}\">{pill_text}</span></td>\
         </tr>",
        champ = row.champ,
        kda = row.kda,
    )
}
