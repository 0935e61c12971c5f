use crate::error::AppError;
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// On-disk report schema version.
pub const SCHEMA_VERSION: u32 = 1;

/// One match as persisted in the JSON report and consumed by the renderer.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MatchRow {
    pub champ: String,
    pub champ_id: String,
    #[serde(default)]
    pub champ_level: i64,
    pub kda: String,
    #[serde(default)]
    pub kda_ratio: f64,
    #[serde(default)]
    pub kills: i64,
    #[serde(default)]
    pub deaths: i64,
    #[serde(default)]
    pub assists: i64,
    pub win: bool,
    pub match_id: String,
    pub items: Vec<i64>,
    #[serde(default)]
    pub total_damage_dealt: i64,
    #[serde(default)]
    pub gold_earned: i64,
    #[serde(default)]
    pub vision_score: i64,
    #[serde(default)]
    pub game_duration: String,
    #[serde(default)]
    pub game_duration_seconds: i64,
    #[serde(default)]
    pub game_creation: String,
    #[serde(default)]
    pub time_ago: String,
    pub ddragon_version: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Filters {
    pub range: String,
    #[serde(default)]
    pub start_ts: Option<i64>,
    #[serde(default)]
    pub end_ts: Option<i64>,
    pub queue: i64,
}

#[derive(Debug, Clone)]
pub struct ReportMeta {
    pub platform: String,
    pub server: String,
    pub display_name: String,
    pub level: Option<i64>,
    pub puuid: String,
    pub ddragon_version: String,
    pub profile_icon_id: Option<i64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Report {
    pub version: u32,
    pub generated_at: String,
    pub platform: String,
    pub server: String,
    pub display_name: String,
    pub level: Option<i64>,
    pub puuid: String,
    pub ddragon_version: String,
    #[serde(rename = "profileIconId")]
    pub profile_icon_id: Option<i64>,
    pub filters: Filters,
    pub rows: Vec<MatchRow>,
    pub count: usize,
    pub wins: usize,
    pub losses: usize,
    pub win_rate: f64,
}

impl Report {
    /// Assembles a report from fetched rows, computing the win/loss tallies.
    pub fn build(meta: ReportMeta, filters: Filters, rows: Vec<MatchRow>) -> Self {
        let count = rows.len();
        let wins = rows.iter().filter(|r| r.win).count();
        let losses = count - wins;
        let win_rate = if count > 0 {
            round1(wins as f64 / count as f64 * 100.0)
        } else {
            0.0
        };

        Report {
            version: SCHEMA_VERSION,
            generated_at: Local::now().format("%Y-%m-%d %H:%M").to_string(),
            platform: meta.platform,
            server: meta.server,
            display_name: meta.display_name,
            level: meta.level,
            puuid: meta.puuid,
            ddragon_version: meta.ddragon_version,
            profile_icon_id: meta.profile_icon_id,
            filters,
            rows,
            count,
            wins,
            losses,
            win_rate,
        }
    }

    pub fn load(path: &Path) -> Result<Self, AppError> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| AppError::Json(format!("Failed to parse report {}: {e}", path.display())))
    }

    pub fn save(&self, path: &Path) -> Result<(), AppError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| AppError::Json(format!("Failed to serialize report: {e}")))?;
        fs::write(path, json)?;
        Ok(())
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
