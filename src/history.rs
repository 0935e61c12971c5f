use crate::api::client::RiotApiClient;
use crate::api::models::MatchDto;
use crate::cache::MatchRow;
use crate::error::AppError;
use crate::render::champions;
use chrono::{DateTime, Utc};
use indicatif::ProgressBar;
use std::thread;
use std::time::Duration;

pub const PAGE_SIZE: usize = 100;

/// Ranked Solo/Duo queue id; the only queue included in report rows.
pub const SOLO_QUEUE_ID: i64 = 420;

// Voluntary pause between detail fetches, independent of 429 handling
const INTER_REQUEST_PAUSE: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, Default)]
pub struct TimeWindow {
    pub start_ts: Option<i64>,
    pub end_ts: Option<i64>,
}

/// Walks the match-id listing in fixed pages, accumulating ids in upstream
/// order until a short or empty page signals exhaustion.
pub fn collect_match_ids(
    client: &RiotApiClient,
    puuid: &str,
    window: TimeWindow,
) -> Result<Vec<String>, AppError> {
    let mut ids = Vec::new();
    let mut start = 0;
    loop {
        let page = client.get_match_ids_by_puuid(
            puuid,
            start,
            PAGE_SIZE,
            window.start_ts,
            window.end_ts,
        )?;
        if page.is_empty() {
            break;
        }
        let last_page = page.len() < PAGE_SIZE;
        ids.extend(page);
        if last_page {
            break;
        }
        start += PAGE_SIZE;
    }
    Ok(ids)
}

/// Fetches every match detail sequentially and keeps the Solo/Duo rows.
///
/// A failed match is reported and skipped so one bad fetch does not lose the
/// batch; `RateLimitExceeded` means the upstream throttle is persistent and
/// aborts the whole loop.
pub fn build_rows(
    client: &RiotApiClient,
    match_ids: &[String],
    puuid: &str,
    ddragon_version: &str,
    bar: &ProgressBar,
) -> Result<Vec<MatchRow>, AppError> {
    let mut rows = Vec::new();
    for match_id in match_ids {
        match client.get_match(match_id) {
            Ok(detail) => {
                bar.println(format!("- {} | {}", summary_line(&detail, puuid), match_id));
                if let Some(row) = row_from_match(&detail, puuid, ddragon_version) {
                    rows.push(row);
                }
            }
            Err(AppError::RateLimitExceeded) => return Err(AppError::RateLimitExceeded),
            Err(e) => {
                bar.println(format!("- {match_id}: failed to fetch detail ({e})"));
            }
        }
        bar.inc(1);
        thread::sleep(INTER_REQUEST_PAUSE);
    }
    Ok(rows)
}

/// One-line terminal summary: date | mode | champion | k/d/a | result.
pub fn summary_line(detail: &MatchDto, puuid: &str) -> String {
    let me = match detail.participant_by_puuid(puuid) {
        Some(p) => p,
        None => return "-".to_string(),
    };
    let started_at = detail
        .info
        .game_start_timestamp
        .unwrap_or(detail.info.game_creation);
    let result = if me.win { "Win" } else { "Loss" };
    format!(
        "{} | {} | {} | {}/{}/{} | {}",
        fmt_datetime(started_at),
        detail.info.game_mode,
        me.champion_name,
        me.kills,
        me.deaths,
        me.assists,
        result
    )
}

/// Converts a match into a report row. Returns None for non-Solo/Duo queues
/// and for matches the queried player is not part of.
pub fn row_from_match(
    detail: &MatchDto,
    puuid: &str,
    ddragon_version: &str,
) -> Option<MatchRow> {
    if detail.info.queue_id != SOLO_QUEUE_ID {
        return None;
    }
    let me = detail.participant_by_puuid(puuid)?;

    let game_date = DateTime::<Utc>::from_timestamp_millis(detail.info.game_creation);

    Some(MatchRow {
        champ: champions::display_name(&me.champion_name).to_string(),
        champ_id: me.champion_name.clone(),
        champ_level: me.champ_level,
        kda: format!("{}/{}/{}", me.kills, me.deaths, me.assists),
        kda_ratio: kda_ratio(me.kills, me.deaths, me.assists),
        kills: me.kills,
        deaths: me.deaths,
        assists: me.assists,
        win: me.win,
        match_id: detail.metadata.match_id.clone(),
        items: me.items().to_vec(),
        total_damage_dealt: me.total_damage_dealt_to_champions,
        gold_earned: me.gold_earned,
        vision_score: me.vision_score,
        game_duration: duration_display(detail.info.game_duration),
        game_duration_seconds: detail.info.game_duration,
        game_creation: game_date
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string()),
        time_ago: game_date.map(time_ago).unwrap_or_else(|| "-".to_string()),
        ddragon_version: ddragon_version.to_string(),
    })
}

pub fn kda_ratio(kills: i64, deaths: i64, assists: i64) -> f64 {
    let ratio = if deaths > 0 {
        (kills + assists) as f64 / deaths as f64
    } else {
        (kills + assists) as f64
    };
    (ratio * 100.0).round() / 100.0
}

/// `M:SS`, switching to `H:MM` past an hour.
pub fn duration_display(seconds: i64) -> String {
    let minutes = seconds / 60;
    if minutes >= 60 {
        format!("{}:{:02}", minutes / 60, minutes % 60)
    } else {
        format!("{}:{:02}", minutes, seconds % 60)
    }
}

fn fmt_datetime(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn time_ago(game_date: DateTime<Utc>) -> String {
    let delta = Utc::now().signed_duration_since(game_date);
    let days = delta.num_days();
    let seconds = delta.num_seconds();

    if days > 365 {
        let years = days / 365;
        format!("{} year{} ago", years, plural(years))
    } else if days > 30 {
        let months = days / 30;
        format!("{} month{} ago", months, plural(months))
    } else if days > 0 {
        format!("{} day{} ago", days, plural(days))
    } else if seconds > 3600 {
        let hours = seconds / 3600;
        format!("{} hour{} ago", hours, plural(hours))
    } else if seconds > 60 {
        let minutes = seconds / 60;
        format!("{} minute{} ago", minutes, plural(minutes))
    } else {
        "just now".to_string()
    }
}

fn plural(n: i64) -> &'static str {
    if n > 1 {
        "s"
    } else {
        ""
    }
}
