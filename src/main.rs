mod api;
mod cache;
mod config;
mod display;
mod error;
mod history;
mod region;
mod render;
mod version;

use api::client::RiotApiClient;
use cache::{Filters, Report, ReportMeta};
use clap::Parser;
use config::Config;
use display::output::{
    display_error, display_info, display_report_summary, display_success, display_warning,
};
use error::AppError;
use history::TimeWindow;
use indicatif::ProgressBar;
use render::html::{self, TemplateContext};
use std::fs;
use std::path::{Path, PathBuf};
use version::VersionStore;

const DEFAULT_DDRAGON_VERSION: &str = "14.1.1";
const VERSION_FILE: &str = "config/version.json";
const TEMPLATES_DIR: &str = "templates";

const DAY_SECS: i64 = 24 * 3600;

#[derive(Parser, Debug)]
#[command(name = "lol_report")]
#[command(about = "Fetch League of Legends match history and build an HTML report", long_about = None)]
struct Args {
    /// Platform code: la2, la1, na1, br1, euw1, eun1, tr1, ru, kr, jp1, oc1
    #[arg(long)]
    platform: String,

    /// Exact summoner name, or Riot ID in Name#TAG form
    #[arg(long)]
    summoner: String,

    /// Number of matches to list (ignored by --last-month/--last-year)
    #[arg(long, default_value = "10")]
    count: usize,

    /// Riot API key (default: discovered via environment, .env or key files)
    #[arg(long)]
    api_key: Option<String>,

    /// HTML template name under templates/
    #[arg(long)]
    html_template: Option<String>,

    /// Output directory for rendered HTML
    #[arg(long, default_value = "out")]
    out_dir: PathBuf,

    /// Fetch every match of the last month (ignores --count)
    #[arg(long)]
    last_month: bool,

    /// Fetch every match of the last year (wins over --last-month)
    #[arg(long)]
    last_year: bool,

    /// Save the fetched data as a JSON report
    #[arg(long)]
    write_json: Option<PathBuf>,

    /// Load data from a JSON report instead of calling the API
    #[arg(long)]
    read_json: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, default_value = "10")]
    timeout: u64,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        display_error(&e.to_string());
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), AppError> {
    let report = match &args.read_json {
        Some(path) => {
            display_info(&format!("Loading report from {}", path.display()));
            Report::load(path)?
        }
        None => fetch_report(&args)?,
    };

    display_report_summary(&report);

    if let Some(template_arg) = &args.html_template {
        render_html(&args, &report, template_arg)?;
    }

    Ok(())
}

fn fetch_report(args: &Args) -> Result<Report, AppError> {
    let config = Config::resolve(args.api_key.clone(), args.platform.clone(), args.timeout)?;
    let client = RiotApiClient::new(&config)?;

    display_info(&format!(
        "Fetching data for {} on {}",
        args.summoner, config.platform
    ));

    // Riot ID (Name#TAG) goes through Account-V1; a bare name takes the
    // legacy Summoner-V4 lookup
    let (puuid, display_name, summoner) =
        if let Some((game_name, tag_line)) = args.summoner.split_once('#') {
            let account = client.get_account_by_riot_id(game_name, tag_line)?;
            let riot_game = account.game_name.as_deref().unwrap_or(game_name);
            let riot_tag = account.tag_line.as_deref().unwrap_or(tag_line);
            let display_name = format!("{riot_game}#{riot_tag}");
            let summoner = client.get_summoner_by_puuid(&account.puuid)?;
            (account.puuid, display_name, summoner)
        } else {
            let summoner = client.get_summoner_by_name(&args.summoner)?;
            let display_name = summoner
                .name
                .clone()
                .unwrap_or_else(|| args.summoner.clone());
            (summoner.puuid.clone(), display_name, summoner)
        };
    display_success(&format!(
        "{} (level {})",
        display_name, summoner.summoner_level
    ));

    let ddragon_version = match client.get_ddragon_versions() {
        Ok(versions) => versions[0].clone(),
        Err(e) => {
            display_warning(&format!(
                "Could not fetch Data Dragon versions ({e}), using {DEFAULT_DDRAGON_VERSION}"
            ));
            DEFAULT_DDRAGON_VERSION.to_string()
        }
    };

    let now = chrono::Utc::now().timestamp();
    let (range, window) = if args.last_year {
        (
            "last_year",
            TimeWindow {
                start_ts: Some(now - 365 * DAY_SECS),
                end_ts: Some(now),
            },
        )
    } else if args.last_month {
        (
            "last_month",
            TimeWindow {
                start_ts: Some(now - 30 * DAY_SECS),
                end_ts: Some(now),
            },
        )
    } else {
        ("custom", TimeWindow::default())
    };

    let match_ids = if window.start_ts.is_some() {
        history::collect_match_ids(&client, &puuid, window)?
    } else {
        client.get_match_ids_by_puuid(&puuid, 0, args.count, None, None)?
    };
    display_success(&format!(
        "Found {} matches (keeping Ranked Solo/Duo only)",
        match_ids.len()
    ));

    let bar = ProgressBar::new(match_ids.len() as u64);
    bar.set_message("Fetching match details");
    let rows = history::build_rows(&client, &match_ids, &puuid, &ddragon_version, &bar)?;
    bar.finish_with_message("Match data fetched");

    let meta = ReportMeta {
        platform: config.platform.clone(),
        server: region::server_label(&config.platform),
        display_name,
        level: Some(summoner.summoner_level),
        puuid,
        ddragon_version,
        profile_icon_id: summoner.profile_icon_id,
    };
    let filters = Filters {
        range: range.to_string(),
        start_ts: window.start_ts,
        end_ts: window.end_ts,
        queue: history::SOLO_QUEUE_ID,
    };
    let report = Report::build(meta, filters, rows);

    if let Some(path) = &args.write_json {
        report.save(path)?;
        display_success(&format!("JSON report saved to {}", path.display()));
    }

    Ok(report)
}

fn render_html(args: &Args, report: &Report, template_arg: &str) -> Result<(), AppError> {
    let template_name = html::normalize_template_name(template_arg);
    let template = html::load_template(Path::new(TEMPLATES_DIR), &template_name)?;
    let ctx = TemplateContext::from_report(report);
    let rendered = html::render(&template, &ctx)?;

    let slug = html::slugify(&report.display_name);
    let out_dir = args.out_dir.join(&template_name);
    fs::create_dir_all(&out_dir)?;
    let out_path = out_dir.join(format!("{slug}-{template_name}.html"));
    fs::write(&out_path, rendered)?;
    display_success(&format!("HTML generated: {}", out_path.display()));

    let version = VersionStore::new(VERSION_FILE).increment()?;
    display_info(&format!("Report version {version}"));

    Ok(())
}
