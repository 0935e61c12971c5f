use crate::cache::Report;
use colored::*;
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "#")]
    number: String,
    champion: String,
    kda: String,
    result: String,
    duration: String,
    played: String,
}

pub fn display_error(error: &str) {
    eprintln!("{} {}", "Error:".red().bold(), error);
}

pub fn display_info(message: &str) {
    println!("{} {}", "i".cyan(), message);
}

pub fn display_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

pub fn display_warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}

pub fn display_report_summary(report: &Report) {
    println!(
        "\n{}",
        format!(
            "MATCH HISTORY - {} ({})",
            report.display_name, report.server
        )
        .bold()
        .cyan()
    );
    println!("{}\n", "=".repeat(60).cyan());

    if report.rows.is_empty() {
        println!(
            "{}",
            "No Ranked Solo/Duo matches in the selected range".yellow()
        );
        return;
    }

    let rows: Vec<HistoryRow> = report
        .rows
        .iter()
        .enumerate()
        .map(|(idx, row)| HistoryRow {
            number: format!("{}", idx + 1),
            champion: row.champ.clone(),
            kda: row.kda.clone(),
            result: if row.win {
                "WIN".green().to_string()
            } else {
                "LOSS".red().to_string()
            },
            duration: row.game_duration.clone(),
            played: row.time_ago.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}\n");

    println!(
        "{} {} W / {} L ({:.1}% WR)\n",
        "Overall:".bold(),
        report.wins.to_string().green(),
        report.losses.to_string().red(),
        report.win_rate
    );
}
