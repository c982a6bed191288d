//! Terminal presentation: the info card, the history table, and the
//! end-of-run error summary.

use std::io::{self, BufRead, Write};

use colored::*;
use log::info;
use strum::IntoEnumIterator;

use crate::error_handling::{ErrorKind, ErrorStats};
use crate::history::SelectionSet;
use crate::models::{HistoryRecord, IpInfo, RecordId};

/// Prints the info card for a lookup result. Absent fields are omitted
/// rather than rendered as blanks.
pub fn print_ip_info(info: &IpInfo) {
    println!();
    card_row("IP Address", Some(&info.ip));
    card_row("City", info.city.as_deref());
    card_row("Region", info.region.as_deref());
    card_row("Country", info.country.as_deref());
    card_row("Location", info.loc.as_deref());
    card_row("Organization", info.org.as_deref());
    card_row("Postal", info.postal.as_deref());
    card_row("Timezone", info.timezone.as_deref());
    println!();
}

fn card_row(label: &str, value: Option<&str>) {
    if let Some(value) = value {
        // pad before coloring; ANSI escapes would break the width otherwise
        println!("{} {}", format!("{label:<13}").cyan(), value);
    }
}

/// Prints the history table, most recent first.
///
/// The focused record is marked with `*`, selected records with `[x]`,
/// and records still awaiting store confirmation render a dimmed
/// `pending-N` in the id column.
pub fn print_history(
    records: &[HistoryRecord],
    selection: &SelectionSet,
    active: Option<RecordId>,
) {
    if records.is_empty() {
        println!("No search history");
        return;
    }
    println!("{}", history_header().bold());
    for record in records {
        let selected = selection.contains(record.id);
        let focused = active == Some(record.id);
        println!("{}", history_row(record, selected, focused));
    }
}

// the header prefix mirrors the five-column focus + marker prefix of rows
fn history_header() -> String {
    format!(
        "{:<5}{:>10}  {:<40}{:<36}{}",
        "", "id", "ip", "location", "first seen"
    )
}

fn history_row(record: &HistoryRecord, selected: bool, focused: bool) -> String {
    let focus = if focused { "*" } else { " " };
    let marker = if selected { "[x]" } else { "[ ]" };
    let id_column = format!("{:>10}", record.id.to_string());
    let id_column = if record.id.is_placeholder() {
        id_column.dimmed().to_string()
    } else {
        id_column
    };
    let location = format!("{}, {}, {}", record.city, record.region, record.country);
    format!(
        "{focus}{marker} {id_column}  {:<40}{:<36}{}",
        record.ip,
        location,
        record.created_at.format("%Y-%m-%d %H:%M UTC")
    )
}

/// Logs nonzero error counters accumulated over the run.
pub fn print_error_summary(stats: &ErrorStats) {
    let total = stats.total();
    if total == 0 {
        return;
    }
    info!("Error Counts ({} total):", total);
    for kind in ErrorKind::iter() {
        let count = stats.get_count(kind);
        if count > 0 {
            info!("   {}: {}", kind.as_str(), count);
        }
    }
}

/// Asks a yes/no question on stdin; only `y` or `yes` confirms.
pub fn confirm(prompt: &str) -> io::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}
