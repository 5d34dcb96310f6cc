//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::passwords::{SecurityHealth, StrengthReport};
use crate::vault::DecryptedEntry;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of stored domains (Domain, Created). Secrets are never shown.
pub fn print_entries_table(entries: &[DecryptedEntry]) {
    if entries.is_empty() {
        info("No secrets in this vault yet.");
        tip("Run `sitevault set <DOMAIN>` to add your first secret.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Domain", "Created"]);

    for e in entries {
        table.add_row(vec![
            e.domain.clone(),
            e.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print strength feedback for a secret that was just stored or generated.
pub fn print_strength(report: &StrengthReport) {
    let label = format!("Strength {}/{}", report.score, report.max_score);
    if report.is_weak {
        warning(&label);
        for hint in &report.feedback {
            tip(hint);
        }
    } else {
        info(&label);
    }
}

/// Print the vault health summary.
pub fn print_health(health: &SecurityHealth) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Check", "Count", "Domains"]);
    table.add_row(vec![
        "Weak".to_string(),
        health.weak.to_string(),
        health.weak_domains.join(", "),
    ]);
    table.add_row(vec![
        "Reused".to_string(),
        health.reused.to_string(),
        health.reused_domains.join(", "),
    ]);
    println!("{table}");

    let summary = format!(
        "Security score: {}/100 ({} secrets)",
        health.score, health.total
    );
    if health.score >= 80 {
        success(&summary);
    } else {
        warning(&summary);
    }
}
