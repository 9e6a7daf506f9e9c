//! Text rendering for the shell
//!
//! Rows show the three list columns (checkbox, name, duration) with the full
//! path underneath.

use std::fmt::Write as _;

use super::session::AddSummary;
use crate::core::{
    AppSettings, CalculationReport, ItemStore, VideoItem, format_duration, total_duration,
};

pub const HELP_TEXT: &str = "\
Commands:
  add <path>...          Add video files
  nest <row> <path>...   Add video files under the item at <row>
  drop <url>...          Add dropped file:// URLs or paths (directories are ignored)
  list                   Show the list
  check <row>...         Check items
  uncheck <row>...       Uncheck items
  toggle <row>...        Flip checkboxes
  all | none             Check or uncheck every item
  remove                 Remove checked items
  clear                  Remove every item
  speed [value]          Show or set the playback speed (default 1.0)
  calc                   Calculate the total duration (Ctrl-C cancels)
  set <key> <value>      Change a setting
  settings               Show settings
  help                   Show this help
  quit                   Exit

Settings:
  duration_source  cached | reprobe
  probe_backend    auto | symphonia | lofty | ffprobe
  probe_workers    1-8 (more than 1 probes files in parallel when re-probing)
  include          all | checked
";

/// Nesting depth of an item (0 for top-level items)
fn depth(store: &ItemStore, item: &VideoItem) -> usize {
    let mut depth = 0;
    let mut parent = item.parent();
    while let Some(id) = parent {
        depth += 1;
        parent = store.get(id).and_then(|p| p.parent());
    }
    depth
}

/// The item list, one numbered row per item in display order
pub fn render_items(store: &ItemStore) -> String {
    if store.is_empty() {
        return "No files. Use 'add <path>...' or 'drop <url>...'.\n".to_string();
    }
    let items = store.flatten();

    let name_width = items
        .iter()
        .map(|item| item.display_name.chars().count() + 2 * depth(store, item))
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (index, item) in items.iter().enumerate() {
        let indent = "  ".repeat(depth(store, item));
        let mark = if item.checked { "x" } else { " " };
        let name = format!("{}{}", indent, item.display_name);
        let _ = writeln!(
            out,
            "{:>3}. [{}] {:<width$}  {}",
            index + 1,
            mark,
            name,
            item.duration_text(),
            width = name_width
        );
        let _ = writeln!(out, "          {}{}", indent, item.path.display());
    }
    out
}

/// Item counts and the total of the listed durations
pub fn render_footer(store: &ItemStore, settings: &AppSettings) -> String {
    let items = store.flatten();
    let checked = items.iter().filter(|item| item.checked).count();
    let listed = total_duration(items.iter().copied(), |item| settings.include.matches(item));
    format!(
        "{} items, {} checked, {} counted ({})",
        items.len(),
        checked,
        format_duration(listed),
        settings.include
    )
}

pub fn render_add_summary(summary: &AddSummary) -> String {
    let mut out = String::new();
    for failure in &summary.failures {
        let _ = writeln!(out, "Warning: {}", failure);
    }
    let _ = write!(out, "Added {} file(s)", summary.added.len());
    if !summary.failures.is_empty() {
        let _ = write!(out, ", {} skipped", summary.failures.len());
    }
    out
}

/// Progress line, rewritten in place after each item
pub fn render_progress(completed: usize, total: usize) -> String {
    format!("\rCalculating... {}/{}", completed, total)
}

/// Warnings for unreadable files, then the result label
pub fn render_report(report: &CalculationReport, label: &str) -> String {
    let mut out = String::new();
    for failure in &report.failures {
        let _ = writeln!(out, "Warning: {}", failure);
    }
    if report.cancelled {
        let _ = writeln!(
            out,
            "Cancelled after {} of {} items; showing the partial total",
            report.items_counted, report.items_total
        );
    }
    out.push_str(label);
    out
}

pub fn render_settings(settings: &AppSettings) -> String {
    match serde_json::to_string_pretty(settings) {
        Ok(json) => json,
        Err(e) => format!("Could not display settings: {}", e),
    }
}
