//! Table output formatting for CLI commands
//!
//! Cache keys, advisor search results and suggestions rendered with
//! comfy-table.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use super::truncate;
use crate::domain::models::{AdvisorSummary, Suggestion};

/// One row of `cache keys` output.
#[derive(Debug, Clone, serde::Serialize)]
pub struct CacheKeyRow {
    /// Cache key without the namespace prefix
    pub key: String,
    /// Remaining lifetime in seconds; `None` when the entry is already gone
    pub expires_in_secs: Option<i64>,
}

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    max_width: Option<u16>,
}

impl TableFormatter {
    /// Formatter that colors output when the terminal supports it.
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    /// Formatter with explicit color and width settings.
    pub const fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    /// Render `cache keys` rows.
    pub fn format_cache_keys(&self, rows: &[CacheKeyRow]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Key", "Expires In"]));

        for row in rows {
            let expires = match row.expires_in_secs {
                Some(secs) => Cell::new(format!("{secs}s")),
                None => self.colored(Cell::new("expired"), Color::DarkGrey),
            };
            table.add_row(vec![Cell::new(truncate(&row.key, 60)), expires]);
        }

        table.to_string()
    }

    /// Render search result rows.
    pub fn format_advisors(&self, advisors: &[AdvisorSummary]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["ID", "Name", "Location", "Rating", "Reviews"]));

        for advisor in advisors {
            let rating = advisor
                .average_rating
                .map_or_else(|| "-".to_string(), |r| format!("{r:.1}"));
            let rating_cell = match advisor.average_rating {
                Some(r) if r >= 4.0 => self.colored(Cell::new(rating), Color::Green),
                Some(r) if r < 2.5 => self.colored(Cell::new(rating), Color::Red),
                _ => Cell::new(rating),
            };
            table.add_row(vec![
                Cell::new(&advisor.id),
                Cell::new(truncate(&advisor.name, 32)),
                Cell::new(advisor.location.as_deref().unwrap_or("-")),
                rating_cell,
                Cell::new(advisor.review_count.map_or_else(|| "-".to_string(), |n| n.to_string())),
            ]);
        }

        table.to_string()
    }

    /// Render suggestions with their kind.
    pub fn format_suggestions(&self, suggestions: &[Suggestion]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Kind", "Suggestion"]));

        for suggestion in suggestions {
            table.add_row(vec![
                self.colored(Cell::new(suggestion.kind.to_string()), Color::Cyan),
                Cell::new(&suggestion.text),
            ]);
        }

        table.to_string()
    }

    fn colored(&self, cell: Cell, color: Color) -> Cell {
        if self.use_colors {
            cell.fg(color)
        } else {
            cell
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|title| Cell::new(title).add_attribute(Attribute::Bold))
        .collect()
}

fn supports_color() -> bool {
    // Respect NO_COLOR environment variable
    if env::var("NO_COLOR").is_ok() {
        return false;
    }

    if let Ok(term) = env::var("TERM") {
        if term == "dumb" {
            return false;
        }
    }

    true
}
