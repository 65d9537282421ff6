//! Bounded summaries of uploaded tabular data.

use serde::{Deserialize, Serialize};

/// Upper bound on preview rows kept in a snapshot, regardless of what the
/// caller asks for.
pub const PREVIEW_ROW_CAP: usize = 10;

/// Maximum rendered width of a single cell.
pub const PREVIEW_CELL_CAP: usize = 40;

/// An immutable, bounded summary of the most recently uploaded dataset.
///
/// Replaced wholesale on each upload; owned by one session and never
/// retained across sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabularSnapshot {
    /// Name of the uploaded file, for display only.
    pub source_name: String,
    /// Column names from the header row, in file order.
    pub columns: Vec<String>,
    /// Subset of `columns` whose non-empty values all parse as numbers.
    pub numeric_columns: Vec<String>,
    /// First rows of the dataset, cell values as text.
    pub preview: Vec<Vec<String>>,
    /// Total data rows in the uploaded file (excluding the header).
    pub total_rows: usize,
}

impl TabularSnapshot {
    /// Build a snapshot, enforcing the preview bounds.
    ///
    /// Rows beyond [`PREVIEW_ROW_CAP`] are dropped and cells are truncated
    /// to [`PREVIEW_CELL_CAP`] characters, regardless of what the caller
    /// hands in. The rendering that reaches a prompt is always bounded.
    pub fn new(
        source_name: impl Into<String>,
        columns: Vec<String>,
        numeric_columns: Vec<String>,
        preview: Vec<Vec<String>>,
        total_rows: usize,
    ) -> Self {
        let preview = preview
            .into_iter()
            .take(PREVIEW_ROW_CAP)
            .map(|row| row.into_iter().map(|cell| truncate_cell(&cell)).collect())
            .collect();

        Self {
            source_name: source_name.into(),
            columns,
            numeric_columns,
            preview,
            total_rows,
        }
    }

    /// Whether the dataset has a column with this exact name.
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c == name)
    }

    /// Whether a column was inferred as numeric.
    pub fn is_numeric(&self, name: &str) -> bool {
        self.numeric_columns.iter().any(|c| c == name)
    }

    /// Render the fixed-format textual preview folded into a user turn.
    ///
    /// The rendering never ends in a newline so the assembler can join it to
    /// the user's text with exactly one.
    pub fn render(&self) -> String {
        let mut out = format!(
            "preview of the data: {} ({} rows, showing first {})",
            self.source_name,
            self.total_rows,
            self.preview.len()
        );
        out.push('\n');
        out.push_str(&self.columns.join(" | "));
        for row in &self.preview {
            out.push('\n');
            out.push_str(&row.join(" | "));
        }
        out
    }
}

fn truncate_cell(cell: &str) -> String {
    if cell.chars().count() <= PREVIEW_CELL_CAP {
        cell.to_string()
    } else {
        let truncated: String = cell.chars().take(PREVIEW_CELL_CAP - 3).collect();
        format!("{}...", truncated)
    }
}
