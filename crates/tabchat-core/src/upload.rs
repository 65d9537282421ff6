//! Upload parsing: raw delimited-text bytes into a bounded snapshot.

use crate::{Result, TabchatError};
use tabchat_types::TabularSnapshot;

/// Parse uploaded bytes into a [`TabularSnapshot`].
///
/// The first record is the header row. Numeric columns are inferred by
/// attempting to parse every non-empty value as a float; a column with no
/// non-empty values is not considered numeric. Only the first
/// `preview_rows` rows are retained (further capped by the snapshot
/// itself).
pub fn parse_dataset(
    source_name: &str,
    bytes: &[u8],
    preview_rows: usize,
) -> Result<TabularSnapshot> {
    let content = decode_utf8(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let columns: Vec<String> = reader
        .headers()
        .map_err(|e| TabchatError::UploadParseFailure(e.to_string()))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if columns.is_empty() || columns.iter().all(|c| c.is_empty()) {
        return Err(TabchatError::UploadParseFailure(
            "missing header row".to_string(),
        ));
    }

    // numeric[i] goes false on the first unparseable value; non_empty[i]
    // tracks whether the column had any values at all.
    let mut numeric = vec![true; columns.len()];
    let mut non_empty = vec![false; columns.len()];
    let mut preview: Vec<Vec<String>> = Vec::new();
    let mut total_rows = 0usize;

    for record in reader.records() {
        let record = record.map_err(|e| TabchatError::UploadParseFailure(e.to_string()))?;
        total_rows += 1;

        for i in 0..columns.len() {
            let value = record.get(i).unwrap_or("").trim();
            if value.is_empty() {
                continue;
            }
            non_empty[i] = true;
            if value.parse::<f64>().is_err() {
                numeric[i] = false;
            }
        }

        if preview.len() < preview_rows {
            let mut row: Vec<String> = record.iter().map(|v| v.to_string()).collect();
            row.resize(columns.len(), String::new());
            preview.push(row);
        }
    }

    let numeric_columns = columns
        .iter()
        .enumerate()
        .filter(|(i, _)| numeric[*i] && non_empty[*i])
        .map(|(_, c)| c.clone())
        .collect();

    Ok(TabularSnapshot::new(
        source_name,
        columns,
        numeric_columns,
        preview,
        total_rows,
    ))
}

/// Decode uploaded bytes as UTF-8, falling back to Windows-1252 (common for
/// spreadsheet-exported files).
fn decode_utf8(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        Err(_) => {
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
            decoded.into_owned()
        }
    }
}
