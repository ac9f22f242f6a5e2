//! CSV loading for pre-tokenized classification data.
//!
//! Supported format:
//! - UTF-8, comma-separated, one example per row
//! - First column: binary class index (`0` or `1`)
//! - Second column: space-separated token ids (may be double-quoted)
//! - Optional header row (auto-detected: first cell is not an integer)
//!
//! Rows are truncated to `max_length` tokens and right-padded with id 0 and
//! attention-mask 0 to the longest row in the file.

use std::path::Path;

use crate::data::batch::{Dataset, Example, NUM_CLASSES};
use crate::error::{Result, TuneError};

/// Reads and parses a CSV file into a batched dataset.
pub fn load_csv(path: &Path, max_length: usize, batch_size: usize) -> Result<Dataset> {
    let text = std::fs::read_to_string(path)?;
    let examples = parse_csv(&text, max_length)?;
    log::info!("loaded {} examples from {}", examples.len(), path.display());
    Ok(Dataset::new(examples, batch_size))
}

/// Parses CSV text into padded examples.
pub fn parse_csv(text: &str, max_length: usize) -> Result<Vec<Example>> {
    let mut lines = text.lines().peekable();

    if let Some(first) = lines.peek() {
        if is_header(first) {
            lines.next();
        }
    }

    let mut rows: Vec<(usize, Vec<u32>)> = Vec::new();

    for (row_idx, line) in lines.enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let cells = parse_csv_row(line);
        if cells.len() != 2 {
            return Err(TuneError::Csv(format!(
                "Row {}: expected 2 columns (label, token ids), got {}",
                row_idx + 1,
                cells.len()
            )));
        }

        let label: usize = cells[0].trim().parse().map_err(|_| {
            TuneError::Csv(format!(
                "Row {}: label '{}' is not a non-negative integer",
                row_idx + 1,
                cells[0]
            ))
        })?;
        if label >= NUM_CLASSES {
            return Err(TuneError::Csv(format!(
                "Row {}: label {} >= n_classes {}",
                row_idx + 1, label, NUM_CLASSES
            )));
        }

        let mut ids = parse_ids(&cells[1], row_idx + 1)?;
        ids.truncate(max_length);
        rows.push((label, ids));
    }

    if rows.is_empty() {
        return Err(TuneError::Csv("CSV contains no data rows after parsing".into()));
    }

    let width = rows.iter().map(|(_, ids)| ids.len()).max().unwrap_or(0);
    Ok(rows.into_iter()
        .map(|(label, ids)| {
            let mut attention_mask = vec![1u8; ids.len()];
            attention_mask.resize(width, 0);
            let mut input_ids = ids;
            input_ids.resize(width, 0);
            Example { input_ids, attention_mask, label }
        })
        .collect())
}

/// A header row is one whose first cell is not an integer.
fn is_header(line: &str) -> bool {
    let cells = parse_csv_row(line);
    cells.first()
        .map(|c| c.trim().parse::<usize>().is_err())
        .unwrap_or(false)
}

/// Parses a single CSV row, handling double-quoted fields.
fn parse_csv_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            c => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_ids(cell: &str, row_num: usize) -> Result<Vec<u32>> {
    cell.split_whitespace()
        .map(|tok| {
            tok.parse::<u32>().map_err(|_| {
                TuneError::Csv(format!("Row {}: '{}' is not a valid token id", row_num, tok))
            })
        })
        .collect()
}
