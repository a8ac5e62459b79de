//! Character-level CSV reader for the published sheet export.
//!
//! Google's CSV export is mostly well-formed, but hand-edited cells carry
//! embedded commas, quotes and line breaks. The reader never fails: on
//! unbalanced quoting it returns whatever rows it managed to assemble.

use crate::types::RawRow;

/// Splits `text` into rows of trimmed cells.
///
/// - `,` separates cells and `\n`, `\r\n` or a lone `\r` end a row, but only
///   outside quotes.
/// - `""` inside a quoted cell is a literal quote.
/// - Rows whose cells are all blank after trimming are skipped.
#[must_use]
pub fn parse_csv(text: &str) -> Vec<RawRow> {
    let mut rows: Vec<RawRow> = Vec::new();
    let mut row: RawRow = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                cell.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => row.push(take_cell(&mut cell)),
            '\r' | '\n' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                finish_row(&mut rows, &mut row, &mut cell);
            }
            _ => cell.push(ch),
        }
    }

    finish_row(&mut rows, &mut row, &mut cell);
    rows
}

fn take_cell(cell: &mut String) -> String {
    let trimmed = cell.trim().to_owned();
    cell.clear();
    trimmed
}

fn finish_row(rows: &mut Vec<RawRow>, row: &mut RawRow, cell: &mut String) {
    row.push(take_cell(cell));
    if row.iter().any(|c| !c.is_empty()) {
        rows.push(std::mem::take(row));
    } else {
        row.clear();
    }
}

#[cfg(test)]
#[path = "parse_test.rs"]
mod tests;
