//! Cell extraction for the first worksheet of an uploaded workbook.

use crate::error::{Error, Result};
use calamine::{open_workbook_auto_from_rs, Data, Reader};
use std::io::Cursor;

/// Raw cell values of one data row, positionally mapped:
/// column 1 question text, columns 2-5 options, column 6 answer letter.
#[derive(Debug, Clone)]
pub(crate) struct SheetRow {
    /// One-based sheet row number (the header is row 1).
    pub row: u32,
    pub question: String,
    /// Option cells with blanks already filtered out.
    pub options: Vec<String>,
    pub answer: String,
}

/// Reads the first sheet, skipping the header row.
pub(crate) fn read_first_sheet(bytes: &[u8]) -> Result<Vec<SheetRow>> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = open_workbook_auto_from_rs(cursor)
        .map_err(|e| Error::Parse(format!("cannot open workbook: {e}")))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::Parse("workbook has no sheets".into()))?
        .map_err(|e| Error::Parse(format!("cannot read first sheet: {e}")))?;

    let (start_row, start_col) = range.start().unwrap_or((0, 0));
    let mut rows = Vec::new();
    for (i, cells) in range.rows().enumerate() {
        if i == 0 {
            // Header row.
            continue;
        }
        let value = |col: u32| -> String {
            if col < start_col {
                return String::new();
            }
            cells
                .get((col - start_col) as usize)
                .map(cell_to_string)
                .unwrap_or_default()
        };
        let options = (1..=4)
            .map(|col| value(col).trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        rows.push(SheetRow {
            row: start_row + i as u32 + 1,
            question: value(0).trim().to_string(),
            options,
            answer: value(5).trim().to_string(),
        });
    }
    Ok(rows)
}

fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) => {
            if f.fract() == 0.0 {
                format!("{:.0}", f)
            } else {
                f.to_string()
            }
        }
        Data::Bool(b) => b.to_string(),
        Data::DateTime(dt) => format!("{:.6}", dt),
        Data::DateTimeIso(s) => s.clone(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => format!("#ERR:{:?}", e),
    }
}
