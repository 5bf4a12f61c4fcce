// rows.rs - CSV row loading into header -> value maps

use crate::error::ConvertError;
use std::collections::HashMap;
use std::path::Path;

/// One CSV record, keyed by header text. `line` is the 1-based line number
/// in the source file (header is line 1).
#[derive(Debug, Clone)]
pub struct CsvRow {
    pub line: usize,
    pub fields: HashMap<String, String>,
}

impl CsvRow {
    /// Trimmed cell value for a column, empty string when absent.
    pub fn get(&self, column: &str) -> &str {
        self.fields.get(column).map(String::as_str).unwrap_or("")
    }
}

/// Read all records from an input CSV. The first row is the header; a BOM
/// on the first header cell is stripped (registration platforms export
/// UTF-8 with BOM).
pub fn read_rows(path: &Path) -> Result<Vec<CsvRow>, ConvertError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)
        .map_err(|e| ConvertError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| ConvertError::Csv {
            path: path.display().to_string(),
            source: e,
        })?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record.map_err(|e| ConvertError::Csv {
            path: path.display().to_string(),
            source: e,
        })?;

        let mut fields = HashMap::new();
        for (header, value) in headers.iter().zip(record.iter()) {
            let value = value.trim();
            if !value.is_empty() {
                fields.insert(header.clone(), value.to_string());
            }
        }
        rows.push(CsvRow {
            line: idx + 2,
            fields,
        });
    }

    log::debug!("read {} rows from {}", rows.len(), path.display());
    Ok(rows)
}
