use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::Row;
use crate::error::ConfigError;

/// Reads a headed CSV file into rows keyed by header name. Short rows only
/// carry the columns they have.
pub fn read_rows(path: &Path) -> Result<Vec<Row>, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::InputNotFound(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|err| ConfigError::InputUnreadable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })?;
    read_rows_from(file).map_err(|err| ConfigError::InputUnreadable {
        path: path.to_path_buf(),
        reason: err.to_string(),
    })
}

pub fn read_rows_from<R: Read>(source: R) -> Result<Vec<Row>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::None)
        .from_reader(source);
    let headers = reader.headers()?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let row: Row = headers
            .iter()
            .zip(record.iter())
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
