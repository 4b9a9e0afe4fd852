// Primitives for reading CSV survey exports.

use std::fs;

use csv::ReaderBuilder;
use snafu::prelude::*;

use crate::pipeline::*;
use initiative_scoring::RawTable;

pub fn read_csv_table(path: &str) -> AnalysisResult<RawTable> {
    let bytes = fs::read(path).context(OpeningFileSnafu { path })?;
    // UTF-8 with a lossy fallback; the mojibake table downstream repairs
    // what survives as text.
    let content = String::from_utf8_lossy(&bytes).to_string();
    read_csv_str(&content)
}

/// Parses CSV content into a raw table: first record is the header row.
/// Ragged records are kept; missing cells read as empty downstream.
pub fn read_csv_str(content: &str) -> AnalysisResult<RawTable> {
    let rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut headers: Vec<String> = Vec::new();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, record_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let record = record_r.context(CsvLineParseSnafu { lineno })?;
        let cells: Vec<String> = record.iter().map(|s| s.to_string()).collect();
        if idx == 0 {
            headers = cells;
        } else {
            rows.push(cells);
        }
    }
    if headers.is_empty() {
        whatever!("The CSV input has no header row");
    }
    Ok(RawTable { headers, rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_headers_and_rows() {
        let table = read_csv_str("a,b,c\n1,2,3\n4,5,6\n").unwrap();
        assert_eq!(table.headers, vec!["a", "b", "c"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1], vec!["4", "5", "6"]);
    }

    #[test]
    fn keeps_ragged_rows() {
        let table = read_csv_str("a,b,c\n1,2\n").unwrap();
        assert_eq!(table.rows[0], vec!["1", "2"]);
    }

    #[test]
    fn quoted_cells_keep_commas() {
        let table = read_csv_str("a,b\n\"Log\u{ed}stica, Compras\",x\n").unwrap();
        assert_eq!(table.rows[0][0], "Logística, Compras");
    }

    #[test]
    fn empty_input_is_an_error() {
        assert!(read_csv_str("").is_err());
    }
}
