use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};

/// A delimited text table exactly as read: header names and string cells.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// Parses `text` with a header row. Ragged rows are a schema error.
    pub fn parse(text: &str, delimiter: u8) -> Result<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(text.as_bytes());

        let headers = reader
            .headers()
            .map_err(|e| PipelineError::SchemaMismatch(format!("unreadable header: {}", e)))?
            .iter()
            .map(String::from)
            .collect::<Vec<_>>();
        if headers.is_empty() || headers.iter().all(|h| h.is_empty()) {
            return Err(PipelineError::SchemaMismatch("source has no header row".to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| PipelineError::SchemaMismatch(e.to_string()))?;
            rows.push(record.iter().map(String::from).collect());
        }
        Ok(Self { headers, rows })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_cells() {
        let table = RawTable::parse("Month, Passengers\n1949-01, 112\n1949-02,118\n", b',').unwrap();
        assert_eq!(table.headers, vec!["Month", "Passengers"]);
        assert_eq!(table.rows[0], vec!["1949-01", "112"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_index("Passengers"), Some(1));
    }

    #[test]
    fn test_ragged_row_rejected() {
        assert!(RawTable::parse("a,b\n1,2\n3\n", b',').is_err());
    }

    #[test]
    fn test_custom_delimiter() {
        let table = RawTable::parse("ds;y\n2020-01-01;1.5\n", b';').unwrap();
        assert_eq!(table.rows[0][1], "1.5");
    }
}
