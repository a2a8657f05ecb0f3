//! Reading a source into a validated `TimeSeriesFrame`.
mod normalize;
mod source;
mod table;

pub use normalize::{parse_timestamp, parse_value};
pub use source::SourceRef;
pub use table::RawTable;

use crate::config::SourceConfig;
use crate::error::{PipelineError, Result};
use crate::frame::TimeSeriesFrame;
use tracing::info;

/// Reads `source`, parses it as a delimited table and normalizes it.
///
/// Returns the raw table alongside the frame so callers can persist both.
pub fn ingest(source: &SourceRef, options: &SourceConfig) -> Result<(RawTable, TimeSeriesFrame)> {
    let delimiter = u8::try_from(options.delimiter).map_err(|_| {
        PipelineError::InvalidConfig(format!("delimiter '{}' is not a single byte", options.delimiter))
    })?;

    let text = source.read_text()?;
    let table = RawTable::parse(&text, delimiter)?;
    let (ts_idx, value_idx) = normalize::resolve_columns(
        &table,
        options.timestamp_column.as_deref(),
        options.value_column.as_deref(),
    )?;
    let frame = normalize::to_frame(&table, ts_idx, value_idx)?;

    info!(
        source = %source,
        rows = frame.len(),
        timestamp_column = %table.headers[ts_idx],
        value_column = %table.headers[value_idx],
        "ingested series"
    );
    Ok((table, frame))
}

/// `fetch(source_ref) -> TimeSeriesFrame` with the given column options.
pub fn fetch(source: &SourceRef, options: &SourceConfig) -> Result<TimeSeriesFrame> {
    ingest(source, options).map(|(_, frame)| frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn csv_file(text: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(text.as_bytes()).unwrap();
        f
    }

    #[test]
    fn test_airline_layout() {
        let f = csv_file("\"Month\",\"Passengers\"\n\"1949-01\",112\n\"1949-02\",118\n\"1949-03\",132\n");
        let source = SourceRef::Path(f.path().to_path_buf());
        let (raw, frame) = ingest(&source, &SourceConfig::default()).unwrap();
        assert_eq!(raw.headers, vec!["Month", "Passengers"]);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.values(), &[112.0, 118.0, 132.0]);
        assert_eq!(frame.infer_frequency(), Some(crate::frame::Frequency::Monthly));
    }

    #[test]
    fn test_duplicate_timestamps_fail_ingestion() {
        let f = csv_file("ds,y\n2021-01-01,1\n2021-01-02,2\n2021-01-02,5\n");
        let err = fetch(&SourceRef::Path(f.path().to_path_buf()), &SourceConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }

    #[test]
    fn test_configured_columns_and_delimiter() {
        let f = csv_file("when;other;amount\n2021-01-01;7;10\n2021-01-02;8;11\n");
        let options = SourceConfig {
            timestamp_column: Some("when".into()),
            value_column: Some("amount".into()),
            delimiter: ';',
            ..Default::default()
        };
        let frame = fetch(&SourceRef::Path(f.path().to_path_buf()), &options).unwrap();
        assert_eq!(frame.values(), &[10.0, 11.0]);
    }

    #[test]
    fn test_header_only_file_is_schema_mismatch() {
        let f = csv_file("ds,y\n");
        let err = fetch(&SourceRef::Path(f.path().to_path_buf()), &SourceConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }
}
