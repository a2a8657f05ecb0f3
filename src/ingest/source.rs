use crate::error::{PipelineError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Where a series comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceRef {
    Url(String),
    Path(PathBuf),
}

impl SourceRef {
    /// `http://` and `https://` locations are URLs, everything else is a path.
    pub fn parse(location: &str) -> Self {
        let lower = location.trim_start().to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            SourceRef::Url(location.trim().to_string())
        } else {
            SourceRef::Path(PathBuf::from(location))
        }
    }

    /// Reads the whole source as text.
    pub fn read_text(&self) -> Result<String> {
        match self {
            SourceRef::Path(path) => {
                let bytes = fs::read(path)
                    .map_err(|e| PipelineError::SourceUnavailable(format!("{}: {}", path.display(), e)))?;
                decode(bytes, self)
            }
            SourceRef::Url(url) => decode(fetch_url(url)?, self),
        }
    }
}

impl fmt::Display for SourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceRef::Url(url) => f.write_str(url),
            SourceRef::Path(path) => write!(f, "{}", path.display()),
        }
    }
}

/// A reachable source whose content is not UTF-8 is malformed, not unavailable.
fn decode(bytes: Vec<u8>, source: &SourceRef) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        PipelineError::SchemaMismatch(format!("{}: not UTF-8 text ({})", source, e.utf8_error()))
    })
}

fn fetch_url(url: &str) -> Result<Vec<u8>> {
    let unavailable = |e: reqwest::Error| PipelineError::SourceUnavailable(format!("{}: {}", url, e));

    let client = reqwest::blocking::ClientBuilder::new()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(unavailable)?;
    let resp = client.get(url).send().map_err(unavailable)?;
    if !resp.status().is_success() {
        return Err(PipelineError::SourceUnavailable(format!("{}: HTTP status {}", url, resp.status())));
    }
    Ok(resp.bytes().map_err(unavailable)?.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use rstest::rstest;

    #[rstest]
    #[case("https://example.com/a.csv", true)]
    #[case("HTTP://example.com/a.csv", true)]
    #[case("data/raw/airline.csv", false)]
    #[case("/tmp/https.csv", false)]
    fn test_parse(#[case] location: &str, #[case] is_url: bool) {
        assert_eq!(matches!(SourceRef::parse(location), SourceRef::Url(_)), is_url);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let err = SourceRef::parse("/definitely/not/here.csv").read_text().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    }

    #[test]
    fn test_refused_connection_is_unavailable() {
        let err = SourceRef::parse("http://127.0.0.1:1/series.csv").read_text().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SourceUnavailable);
    }

    #[test]
    fn test_non_utf8_file_is_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.csv");
        fs::write(&path, b"Month,Passengers\n1949-01,112\xe9\n").unwrap();
        let err = SourceRef::Path(path).read_text().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::SchemaMismatch);
    }
}
