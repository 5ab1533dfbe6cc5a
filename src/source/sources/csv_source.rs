use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

use tracing::info;

use crate::data::{RawRecord, RawTable};
use crate::errors::PipelineError;
use crate::source::TabularSource;
use crate::types::SourceId;

/// CSV file on disk with a header row.
#[derive(Clone, Debug)]
pub struct CsvFileSource {
    source_id: SourceId,
    path: PathBuf,
    delimiter: u8,
}

impl CsvFileSource {
    /// Comma-delimited file at `path`.
    pub fn new(source_id: impl Into<SourceId>, path: impl Into<PathBuf>) -> Self {
        Self {
            source_id: source_id.into(),
            path: path.into(),
            delimiter: b',',
        }
    }

    /// Override the field delimiter (for example `b';'` or `b'\t'`).
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// File the table is read from.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl TabularSource for CsvFileSource {
    fn id(&self) -> &str {
        &self.source_id
    }

    fn load(&self) -> Result<RawTable, PipelineError> {
        let file = File::open(&self.path).map_err(|err| PipelineError::SourceUnavailable {
            source_id: self.source_id.clone(),
            reason: format!("failed to open {}: {err}", self.path.display()),
        })?;
        let table = read_table(&self.source_id, file, self.delimiter)?;
        info!(
            "[regionpulse:csv] loaded {} rows from {}",
            table.len(),
            self.path.display()
        );
        Ok(table)
    }
}

/// CSV document held in memory.
#[derive(Clone, Debug)]
pub struct CsvTextSource {
    source_id: SourceId,
    text: String,
}

impl CsvTextSource {
    /// Source over CSV text already in memory.
    pub fn new(source_id: impl Into<SourceId>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
        }
    }
}

impl TabularSource for CsvTextSource {
    fn id(&self) -> &str {
        &self.source_id
    }

    fn load(&self) -> Result<RawTable, PipelineError> {
        read_table(&self.source_id, self.text.as_bytes(), b',')
    }
}

/// Parse a headed CSV stream into a raw table.
///
/// Header names are trimmed. Rows may be shorter or longer than the header:
/// missing trailing fields are absent from the row and extra fields are
/// ignored. Structural CSV errors abort the load.
pub fn read_table<R: Read>(
    source_id: &str,
    reader: R,
    delimiter: u8,
) -> Result<RawTable, PipelineError> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::Headers)
        .delimiter(delimiter)
        .from_reader(reader);

    let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
    if headers.iter().all(|header| header.is_empty()) {
        return Err(PipelineError::SourceInconsistent {
            source_id: source_id.to_string(),
            details: "CSV input has no header row".to_string(),
        });
    }

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(RawRecord::from_pairs(
            headers
                .iter()
                .zip(record.iter())
                .map(|(header, value)| (header.clone(), value.to_string())),
        ));
    }
    Ok(RawTable::new(headers, rows))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_headers_and_rows() {
        let source = CsvTextSource::new(
            "covid",
            "date, state ,cases,deaths\n2021-01-01,California,100,1\n2021-01-08,California,150,2\n",
        );
        let table = source.load().unwrap();
        assert_eq!(table.headers, vec!["date", "state", "cases", "deaths"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].get("cases"), Some("150"));
        assert_eq!(table.rows[1].get("state"), Some("California"));
    }

    #[test]
    fn tolerates_ragged_rows() {
        let table = read_table("ragged", "a,b,c\n1,2\n4,5,6,7\n".as_bytes(), b',').unwrap();
        assert_eq!(table.rows[0].get("b"), Some("2"));
        assert_eq!(table.rows[0].get("c"), None);
        assert_eq!(table.rows[1].len(), 3);
    }

    #[test]
    fn custom_delimiter_is_honored() {
        let table = read_table("semi", "race;beat\nWhite;1A1\n".as_bytes(), b';').unwrap();
        assert_eq!(table.rows[0].get("beat"), Some("1A1"));
    }

    #[test]
    fn empty_input_is_inconsistent() {
        let err = read_table("empty", "".as_bytes(), b',').unwrap_err();
        assert!(matches!(err, PipelineError::SourceInconsistent { .. }));
    }

    #[test]
    fn missing_file_is_unavailable() {
        let source = CsvFileSource::new("missing", "/definitely/not/here.csv");
        let err = source.load().unwrap_err();
        assert!(matches!(err, PipelineError::SourceUnavailable { .. }));
    }
}
