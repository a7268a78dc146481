//! JSON-lines record source and sink.

use crate::StoreError;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use tradeflow_model::TradeRecord;

/// Read records from a JSON-lines file. Blank lines are skipped.
pub fn read_records(path: impl AsRef<Path>) -> Result<Vec<TradeRecord>, StoreError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| StoreError::io(path, source))?;
    let records = read_records_from(BufReader::new(file))
        .map_err(|err| match err {
            StoreError::Io { source, .. } => StoreError::io(path, source),
            other => other,
        })?;
    tracing::info!(path = %path.display(), records = records.len(), "records read");
    Ok(records)
}

/// Read records from any buffered JSON-lines source.
pub fn read_records_from<R: BufRead>(reader: R) -> Result<Vec<TradeRecord>, StoreError> {
    let mut records = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| StoreError::io(Path::new("<input>"), source))?;
        if line.trim().is_empty() {
            continue;
        }
        let record = serde_json::from_str(&line).map_err(|source| StoreError::Json {
            line: idx + 1,
            source,
        })?;
        records.push(record);
    }
    Ok(records)
}

/// Write records to a JSON-lines file, replacing it. Returns the count written.
pub fn write_records<'a, I>(path: impl AsRef<Path>, records: I) -> Result<usize, StoreError>
where
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let path = path.as_ref();
    let file = File::create(path).map_err(|source| StoreError::io(path, source))?;
    let written = write_records_to(BufWriter::new(file), records).map_err(|err| match err {
        StoreError::Io { source, .. } => StoreError::io(path, source),
        other => other,
    })?;
    tracing::info!(path = %path.display(), records = written, "records written");
    Ok(written)
}

/// Write records as JSON lines to any sink.
pub fn write_records_to<'a, W, I>(mut writer: W, records: I) -> Result<usize, StoreError>
where
    W: Write,
    I: IntoIterator<Item = &'a TradeRecord>,
{
    let out = Path::new("<output>");
    let mut written = 0;
    for (index, record) in records.into_iter().enumerate() {
        serde_json::to_writer(&mut writer, record)
            .map_err(|source| StoreError::Serialize { index, source })?;
        writer
            .write_all(b"\n")
            .map_err(|source| StoreError::io(out, source))?;
        written += 1;
    }
    writer.flush().map_err(|source| StoreError::io(out, source))?;
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.jsonl");
        let records = vec![
            TradeRecord::new()
                .with_field("decl_number", "1")
                .with_field("prod_details", "Кран шаровой"),
            TradeRecord::new().with_field("decl_number", "2"),
        ];

        assert_eq!(write_records(&path, &records).unwrap(), 2);
        assert_eq!(read_records(&path).unwrap(), records);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let input = "{\"a\":1}\n\n   \n{\"a\":2}\n";
        let records = read_records_from(input.as_bytes()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let input = "{\"a\":1}\nnot json\n";
        let err = read_records_from(input.as_bytes()).unwrap_err();
        assert!(matches!(err, StoreError::Json { line: 2, .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_records(dir.path().join("absent.jsonl")).unwrap_err();
        assert!(matches!(err, StoreError::Io { .. }));
    }
}
