//! Record reader for Packer's machine-readable output
//!
//! Packer writes one comma-separated record per line with a varying number
//! of fields and no header. Messages frequently carry unescaped quotes, so
//! the reader accepts ragged rows and treats stray quotes as literal text.

use std::io::Read;

use tracing::debug;

use crate::error::ConvertError;
use crate::Result;

/// A single raw CSV record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row(pub Vec<String>);

impl Row {
    /// Number of fields in the row.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Field at `index`, or `""` when the row is shorter.
    pub fn field(&self, index: usize) -> &str {
        self.0.get(index).map(String::as_str).unwrap_or("")
    }
}

impl<S: Into<String>> FromIterator<S> for Row {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Row(iter.into_iter().map(Into::into).collect())
    }
}

/// Read every row from `input`.
///
/// Blank lines are skipped. Only an unreadable stream (I/O failure or
/// invalid UTF-8) is an error; field counts are never checked.
///
/// A quoted field whose closing quote is followed by more text keeps that
/// quote as a literal, so `"Build" failed` reads as `Build" failed`.
pub fn read_rows<R: Read>(mut input: R) -> Result<Vec<Row>> {
    let mut raw = Vec::new();
    input
        .read_to_end(&mut raw)
        .map_err(|err| ConvertError::MalformedStream {
            line: None,
            reason: err.to_string(),
        })?;

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_slice());

    let mut rows = Vec::new();
    let mut record = csv::ByteRecord::new();
    loop {
        let start = reader.position().byte() as usize;
        if !reader.read_byte_record(&mut record)? {
            break;
        }
        let end = reader.position().byte() as usize;
        let line = record.position().map(|p| p.line());
        let source = &raw[start..end];

        let row = if source.contains(&b'"') {
            let text = std::str::from_utf8(source).map_err(|err| ConvertError::MalformedStream {
                line,
                reason: format!("invalid UTF-8: {err}"),
            })?;
            split_lazy(text.trim_matches(|c: char| c == '\r' || c == '\n'))
        } else {
            csv::StringRecord::from_byte_record(std::mem::take(&mut record))
                .map_err(|err| ConvertError::MalformedStream {
                    line,
                    reason: format!("invalid UTF-8 in field {}", err.utf8_error().field()),
                })?
                .iter()
                .collect()
        };
        rows.push(row);
    }

    debug!(rows = rows.len(), "Read machine-readable log");
    Ok(rows)
}

/// Split one record the way a lazy-quote CSV reader does.
///
/// A quote opens a quoted field only at the start of a field. Inside it,
/// `""` is an escaped quote and a quote followed by anything other than a
/// comma or the end of the record is kept as text. A quoted field left
/// open at the end of the record holds everything after the opening quote.
fn split_lazy(line: &str) -> Row {
    let mut fields = Vec::new();
    let mut rest = line;

    'fields: loop {
        let Some(mut quoted) = rest.strip_prefix('"') else {
            match rest.find(',') {
                Some(comma) => {
                    fields.push(rest[..comma].to_string());
                    rest = &rest[comma + 1..];
                    continue;
                }
                None => {
                    fields.push(rest.to_string());
                    break;
                }
            }
        };

        let mut field = String::new();
        while let Some(quote) = quoted.find('"') {
            field.push_str(&quoted[..quote]);
            quoted = &quoted[quote + 1..];

            if let Some(after) = quoted.strip_prefix('"') {
                field.push('"');
                quoted = after;
            } else if let Some(after) = quoted.strip_prefix(',') {
                fields.push(field);
                rest = after;
                continue 'fields;
            } else if quoted.is_empty() {
                fields.push(field);
                break 'fields;
            } else {
                field.push('"');
            }
        }
        field.push_str(quoted);
        fields.push(field);
        break;
    }

    Row(fields)
}
