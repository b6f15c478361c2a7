//! CSV reader producing typed, row-addressed records.
//!
//! The first row is the header. Every following row is decoded on its own:
//! a row with the wrong number of cells or undecodable bytes becomes one
//! [`ParseFailure`] and reading goes on, so a single pass reports every
//! broken row of the file.
//!
//! A blank line inside the data is a row with one empty cell: a record of
//! its own in a single-column file, a "Too few fields" failure otherwise.
//! `skip_empty_lines` drops it along with every other all-empty row.
//!
//! UTF-16 input is decoded as a whole before tokenizing, so an undecodable
//! code unit there fails the input rather than one row.

pub mod typing;

use encoding_rs::{Encoding, UTF_8};
use serde::Serialize;
use serde_json::{Map, Value};
use std::borrow::Cow;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

use crate::error::ConfigError;
use crate::options::{resolve_encoding, ReadOptions};
use crate::report::{FailureKind, ParseFailure, RowIndex};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One data row as a column -> value mapping, in header order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    row: RowIndex,
    fields: Value,
}

impl Record {
    fn new(row: RowIndex, fields: Map<String, Value>) -> Self {
        Self {
            row,
            fields: Value::Object(fields),
        }
    }

    pub fn row(&self) -> RowIndex {
        self.row
    }

    /// The record as a JSON object.
    pub fn as_value(&self) -> &Value {
        &self.fields
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.fields.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields
            .as_object()
            .into_iter()
            .flat_map(|m| m.keys().map(String::as_str))
    }

    pub fn len(&self) -> usize {
        self.fields.as_object().map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result of reading a CSV input
#[derive(Debug, Clone)]
pub struct ParsedTable {
    /// Records in file order
    pub records: Vec<Record>,
    /// Column headers
    pub headers: Vec<String>,
    /// Encoding used to decode the input
    pub encoding: &'static Encoding,
    /// Detected or configured delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> &'static Encoding {
    if bytes.starts_with(UTF8_BOM) {
        return UTF_8;
    }

    let (charset, _confidence, _language) = chardet::detect(bytes);

    // chardet names differ slightly from WHATWG labels
    let label = match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "windows-1252".to_string(),
        other => chardet::charset2encoding(&other.to_string()).to_string(),
    };

    Encoding::for_label(label.as_bytes()).unwrap_or(UTF_8)
}

/// Decode a whole document, failing on any malformed byte sequence.
pub fn decode_content<'a>(bytes: &'a [u8], encoding: &'static Encoding) -> Result<Cow<'a, str>, String> {
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(format!("Invalid {} byte sequence", encoding.name()));
    }
    Ok(text)
}

/// Detect the delimiter by counting occurrences in the first line.
///
/// Delimiters inside double quotes are ignored. Ties go to the earlier
/// candidate, so a single-column header yields `,`.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut counts = [0usize; 4];
    let mut quoted = false;
    for c in first_line.chars() {
        if c == '"' {
            quoted = !quoted;
        } else if !quoted {
            if let Some(i) = separators.iter().position(|&s| s == c) {
                counts[i] += 1;
            }
        }
    }

    let mut best_sep = ',';
    let mut best_count = 0;
    for (&sep, &count) in separators.iter().zip(counts.iter()) {
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Parse CSV bytes into records.
///
/// # Example
/// ```
/// use csvcheck::{read_csv, ReadOptions};
///
/// let opts = ReadOptions { dynamic_typing: true, ..ReadOptions::default() };
/// let table = read_csv(b"name,age\nAlice,30\n", &opts).unwrap();
///
/// assert_eq!(table.records.len(), 1);
/// assert_eq!(table.records[0].get("age"), Some(&serde_json::json!(30)));
/// ```
pub fn read_csv(bytes: &[u8], options: &ReadOptions) -> Result<ParsedTable, Vec<ParseFailure>> {
    options.check().map_err(|e| vec![option_failure(e)])?;
    let encoding = match resolve_encoding(&options.encoding) {
        Ok(Some(encoding)) => encoding,
        Ok(None) => detect_encoding(bytes),
        Err(e) => return Err(vec![option_failure(e)]),
    };

    // ASCII-compatible encodings are tokenized as bytes and decoded cell by
    // cell, so a bad sequence is pinned to its row. UTF-16 has to be decoded
    // up front.
    let (data, cell_encoding): (Cow<'_, [u8]>, &'static Encoding) = if encoding.is_ascii_compatible() {
        let data = if encoding == UTF_8 {
            bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes)
        } else {
            bytes
        };
        (Cow::Borrowed(data), encoding)
    } else {
        match decode_content(bytes, encoding) {
            Ok(text) => (Cow::Owned(text.into_owned().into_bytes()), UTF_8),
            Err(message) => {
                return Err(vec![ParseFailure::input(FailureKind::InvalidEncoding, message)])
            }
        }
    };

    let delimiter = match options.delimiter {
        Some(d) => d,
        None => detect_delimiter(&String::from_utf8_lossy(first_line(&data))),
    };

    let delimiter_byte =
        u8::try_from(delimiter).map_err(|_| vec![option_failure(ConfigError::InvalidDelimiter(delimiter))])?;

    let blank_lines = blank_lines_before_records(&data, delimiter_byte);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter_byte)
        .from_reader(&data[..]);
    let mut rows = reader.byte_records();

    let headers = match rows.next() {
        None => {
            return Err(vec![ParseFailure::input(FailureKind::MissingHeader, "CSV file is empty")])
        }
        Some(Err(e)) => {
            return Err(vec![ParseFailure::input(
                FailureKind::MissingHeader,
                format!("Cannot read header: {}", e),
            )])
        }
        Some(Ok(header)) => read_headers(&header, cell_encoding)?,
    };

    let mut records = Vec::new();
    let mut failures = Vec::new();
    let mut offset = 0;

    let mut blank_row = csv::ByteRecord::new();
    blank_row.push_field(b"");

    // Index 0 of `blank_lines` belongs to the header.
    for (ordinal, result) in rows.enumerate() {
        let blanks = blank_lines.get(ordinal + 1).copied().unwrap_or(0);
        if !options.skip_empty_lines {
            for _ in 0..blanks {
                let row = RowIndex::from_offset(offset);
                offset += 1;
                match build_record(row, &blank_row, &headers, cell_encoding, options.dynamic_typing) {
                    Ok(record) => records.push(record),
                    Err(failure) => failures.push(failure),
                }
            }
        }

        let raw = match result {
            Ok(raw) => raw,
            Err(e) => {
                let row = RowIndex::from_offset(offset);
                offset += 1;
                failures.push(ParseFailure::at_row(row, FailureKind::MalformedRow, e.to_string()));
                continue;
            }
        };

        if options.skip_empty_lines && raw.iter().all(<[u8]>::is_empty) {
            continue;
        }

        let row = RowIndex::from_offset(offset);
        offset += 1;

        match build_record(row, &raw, &headers, cell_encoding, options.dynamic_typing) {
            Ok(record) => records.push(record),
            Err(failure) => failures.push(failure),
        }
    }

    if !failures.is_empty() {
        return Err(failures);
    }

    Ok(ParsedTable {
        records,
        headers,
        encoding,
        delimiter,
    })
}

/// Parse CSV from a reader, draining it completely.
pub fn read_csv_from<R: Read>(mut reader: R, options: &ReadOptions) -> Result<ParsedTable, Vec<ParseFailure>> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|e| vec![ParseFailure::input(FailureKind::Io, format!("Cannot read input: {}", e))])?;
    read_csv(&bytes, options)
}

/// Parse a CSV file.
pub fn read_csv_file<P: AsRef<Path>>(path: P, options: &ReadOptions) -> Result<ParsedTable, Vec<ParseFailure>> {
    let path = path.as_ref();
    let bytes = std::fs::read(path).map_err(|e| {
        vec![ParseFailure::input(
            FailureKind::Io,
            format!("Cannot read file '{}': {}", path.display(), e),
        )]
    })?;
    read_csv(&bytes, options)
}

fn option_failure(error: ConfigError) -> ParseFailure {
    let kind = match error {
        ConfigError::UnknownEncoding(_) => FailureKind::InvalidEncoding,
        ConfigError::InvalidDelimiter(_) | ConfigError::NoJobs => FailureKind::InvalidOption,
    };
    ParseFailure::input(kind, error.to_string())
}

/// Count the blank lines in front of each record, in record order.
///
/// The tokenizer skips lines with no bytes at all; this walks the same
/// quoting rules so those lines can be put back. Blank lines after the last
/// record are not counted.
fn blank_lines_before_records(data: &[u8], delimiter: u8) -> Vec<usize> {
    let mut counts = Vec::new();
    let mut pending = 0;
    let mut record_start = true;
    let mut field_start = true;
    let mut quoted = false;
    let mut i = 0;

    while i < data.len() {
        let b = data[i];

        if quoted {
            if b == b'"' {
                if data.get(i + 1) == Some(&b'"') {
                    i += 1;
                } else {
                    quoted = false;
                }
            }
            i += 1;
            continue;
        }

        if record_start {
            match b {
                b'\n' => {
                    pending += 1;
                    i += 1;
                    continue;
                }
                b'\r' => {
                    pending += 1;
                    i += if data.get(i + 1) == Some(&b'\n') { 2 } else { 1 };
                    continue;
                }
                _ => {
                    counts.push(pending);
                    pending = 0;
                    record_start = false;
                }
            }
        }

        match b {
            b'"' if field_start => {
                quoted = true;
                field_start = false;
            }
            b'\n' | b'\r' => {
                record_start = true;
                field_start = true;
                if b == b'\r' && data.get(i + 1) == Some(&b'\n') {
                    i += 1;
                }
            }
            _ if b == delimiter => field_start = true,
            _ => field_start = false,
        }
        i += 1;
    }

    counts
}

fn first_line(data: &[u8]) -> &[u8] {
    let end = data
        .iter()
        .position(|&b| b == b'\n' || b == b'\r')
        .unwrap_or(data.len());
    &data[..end]
}

fn read_headers(raw: &csv::ByteRecord, encoding: &'static Encoding) -> Result<Vec<String>, Vec<ParseFailure>> {
    let mut headers = Vec::with_capacity(raw.len());
    for cell in raw.iter() {
        let text = decode_cell(cell, encoding).ok_or_else(|| {
            vec![ParseFailure::input(
                FailureKind::InvalidEncoding,
                format!("Invalid {} byte sequence in header", encoding.name()),
            )]
        })?;
        headers.push(text.trim().to_string());
    }

    if headers.iter().all(String::is_empty) {
        return Err(vec![ParseFailure::input(FailureKind::MissingHeader, "No headers found")]);
    }

    let mut seen = HashSet::new();
    for name in &headers {
        if !seen.insert(name.as_str()) {
            return Err(vec![ParseFailure::input(
                FailureKind::DuplicateHeader,
                format!("Duplicate column '{}' in header", name),
            )]);
        }
    }

    Ok(headers)
}

fn build_record(
    row: RowIndex,
    raw: &csv::ByteRecord,
    headers: &[String],
    encoding: &'static Encoding,
    dynamic_typing: bool,
) -> Result<Record, ParseFailure> {
    if raw.len() < headers.len() {
        return Err(ParseFailure::at_row(
            row,
            FailureKind::TooFewFields,
            format!("Too few fields: expected {} fields but parsed {}", headers.len(), raw.len()),
        ));
    }
    if raw.len() > headers.len() {
        return Err(ParseFailure::at_row(
            row,
            FailureKind::TooManyFields,
            format!("Too many fields: expected {} fields but parsed {}", headers.len(), raw.len()),
        ));
    }

    let mut fields = Map::with_capacity(headers.len());
    for (header, cell) in headers.iter().zip(raw.iter()) {
        let text = decode_cell(cell, encoding).ok_or_else(|| {
            ParseFailure::at_row(
                row,
                FailureKind::InvalidEncoding,
                format!("Invalid {} byte sequence in column '{}'", encoding.name(), header),
            )
        })?;

        let value = if dynamic_typing {
            typing::coerce(&text)
        } else {
            Value::String(text.into_owned())
        };
        fields.insert(header.clone(), value);
    }

    Ok(Record::new(row, fields))
}

fn decode_cell<'a>(cell: &'a [u8], encoding: &'static Encoding) -> Option<Cow<'a, str>> {
    encoding.decode_without_bom_handling_and_without_replacement(cell)
}
