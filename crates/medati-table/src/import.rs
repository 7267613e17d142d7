use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use csv::ByteRecord;
use encoding_rs::WINDOWS_1252;
use serde::Deserialize;
use thiserror::Error;

use crate::table::{Column, Table, TableError};
use crate::value::{ColumnType, Value};

/// Delimiters tried by [`sniff_delimiter`], in tie-break order.
const DELIMITER_CANDIDATES: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Number of physical lines inspected by [`sniff_delimiter`].
const SNIFF_LINES: usize = 20;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvDelimiter {
    /// Guess the delimiter from the first lines of the file.
    #[default]
    Auto,
    Fixed(char),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CsvTextEncoding {
    /// Decode as UTF-8; a field with invalid UTF-8 falls back to Windows-1252.
    ///
    /// Spreadsheet exports on Windows regularly produce CP-1252 headers with umlauts.
    #[default]
    Auto,
    /// Decode as UTF-8 and reject invalid byte sequences.
    Utf8,
    /// Decode as Windows-1252 (aka CP-1252).
    Windows1252,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CsvOptions {
    pub delimiter: CsvDelimiter,
    pub encoding: CsvTextEncoding,
}

#[derive(Debug, Error)]
pub enum CsvImportError {
    #[error("csv input was empty")]
    EmptyInput,
    #[error("delimiter {0:?} is not an ASCII character")]
    InvalidDelimiter(char),
    #[error("csv parse error at row {row}, column {column}: {reason}")]
    Parse { row: u64, column: u64, reason: String },
    #[error("row {row} has {found} fields but the header has {expected}")]
    TooManyFields { row: u64, expected: usize, found: usize },
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Parse a complete CSV file into a [`Table`].
///
/// The first record is the header. Rows shorter than the header are padded with nulls;
/// longer rows are rejected. Blank lines are skipped.
pub fn read_csv_table(bytes: &[u8], options: &CsvOptions) -> Result<Table, CsvImportError> {
    let delimiter = match options.delimiter {
        CsvDelimiter::Auto => sniff_delimiter(bytes),
        CsvDelimiter::Fixed(ch) if ch.is_ascii() => ch as u8,
        CsvDelimiter::Fixed(ch) => return Err(CsvImportError::InvalidDelimiter(ch)),
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        // Headers are handled manually so row numbers in errors count the header as row 1.
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut record = ByteRecord::new();
    let mut record_index: u64 = 0;

    let has_first = csv_reader
        .read_byte_record(&mut record)
        .map_err(|e| map_csv_error(e, record_index + 1))?;
    if !has_first {
        return Err(CsvImportError::EmptyInput);
    }
    record_index += 1;
    let header = decode_record_to_strings(&record, record_index, options.encoding)?;
    let column_count = header.len();

    let mut rows: Vec<Vec<String>> = Vec::new();
    loop {
        record.clear();
        match csv_reader.read_byte_record(&mut record) {
            Ok(false) => break,
            Ok(true) => {
                record_index += 1;
                if record.len() > column_count {
                    return Err(CsvImportError::TooManyFields {
                        row: record_index,
                        expected: column_count,
                        found: record.len(),
                    });
                }
                let mut row = decode_record_to_strings(&record, record_index, options.encoding)?;
                row.resize(column_count, String::new());
                rows.push(row);
            }
            Err(e) => return Err(map_csv_error(e, record_index + 1)),
        }
    }

    let column_types = infer_column_types(&rows, column_count);
    let mut string_pool = StringPool::new();
    let columns = header
        .into_iter()
        .zip(column_types)
        .enumerate()
        .map(|(idx, (name, column_type))| {
            let values = rows
                .iter()
                .map(|row| parse_typed_value(&row[idx], column_type, &mut string_pool))
                .collect();
            Column::new(name, values)
        })
        .collect();

    Ok(Table::new(columns)?)
}

/// Guess the field delimiter of a CSV file.
///
/// A candidate that appears the same (non-zero) number of times on every sampled line
/// wins; among several such candidates the most frequent one is picked. Without a
/// consistent candidate, the most frequent delimiter of the header line is used, and
/// `,` when the header contains none of them.
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let lines = split_unquoted_lines(bytes, SNIFF_LINES);
    let Some(&header) = lines.first() else {
        return b',';
    };

    let mut best: Option<(u8, usize)> = None;
    for delim in DELIMITER_CANDIDATES {
        let first = count_unquoted(header, delim);
        if first == 0 {
            continue;
        }
        let consistent = lines.iter().all(|line| count_unquoted(line, delim) == first);
        if consistent && best.map_or(true, |(_, n)| first > n) {
            best = Some((delim, first));
        }
    }
    if let Some((delim, _)) = best {
        return delim;
    }

    DELIMITER_CANDIDATES
        .iter()
        .copied()
        .map(|delim| (delim, count_unquoted(header, delim)))
        .filter(|(_, n)| *n > 0)
        .fold(None, |acc: Option<(u8, usize)>, (delim, n)| match acc {
            Some((_, best_n)) if best_n >= n => acc,
            _ => Some((delim, n)),
        })
        .map(|(delim, _)| delim)
        .unwrap_or(b',')
}

/// Split off up to `limit` non-blank records, treating newlines inside quotes as data.
fn split_unquoted_lines(bytes: &[u8], limit: usize) -> Vec<&[u8]> {
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    let mut lines = Vec::new();
    let mut in_quotes = false;
    let mut start = 0usize;
    for (idx, b) in bytes.iter().enumerate() {
        match b {
            b'"' => in_quotes = !in_quotes,
            b'\n' if !in_quotes => {
                push_line(&mut lines, &bytes[start..idx]);
                start = idx + 1;
                if lines.len() >= limit {
                    return lines;
                }
            }
            _ => {}
        }
    }
    push_line(&mut lines, &bytes[start..]);
    lines
}

fn push_line<'a>(lines: &mut Vec<&'a [u8]>, line: &'a [u8]) {
    let line = line.strip_suffix(b"\r").unwrap_or(line);
    if !line.iter().all(u8::is_ascii_whitespace) {
        lines.push(line);
    }
}

fn count_unquoted(line: &[u8], delim: u8) -> usize {
    let mut in_quotes = false;
    let mut n = 0;
    for b in line {
        if *b == b'"' {
            in_quotes = !in_quotes;
        } else if *b == delim && !in_quotes {
            n += 1;
        }
    }
    n
}

fn infer_column_types(rows: &[Vec<String>], column_count: usize) -> Vec<ColumnType> {
    let mut out = Vec::with_capacity(column_count);
    for col in 0..column_count {
        let mut is_integer = true;
        let mut is_float = true;
        let mut is_bool = true;
        let mut saw_value = false;

        for row in rows {
            let v = row[col].trim();
            if v.is_empty() {
                continue;
            }
            saw_value = true;
            if v.parse::<i64>().is_err() {
                is_integer = false;
            }
            if parse_float(v).is_none() {
                is_float = false;
            }
            if parse_bool(v).is_none() {
                is_bool = false;
            }
            if !(is_integer || is_float || is_bool) {
                break;
            }
        }

        let ty = if !saw_value {
            ColumnType::String
        } else if is_integer {
            ColumnType::Integer
        } else if is_float {
            ColumnType::Float
        } else if is_bool {
            ColumnType::Boolean
        } else {
            ColumnType::String
        };
        out.push(ty);
    }
    out
}

fn parse_typed_value(field: &str, column_type: ColumnType, string_pool: &mut StringPool) -> Value {
    let v = field.trim();
    if v.is_empty() {
        return Value::Null;
    }

    match column_type {
        ColumnType::Integer => v.parse().map(Value::Integer).unwrap_or(Value::Null),
        ColumnType::Float => parse_float(v).map(Value::Float).unwrap_or(Value::Null),
        ColumnType::Boolean => parse_bool(v).map(Value::Boolean).unwrap_or(Value::Null),
        // Text keeps its surrounding whitespace.
        ColumnType::String => Value::String(string_pool.intern(field)),
    }
}

fn parse_float(v: &str) -> Option<f64> {
    // `f64::from_str` also accepts spellings like "infinity" that never come out of a
    // numeric export; only allow digits, sign, exponent and the decimal point.
    let plausible = v
        .chars()
        .all(|c| c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E'));
    if !plausible || !v.chars().any(|c| c.is_ascii_digit()) {
        return None;
    }
    v.parse().ok()
}

fn parse_bool(v: &str) -> Option<bool> {
    if v.eq_ignore_ascii_case("true") {
        Some(true)
    } else if v.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

fn decode_record_to_strings(
    record: &ByteRecord,
    row: u64,
    encoding: CsvTextEncoding,
) -> Result<Vec<String>, CsvImportError> {
    let mut out = Vec::with_capacity(record.len());
    for (idx, field) in record.iter().enumerate() {
        let s = decode_field(field, row, idx as u64 + 1, encoding)?;
        out.push(s.into_owned());
    }
    Ok(out)
}

fn decode_field<'a>(
    field: &'a [u8],
    row: u64,
    column: u64,
    encoding: CsvTextEncoding,
) -> Result<Cow<'a, str>, CsvImportError> {
    // Excel-exported CSVs commonly start with a UTF-8 BOM.
    let field = if row == 1 && column == 1 && field.starts_with(&[0xEF, 0xBB, 0xBF]) {
        &field[3..]
    } else {
        field
    };

    match encoding {
        CsvTextEncoding::Utf8 => std::str::from_utf8(field)
            .map(Cow::Borrowed)
            .map_err(|e| CsvImportError::Parse {
                row,
                column,
                reason: format!("invalid UTF-8: {e}"),
            }),
        CsvTextEncoding::Windows1252 => {
            let (cow, _, _) = WINDOWS_1252.decode(field);
            Ok(cow)
        }
        CsvTextEncoding::Auto => match std::str::from_utf8(field) {
            Ok(s) => Ok(Cow::Borrowed(s)),
            Err(_) => {
                let (cow, _, _) = WINDOWS_1252.decode(field);
                Ok(cow)
            }
        },
    }
}

fn map_csv_error(err: csv::Error, fallback_row: u64) -> CsvImportError {
    let reason = err.to_string();
    let pos = err.position().cloned();

    match err.into_kind() {
        csv::ErrorKind::Io(e) => CsvImportError::Io(e),
        _ => {
            let row = pos
                .map(|p| p.record())
                .filter(|r| *r > 0)
                .unwrap_or(fallback_row);
            CsvImportError::Parse {
                row,
                column: 0,
                reason,
            }
        }
    }
}

struct StringPool {
    set: HashMap<Arc<str>, ()>,
}

impl StringPool {
    fn new() -> Self {
        Self { set: HashMap::new() }
    }

    fn intern(&mut self, s: &str) -> Arc<str> {
        if let Some((k, _)) = self.set.get_key_value(s) {
            return k.clone();
        }

        let arc: Arc<str> = Arc::<str>::from(s);
        self.set.insert(arc.clone(), ());
        arc
    }
}
