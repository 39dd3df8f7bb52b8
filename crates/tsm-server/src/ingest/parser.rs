//! Streaming CSV record parser
//!
//! Reads `Date,ExecutionTime,Value` rows from any async byte source and
//! decodes them into [`MeasurementRecord`]s one at a time. Columns are
//! positional; extra columns are ignored and blank lines are skipped. A
//! delimited row of empty fields is a missing-field error.
//!
//! Numbers are accepted with either `.` or `,` as decimal separator, and a
//! second, grouping-aware pass handles inputs such as `1.234,5` or `1'234.5`.
//! Timestamps are read as RFC 3339 first, then as offset-less forms assumed
//! to be UTC, then in the dashed-time fallback `2024-01-01T10-00-00.0000Z`.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use csv_async::{AsyncReader, AsyncReaderBuilder, StringRecord, Trim};
use futures::stream::{self, Stream};
use tokio::io::AsyncRead;
use tracing::debug;

use super::error::{FileRejection, IngestError, MalformedKind};
use tsm_common::MeasurementRecord;

/// Header the service documents; other headers are tolerated
pub const EXPECTED_HEADER: [&str; 3] = ["Date", "ExecutionTime", "Value"];

const DATE_COLUMN: usize = 0;
const EXECUTION_TIME_COLUMN: usize = 1;
const VALUE_COLUMN: usize = 2;

/// Offset-less date-time layouts, interpreted as UTC
const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S%.f",
    "%m/%d/%Y %H:%M",
];

/// Date-only layouts, interpreted as midnight UTC
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Date-time layouts carrying an explicit offset that RFC 3339 does not cover
const OFFSET_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%z"];

/// Dashed time components with a literal `Z`
const FALLBACK_FORMAT: &str = "%Y-%m-%dT%H-%M-%S%.fZ";

/// One decoded data row and its 1-based position among data rows
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParsedRow {
    pub row: usize,
    pub record: MeasurementRecord,
}

/// Lazy, single-pass reader over a measurement CSV
pub struct RecordParser<R> {
    reader: AsyncReader<R>,
    buffer: StringRecord,
    row: usize,
    header_checked: bool,
    finished: bool,
}

impl<R> RecordParser<R>
where
    R: AsyncRead + Unpin + Send,
{
    pub fn new(input: R) -> Self {
        let reader = AsyncReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All)
            .create_reader(input);

        Self {
            reader,
            buffer: StringRecord::new(),
            row: 0,
            header_checked: false,
            finished: false,
        }
    }

    /// Number of data rows decoded so far
    pub fn rows_read(&self) -> usize {
        self.row
    }

    /// Decode the next data row
    ///
    /// Returns `Ok(None)` at end of input. After the first error the parser
    /// is exhausted and keeps returning `Ok(None)`.
    pub async fn next_row(&mut self) -> Result<Option<ParsedRow>, IngestError> {
        if self.finished {
            return Ok(None);
        }

        let result = self.read_next().await;
        if !matches!(result, Ok(Some(_))) {
            self.finished = true;
        }
        result
    }

    /// Consume the parser as a stream of rows
    pub fn into_stream(self) -> impl Stream<Item = Result<ParsedRow, IngestError>> {
        stream::unfold(self, |mut parser| async move {
            match parser.next_row().await {
                Ok(Some(row)) => Some((Ok(row), parser)),
                Ok(None) => None,
                Err(e) => Some((Err(e), parser)),
            }
        })
    }

    async fn read_next(&mut self) -> Result<Option<ParsedRow>, IngestError> {
        if !self.header_checked {
            self.check_header().await?;
        }

        loop {
            let has_record = self.reader.read_record(&mut self.buffer).await.map_err(|e| {
                IngestError::malformed(
                    self.row + 1,
                    MalformedKind::Unreadable,
                    format!("row could not be read: {}", e),
                )
            })?;

            if !has_record {
                return Ok(None);
            }

            // Whitespace-only line; `,,` still reaches decoding
            if self.buffer.len() == 1 && self.buffer[0].is_empty() {
                continue;
            }

            self.row += 1;
            let record = decode_record(&self.buffer, self.row)?;
            return Ok(Some(ParsedRow {
                row: self.row,
                record,
            }));
        }
    }

    async fn check_header(&mut self) -> Result<(), IngestError> {
        self.header_checked = true;

        let header = self
            .reader
            .headers()
            .await
            .map_err(|_| IngestError::FileRejected(FileRejection::UnreadableHeader))?;

        let matches = header.len() >= EXPECTED_HEADER.len()
            && EXPECTED_HEADER
                .iter()
                .zip(header.iter())
                .all(|(expected, actual)| expected.eq_ignore_ascii_case(actual));

        if !matches {
            debug!(header = ?header, "Unexpected CSV header, reading columns by position");
        }
        Ok(())
    }
}

fn decode_record(record: &StringRecord, row: usize) -> Result<MeasurementRecord, IngestError> {
    let date = required_field(record, DATE_COLUMN, "Date", row)?;
    let execution_time = required_field(record, EXECUTION_TIME_COLUMN, "ExecutionTime", row)?;
    let value = required_field(record, VALUE_COLUMN, "Value", row)?;

    let timestamp = parse_timestamp(date).ok_or_else(|| {
        IngestError::malformed(
            row,
            MalformedKind::DateParse,
            format!("cannot parse date '{}'", date),
        )
    })?;

    Ok(MeasurementRecord {
        timestamp,
        execution_time: numeric_field(execution_time, "ExecutionTime", row)?,
        value: numeric_field(value, "Value", row)?,
    })
}

fn required_field<'r>(
    record: &'r StringRecord,
    index: usize,
    name: &str,
    row: usize,
) -> Result<&'r str, IngestError> {
    match record.get(index) {
        Some(field) if !field.is_empty() => Ok(field),
        _ => Err(IngestError::malformed(
            row,
            MalformedKind::MissingField,
            format!("missing field '{}'", name),
        )),
    }
}

fn numeric_field(raw: &str, name: &str, row: usize) -> Result<f64, IngestError> {
    parse_number(raw).ok_or_else(|| {
        IngestError::malformed(
            row,
            MalformedKind::TypeConversion,
            format!("cannot convert '{}' in field '{}' to a number", raw, name),
        )
    })
}

/// Parse a decimal number written with `.` or `,` as separator
///
/// Non-finite results are rejected.
pub fn parse_number(raw: &str) -> Option<f64> {
    let normalized: String = raw
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| if c == ',' { '.' } else { c })
        .collect();

    let value = normalized
        .parse::<f64>()
        .ok()
        .or_else(|| parse_grouped_number(raw))?;

    value.is_finite().then_some(value)
}

/// Grouping-aware fallback: the right-most `.` or `,` is the decimal point,
/// every other `.`, `,`, `'`, `_` or whitespace separates digit groups.
fn parse_grouped_number(raw: &str) -> Option<f64> {
    let is_group = |c: char| matches!(c, '.' | ',' | '\'' | '_') || c.is_whitespace();

    let (integer, fraction) = match raw.rfind(['.', ',']) {
        Some(idx) => (&raw[..idx], &raw[idx + 1..]),
        None => (raw, ""),
    };

    let mut integer = integer.trim();
    let sign = match integer.chars().next() {
        Some(c @ ('-' | '+')) => {
            integer = &integer[1..];
            Some(c)
        }
        _ => None,
    };

    let digits: String = integer.chars().filter(|c| !is_group(*c)).collect();
    let fraction = fraction.trim();

    let all_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if digits.is_empty() && fraction.is_empty() {
        return None;
    }
    if !all_digits(&digits) || !all_digits(fraction) {
        return None;
    }

    let mut canonical = String::with_capacity(digits.len() + fraction.len() + 3);
    if let Some(sign) = sign {
        canonical.push(sign);
    }
    canonical.push_str(if digits.is_empty() { "0" } else { &digits });
    if !fraction.is_empty() {
        canonical.push('.');
        canonical.push_str(fraction);
    }
    canonical.parse().ok()
}

/// Parse a timestamp and normalize it to UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }

    for format in OFFSET_DATETIME_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(raw, format) {
            return date.and_hms_opt(0, 0, 0).map(|naive| naive.and_utc());
        }
    }

    NaiveDateTime::parse_from_str(raw, FALLBACK_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}
