//! Lazy parsing of export chunks into [`IssueRecord`]s
//!
//! The first row of a chunk is the header. Each data row is zipped with the
//! header by position: short rows yield partial records, surplus fields are
//! dropped. The first malformed row ends the iteration with a
//! [`ParseError`]; rows already yielded stay valid.
//!
//! The underlying reader accepts broken quoting silently, so every row's raw
//! bytes are checked as well: a quoted field must close before the end of the
//! chunk and its closing quote must be followed by a delimiter or line end.

use crate::error::ParseError;
use crate::record::IssueRecord;

/// Parses one downloaded chunk
#[derive(Debug)]
pub struct CsvIngester<'a> {
    index: usize,
    data: &'a [u8],
    header: Vec<String>,
    reader: csv::Reader<&'a [u8]>,
    row: csv::StringRecord,
    done: bool,
}

impl<'a> CsvIngester<'a> {
    /// Read the header of chunk `index` and prepare to iterate its rows
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Header`] if the header row is missing or unreadable.
    pub fn new(index: usize, data: &'a [u8]) -> Result<Self, ParseError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(data);

        let header: Vec<String> = reader
            .headers()
            .map_err(|e| ParseError::Header {
                index,
                reason: e.to_string(),
            })?
            .iter()
            .map(str::to_string)
            .collect();

        if header.iter().all(String::is_empty) {
            return Err(ParseError::Header {
                index,
                reason: "missing header row".to_string(),
            });
        }

        Ok(Self {
            index,
            data,
            header,
            reader,
            row: csv::StringRecord::new(),
            done: false,
        })
    }

    /// Column names, in file order
    pub fn header(&self) -> &[String] {
        &self.header
    }

    /// 1-based chunk index
    pub fn index(&self) -> usize {
        self.index
    }

    /// Validate the quoting of the row just read against its raw bytes
    fn check_quoting(&self) -> Result<(), &'static str> {
        let start = self.row.position().map_or(0, |p| p.byte() as usize);
        let end = (self.reader.position().byte() as usize).min(self.data.len());
        match self.data.get(start..end) {
            Some(raw) => check_quoting(raw),
            None => Ok(()),
        }
    }
}

/// Scan one raw record for quoting the reader would otherwise accept
fn check_quoting(raw: &[u8]) -> Result<(), &'static str> {
    let mut i = 0;
    let mut field_start = true;
    while i < raw.len() {
        if field_start && raw[i] == b'"' {
            i += 1;
            loop {
                match raw.get(i) {
                    None => return Err("quoted field is never closed"),
                    Some(b'"') => match raw.get(i + 1) {
                        Some(b'"') => i += 2,
                        None | Some(b',' | b'\r' | b'\n') => {
                            i += 1;
                            break;
                        }
                        Some(_) => return Err("unexpected character after closing quote"),
                    },
                    Some(_) => i += 1,
                }
            }
            field_start = false;
            continue;
        }
        field_start = matches!(raw[i], b',' | b'\r' | b'\n');
        i += 1;
    }
    Ok(())
}

impl Iterator for CsvIngester<'_> {
    type Item = Result<IssueRecord, ParseError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_record(&mut self.row) {
            Ok(true) => {
                if let Err(reason) = self.check_quoting() {
                    self.done = true;
                    return Some(Err(ParseError::Row {
                        index: self.index,
                        line: self.row.position().map(csv::Position::line).unwrap_or(0),
                        reason: reason.to_string(),
                    }));
                }
                let fields = self
                    .header
                    .iter()
                    .zip(self.row.iter())
                    .map(|(name, value)| (name.clone(), value.to_string()));
                Some(Ok(IssueRecord::from_fields(fields)))
            }
            Ok(false) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                let line = e.position().map(csv::Position::line).unwrap_or(0);
                Some(Err(ParseError::Row {
                    index: self.index,
                    line,
                    reason: e.to_string(),
                }))
            }
        }
    }
}
