use std::{
    io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tokio::{
    fs::File,
    io::{AsyncBufReadExt, BufReader, Lines},
};

use super::schema::RecordSchema;

#[derive(Debug, Error)]
pub enum ReadError {
    #[error("malformed {schema} record at {path}:{line}: expected at least {expected} fields, found {found}")]
    MalformedRecord {
        schema: &'static str,
        path: PathBuf,
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl ReadError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, ReadError::MalformedRecord { .. })
    }
}

/// Tokenized line of a record file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub line: usize,
    pub fields: Vec<String>,
}

impl Record {
    /// Field at `idx`, or the empty string when a trailing field is missing.
    pub fn field(&self, idx: usize) -> &str {
        self.fields.get(idx).map(String::as_str).unwrap_or("")
    }

    pub fn set_field(&mut self, idx: usize, value: impl Into<String>) {
        if self.fields.len() <= idx {
            self.fields.resize(idx + 1, String::new());
        }
        self.fields[idx] = value.into();
    }
}

/// Opens record files and splits their lines into positional fields.
#[derive(Debug, Clone, Copy)]
pub struct ContentReader {
    separator: char,
}

impl ContentReader {
    pub fn new(separator: char) -> Self {
        Self { separator }
    }

    pub fn separator(&self) -> char {
        self.separator
    }

    /// Each call opens `path` independently; the file handle is released when
    /// the returned stream is dropped or exhausted.
    pub async fn open(&self, path: &Path, schema: RecordSchema) -> Result<RecordStream, ReadError> {
        let file = File::open(path).await.map_err(|source| ReadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(RecordStream {
            path: path.to_path_buf(),
            lines: Some(BufReader::new(file).lines()),
            line: 0,
            separator: self.separator,
            schema,
        })
    }

    /// Read every record of `path`, stopping at the first malformed line.
    pub async fn read_all(&self, path: &Path, schema: RecordSchema) -> Result<Vec<Record>, ReadError> {
        let mut stream = self.open(path, schema).await?;
        let mut records = Vec::new();
        while let Some(record) = stream.next_record().await {
            records.push(record?);
        }
        Ok(records)
    }

    pub fn split(&self, line: &str, schema: &RecordSchema) -> Vec<String> {
        split_fields(line, self.separator, schema.field_count())
    }
}

pub struct RecordStream {
    path: PathBuf,
    lines: Option<Lines<BufReader<File>>>,
    line: usize,
    separator: char,
    schema: RecordSchema,
}

impl RecordStream {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next record, `None` once the file is exhausted. After an I/O error the
    /// stream is closed and yields `None`.
    pub async fn next_record(&mut self) -> Option<Result<Record, ReadError>> {
        loop {
            let lines = self.lines.as_mut()?;
            let next = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.lines = None;
                    return None;
                }
                Err(source) => {
                    self.lines = None;
                    return Some(Err(ReadError::Io {
                        path: self.path.clone(),
                        source,
                    }));
                }
            };
            self.line += 1;

            let mut line = next.trim_end_matches('\r');
            if self.line == 1 {
                line = line.trim_start_matches('\u{feff}');
            }
            if line.trim().is_empty() {
                continue;
            }

            let fields = split_fields(line, self.separator, self.schema.field_count());
            if self.line == 1 && fields.first().map(|f| f.trim()) == self.schema.header.first().copied() {
                continue;
            }

            if fields.len() < self.schema.min_fields {
                return Some(Err(ReadError::MalformedRecord {
                    schema: self.schema.name,
                    path: self.path.clone(),
                    line: self.line,
                    expected: self.schema.min_fields,
                    found: fields.len(),
                }));
            }

            return Some(Ok(Record {
                line: self.line,
                fields,
            }));
        }
    }
}

/// Split into at most `max_fields` fields; the last one keeps any separators.
pub fn split_fields(line: &str, separator: char, max_fields: usize) -> Vec<String> {
    line.splitn(max_fields.max(1), separator)
        .map(str::to_string)
        .collect()
}
