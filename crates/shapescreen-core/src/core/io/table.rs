use csv::{ReaderBuilder, WriterBuilder};
use std::io::{Read, Write};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableError {
    #[error("Failed to read or write table '{path}': {source}")]
    Csv { path: String, source: csv::Error },
    #[error("Column '{column}' not found; available columns: {}", available.join(", "))]
    MissingColumn {
        column: String,
        available: Vec<String>,
    },
    #[error("Column '{column}' has {actual} value(s) but the table has {expected} row(s)")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableOptions {
    pub delimiter: u8,
    /// Column holding the molecule identifiers.
    pub identifier_column: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            identifier_column: "smiles".to_string(),
        }
    }
}

/// A delimited text table with a header row and one molecule per row.
///
/// Cells are kept as raw strings so that columns the screen does not
/// understand are written back exactly as read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoleculeTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    identifier: usize,
    delimiter: u8,
}

impl MoleculeTable {
    pub fn read_from_path<P: AsRef<Path>>(path: P, options: &TableOptions) -> Result<Self, TableError> {
        let path = path.as_ref();
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .delimiter(options.delimiter)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;
        Self::from_csv_reader(reader, options, path)
    }

    pub fn read_from(reader: impl Read, options: &TableOptions) -> Result<Self, TableError> {
        let reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .delimiter(options.delimiter)
            .from_reader(reader);
        Self::from_csv_reader(reader, options, Path::new("<stream>"))
    }

    fn from_csv_reader<R: Read>(
        mut reader: csv::Reader<R>,
        options: &TableOptions,
        path: &Path,
    ) -> Result<Self, TableError> {
        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| csv_error(path, e))?
            .iter()
            .map(str::to_string)
            .collect();
        let identifier = headers
            .iter()
            .position(|h| *h == options.identifier_column)
            .ok_or_else(|| TableError::MissingColumn {
                column: options.identifier_column.clone(),
                available: headers.clone(),
            })?;

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(path, e))?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self {
            headers,
            rows,
            identifier,
            delimiter: options.delimiter,
        })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn identifier(&self, row: usize) -> &str {
        &self.rows[row][self.identifier]
    }

    pub fn identifiers(&self) -> impl Iterator<Item = &str> + '_ {
        self.rows.iter().map(|row| row[self.identifier].as_str())
    }

    /// Keeps only the first `len` rows.
    pub fn truncate(&mut self, len: usize) {
        self.rows.truncate(len);
    }

    /// Sets `name` to `values`, replacing an existing column of that name in
    /// place or appending a new one.
    pub fn set_column(&mut self, name: &str, values: Vec<String>) -> Result<(), TableError> {
        if values.len() != self.rows.len() {
            return Err(TableError::LengthMismatch {
                column: name.to_string(),
                expected: self.rows.len(),
                actual: values.len(),
            });
        }
        match self.headers.iter().position(|h| h == name) {
            Some(col) => {
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row[col] = value;
                }
            }
            None => {
                self.headers.push(name.to_string());
                for (row, value) in self.rows.iter_mut().zip(values) {
                    row.push(value);
                }
            }
        }
        Ok(())
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), TableError> {
        let path = path.as_ref();
        let writer = WriterBuilder::new()
            .delimiter(self.delimiter)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;
        self.write_csv(writer, path)
    }

    pub fn write_to(&self, writer: impl Write) -> Result<(), TableError> {
        let writer = WriterBuilder::new().delimiter(self.delimiter).from_writer(writer);
        self.write_csv(writer, Path::new("<stream>"))
    }

    fn write_csv<W: Write>(&self, mut writer: csv::Writer<W>, path: &Path) -> Result<(), TableError> {
        writer.write_record(&self.headers).map_err(|e| csv_error(path, e))?;
        for row in &self.rows {
            writer.write_record(row).map_err(|e| csv_error(path, e))?;
        }
        writer.flush().map_err(|e| csv_error(path, e.into()))?;
        Ok(())
    }
}

fn csv_error(path: &Path, source: csv::Error) -> TableError {
    TableError::Csv {
        path: path.display().to_string(),
        source,
    }
}
