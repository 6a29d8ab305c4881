use super::traits::MolecularFile;
use std::io::{self, BufRead, Write};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SmiError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// One non-empty line of a SMILES file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmiRecord {
    /// 1-based line number in the source file.
    pub line: usize,
    pub smiles: String,
    pub title: String,
}

/// Plain `SMILES [title]` files, one molecule per line.
///
/// Blank lines, `#` comments and a leading header whose first token is
/// `smiles` are skipped. Records are not parsed here; callers decide how
/// to handle unparsable SMILES.
pub struct SmiFile;

impl MolecularFile for SmiFile {
    type Record = SmiRecord;
    type Error = SmiError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<SmiRecord>, SmiError> {
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let (smiles, title) = match trimmed.split_once(char::is_whitespace) {
                Some((smiles, title)) => (smiles, title.trim()),
                None => (trimmed, ""),
            };
            if records.is_empty() && smiles.eq_ignore_ascii_case("smiles") {
                continue;
            }
            records.push(SmiRecord {
                line: idx + 1,
                smiles: smiles.to_string(),
                title: title.to_string(),
            });
        }
        Ok(records)
    }

    fn write_to(records: &[SmiRecord], writer: &mut impl Write) -> Result<(), SmiError> {
        for record in records {
            if record.title.is_empty() {
                writeln!(writer, "{}", record.smiles)?;
            } else {
                writeln!(writer, "{} {}", record.smiles, record.title)?;
            }
        }
        Ok(())
    }
}
