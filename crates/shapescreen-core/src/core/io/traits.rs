use std::error::Error;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// A file made of a sequence of molecule records, such as SDF conformers or
/// SMILES lines.
///
/// Formats implement the stream methods; opening and buffering paths comes
/// for free.
pub trait MolecularFile {
    type Record;
    type Error: Error + From<io::Error>;

    /// Parses all records from `reader`, stopping at the first malformed one.
    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Self::Record>, Self::Error>;

    /// Serializes `records` in order. The caller flushes.
    fn write_to(records: &[Self::Record], writer: &mut impl Write) -> Result<(), Self::Error>;

    fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<Self::Record>, Self::Error> {
        Self::read_from(&mut BufReader::new(File::open(path)?))
    }

    /// Truncates or creates the file at `path`.
    fn write_to_path<P: AsRef<Path>>(records: &[Self::Record], path: P) -> Result<(), Self::Error> {
        let mut out = BufWriter::new(File::create(path)?);
        Self::write_to(records, &mut out)?;
        out.flush().map_err(Self::Error::from)
    }
}
