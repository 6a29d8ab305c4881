use super::traits::MolecularFile;
use crate::core::models::conformer::Conformer;
use crate::core::models::element;
use crate::core::models::molecule::{Atom, Bond, BondOrder, Molecule};
use nalgebra::Point3;
use std::collections::HashSet;
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use thiserror::Error;

const RECORD_END: &str = "$$$$";

#[derive(Debug, Error)]
pub enum SdfError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("Parse error in record {record} on line {line}: {kind}")]
    Parse {
        record: usize,
        line: usize,
        kind: SdfParseErrorKind,
    },
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SdfParseErrorKind {
    #[error("Record ends before its header, atom and bond blocks are complete")]
    Truncated,
    #[error("V3000 connection tables are not supported")]
    V3000,
    #[error("Invalid counts line")]
    InvalidCounts,
    #[error("Invalid {axis} coordinate '{value}'")]
    InvalidCoordinate { axis: char, value: String },
    #[error("Unknown element symbol '{0}'")]
    UnknownElement(String),
    #[error("Invalid bond line: {0}")]
    InvalidBond(String),
    #[error("Malformed property line '{0}'")]
    InvalidProperty(String),
}

/// MDL V2000 multi-record SD files. Each record becomes one conformer.
///
/// Explicit hydrogens are folded into implicit counts on read, so conformer
/// coordinates cover heavy atoms plus any hydrogens that had to stay explicit.
pub struct SdfFile;

impl MolecularFile for SdfFile {
    type Record = Conformer;
    type Error = SdfError;

    fn read_from(reader: &mut impl BufRead) -> Result<Vec<Conformer>, SdfError> {
        let mut conformers = Vec::new();
        let mut block: Vec<(usize, String)> = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            if line.trim_end() == RECORD_END {
                if block.iter().any(|(_, l)| !l.trim().is_empty()) {
                    conformers.push(parse_record(conformers.len() + 1, &block)?);
                }
                block.clear();
            } else {
                block.push((idx + 1, line));
            }
        }
        if block.iter().any(|(_, l)| !l.trim().is_empty()) {
            conformers.push(parse_record(conformers.len() + 1, &block)?);
        }
        Ok(conformers)
    }

    fn write_to(records: &[Conformer], writer: &mut impl Write) -> Result<(), SdfError> {
        for conformer in records {
            write_record(writer, conformer, &conformer.title)?;
        }
        Ok(())
    }
}

fn parse_record(record: usize, lines: &[(usize, String)]) -> Result<Conformer, SdfError> {
    let fail = |line: usize, kind: SdfParseErrorKind| SdfError::Parse { record, line, kind };
    let last_line = lines.last().map_or(0, |(ln, _)| *ln);

    if lines.len() < 4 {
        return Err(fail(last_line, SdfParseErrorKind::Truncated));
    }
    let title = lines[0].1.trim().to_string();
    let (counts_ln, counts) = (&lines[3].0, &lines[3].1);
    if counts.contains("V3000") {
        return Err(fail(*counts_ln, SdfParseErrorKind::V3000));
    }
    let (atom_count, bond_count) = parse_counts(counts).ok_or_else(|| fail(*counts_ln, SdfParseErrorKind::InvalidCounts))?;

    let atom_start = 4;
    let bond_start = atom_start + atom_count;
    if lines.len() < bond_start + bond_count {
        return Err(fail(last_line, SdfParseErrorKind::Truncated));
    }

    let mut atoms = Vec::with_capacity(atom_count);
    let mut coords = Vec::with_capacity(atom_count);
    for (ln, raw) in &lines[atom_start..bond_start] {
        let (atom, position) = parse_atom(raw).map_err(|kind| fail(*ln, kind))?;
        atoms.push(atom);
        coords.push(position);
    }

    let mut bonds = Vec::with_capacity(bond_count);
    let mut seen = HashSet::new();
    for (ln, raw) in &lines[bond_start..bond_start + bond_count] {
        let bond = parse_bond(raw, atom_count).map_err(|kind| fail(*ln, kind))?;
        if !seen.insert((bond.begin.min(bond.end), bond.begin.max(bond.end))) {
            return Err(fail(*ln, SdfParseErrorKind::InvalidBond("duplicate bond".into())));
        }
        bonds.push(bond);
    }

    for (ln, raw) in &lines[bond_start + bond_count..] {
        if raw.starts_with("M  END") {
            break;
        }
        if raw.starts_with("M  CHG") || raw.starts_with("M  ISO") {
            apply_property_line(raw, &mut atoms).map_err(|kind| fail(*ln, kind))?;
        }
    }

    for bond in &bonds {
        if bond.order == BondOrder::Aromatic {
            atoms[bond.begin].aromatic = true;
            atoms[bond.end].aromatic = true;
        }
    }

    let mut molecule = Molecule::new(title, atoms, bonds);
    assign_implicit_hydrogens(&mut molecule);
    let folded = molecule.without_explicit_hydrogens();
    let coords: Vec<Point3<f64>> = coords
        .into_iter()
        .zip(molecule.foldable_hydrogens())
        .filter_map(|(p, foldable)| (!foldable).then_some(p))
        .collect();

    Conformer::new(Arc::new(folded), coords)
        .ok_or_else(|| fail(last_line, SdfParseErrorKind::Truncated))
}

fn parse_counts(line: &str) -> Option<(usize, usize)> {
    let fixed = |range: std::ops::Range<usize>| line.get(range).and_then(|s| s.trim().parse().ok());
    if let (Some(atoms), Some(bonds)) = (fixed(0..3), fixed(3..6)) {
        return Some((atoms, bonds));
    }
    let mut tokens = line.split_whitespace();
    Some((tokens.next()?.parse().ok()?, tokens.next()?.parse().ok()?))
}

fn parse_atom(raw: &str) -> Result<(Atom, Point3<f64>), SdfParseErrorKind> {
    let padded = format!("{raw:<39}");
    let field = |range: std::ops::Range<usize>| padded.get(range).unwrap_or("").trim();
    let coord = |axis: char, range: std::ops::Range<usize>| {
        let value = field(range);
        value
            .parse::<f64>()
            .map_err(|_| SdfParseErrorKind::InvalidCoordinate {
                axis,
                value: value.to_string(),
            })
    };
    let x = coord('x', 0..10)?;
    let y = coord('y', 10..20)?;
    let z = coord('z', 20..30)?;
    let symbol = field(31..34);
    let element = element::by_symbol_ignore_case(symbol)
        .ok_or_else(|| SdfParseErrorKind::UnknownElement(symbol.to_string()))?;

    let mut atom = Atom::new(element);
    atom.formal_charge = match field(36..39) {
        "1" => 3,
        "2" => 2,
        "3" => 1,
        "5" => -1,
        "6" => -2,
        "7" => -3,
        _ => 0,
    };
    Ok((atom, Point3::new(x, y, z)))
}

fn parse_bond(raw: &str, atom_count: usize) -> Result<Bond, SdfParseErrorKind> {
    let fixed = |range: std::ops::Range<usize>| raw.get(range).and_then(|s| s.trim().parse::<usize>().ok());
    let (a1, a2, order) = match (fixed(0..3), fixed(3..6), fixed(6..9)) {
        (Some(a1), Some(a2), Some(order)) => (a1, a2, order),
        _ => {
            let tokens: Vec<usize> = raw
                .split_whitespace()
                .take(3)
                .map(|t| t.parse().map_err(|_| SdfParseErrorKind::InvalidBond(raw.trim().to_string())))
                .collect::<Result<_, _>>()?;
            if tokens.len() < 3 {
                return Err(SdfParseErrorKind::InvalidBond(raw.trim().to_string()));
            }
            (tokens[0], tokens[1], tokens[2])
        }
    };
    if a1 == 0 || a2 == 0 || a1 > atom_count || a2 > atom_count || a1 == a2 {
        return Err(SdfParseErrorKind::InvalidBond(format!(
            "atoms {a1}-{a2} outside 1..={atom_count}"
        )));
    }
    let order = u8::try_from(order)
        .ok()
        .and_then(BondOrder::from_ctfile)
        .ok_or_else(|| SdfParseErrorKind::InvalidBond(format!("unsupported bond type {order}")))?;
    Ok(Bond::new(a1 - 1, a2 - 1, order))
}

/// `M  CHG` and `M  ISO` lines override the atom block.
fn apply_property_line(raw: &str, atoms: &mut [Atom]) -> Result<(), SdfParseErrorKind> {
    let tokens: Vec<&str> = raw.split_whitespace().collect();
    let invalid = || SdfParseErrorKind::InvalidProperty(raw.trim().to_string());
    let count: usize = tokens.get(2).and_then(|t| t.parse().ok()).ok_or_else(invalid)?;
    for pair in 0..count {
        let atom: usize = tokens
            .get(3 + pair * 2)
            .and_then(|t| t.parse().ok())
            .filter(|&a: &usize| a >= 1 && a <= atoms.len())
            .ok_or_else(invalid)?;
        let value: i32 = tokens
            .get(4 + pair * 2)
            .and_then(|t| t.parse().ok())
            .ok_or_else(invalid)?;
        let target = &mut atoms[atom - 1];
        if tokens[1] == "CHG" {
            target.formal_charge = value as i8;
        } else {
            target.isotope = u16::try_from(value).ok();
        }
    }
    Ok(())
}

/// Fills implicit hydrogens for atoms whose valence is not satisfied by
/// their explicit bonds. Charged atoms use the valences of their
/// isoelectronic neutral element.
fn assign_implicit_hydrogens(mol: &mut Molecule) {
    let mut used = vec![0u8; mol.atom_count()];
    for bond in mol.bonds() {
        used[bond.begin] += bond.order.valence();
        used[bond.end] += bond.order.valence();
    }
    for (idx, &valence) in used.iter().enumerate() {
        let atom = mol.atom(idx);
        let shifted = i16::from(atom.atomic_number()) - i16::from(atom.formal_charge);
        let Some(reference) = u8::try_from(shifted).ok().and_then(element::by_atomic_number) else {
            continue;
        };
        let bonus = u8::from(atom.aromatic);
        let hydrogens = reference
            .valences
            .iter()
            .find(|&&v| v >= valence)
            .map_or(0, |&target| target.saturating_sub(valence + bonus));
        mol.atom_mut(idx).implicit_hydrogens = hydrogens;
    }
}

/// Streams conformers to an SD file one record at a time.
pub struct SdfWriter<W: Write> {
    writer: W,
    records: usize,
}

impl<W: Write> SdfWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, records: 0 }
    }

    pub fn write(&mut self, conformer: &Conformer, title: &str) -> Result<(), SdfError> {
        write_record(&mut self.writer, conformer, title)?;
        self.records += 1;
        Ok(())
    }

    pub fn records_written(&self) -> usize {
        self.records
    }

    pub fn flush(&mut self) -> Result<(), SdfError> {
        self.writer.flush()?;
        Ok(())
    }
}

fn write_record(writer: &mut impl Write, conformer: &Conformer, title: &str) -> io::Result<()> {
    let mol = conformer.molecule();
    writeln!(writer, "{title}")?;
    writeln!(writer, "  shapescreen       3D")?;
    writeln!(writer)?;
    writeln!(
        writer,
        "{:>3}{:>3}  0  0  0  0  0  0  0  0999 V2000",
        mol.atom_count(),
        mol.bond_count()
    )?;
    for (atom, p) in mol.atoms().iter().zip(conformer.coords()) {
        let charge_code = match atom.formal_charge {
            3 => 1,
            2 => 2,
            1 => 3,
            -1 => 5,
            -2 => 6,
            -3 => 7,
            _ => 0,
        };
        writeln!(
            writer,
            "{:>10.4}{:>10.4}{:>10.4} {:<3} 0{:>3}  0  0  0  0  0  0  0  0  0  0",
            p.x, p.y, p.z, atom.element.symbol, charge_code
        )?;
    }
    for bond in mol.bonds() {
        writeln!(
            writer,
            "{:>3}{:>3}{:>3}  0  0  0  0",
            bond.begin + 1,
            bond.end + 1,
            bond.order.to_ctfile()
        )?;
    }
    let charged: Vec<(usize, i8)> = mol
        .atoms()
        .iter()
        .enumerate()
        .filter(|(_, a)| a.formal_charge != 0)
        .map(|(idx, a)| (idx + 1, a.formal_charge))
        .collect();
    for chunk in charged.chunks(8) {
        write!(writer, "M  CHG{:>3}", chunk.len())?;
        for (idx, charge) in chunk {
            write!(writer, " {idx:>3} {charge:>3}")?;
        }
        writeln!(writer)?;
    }
    writeln!(writer, "M  END")?;
    writeln!(writer, "{RECORD_END}")?;
    Ok(())
}
