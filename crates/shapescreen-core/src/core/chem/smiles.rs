//! SMILES line-notation parser.
//!
//! Supports the organic subset, bracket atoms (isotope, chirality, hydrogen
//! count, charge, atom class), aromatic atoms, ring closures (`0-9`, `%nn`),
//! branches, disconnected components and `/`, `\` double-bond directions.
//! Explicit `[H]` atoms are folded into their neighbour's implicit count.

use crate::core::models::element::{self, Element};
use crate::core::models::molecule::{
    Atom, Bond, BondOrder, BondStereo, Chirality, Molecule, StereoRef, Winding,
};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("SMILES string is empty")]
    Empty,
    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedCharacter { ch: char, pos: usize },
    #[error("Unknown element '{symbol}' at position {pos}")]
    UnknownElement { symbol: String, pos: usize },
    #[error("Bracket atom starting at position {pos} is not terminated")]
    UnterminatedBracket { pos: usize },
    #[error("Bracket atom starting at position {pos} has an out-of-range isotope, hydrogen count or charge")]
    InvalidBracketAtom { pos: usize },
    #[error("Unbalanced branch at position {pos}")]
    UnbalancedBranch { pos: usize },
    #[error("Ring closure {label} is never closed")]
    UnclosedRing { label: u16 },
    #[error("Invalid ring closure {label} at position {pos}: {reason}")]
    InvalidRingClosure {
        label: u16,
        pos: usize,
        reason: &'static str,
    },
    #[error("Bond symbol at position {pos} is not followed by an atom")]
    DanglingBond { pos: usize },
    #[error("Atom {atom} ({symbol}) exceeds its allowed valence")]
    Valence { atom: usize, symbol: &'static str },
}

/// Parses a SMILES record. Text after the first whitespace becomes the title.
pub fn parse_smiles(text: &str) -> Result<Molecule, ParseError> {
    let trimmed = text.trim();
    let (smiles, title) = match trimmed.split_once(char::is_whitespace) {
        Some((smiles, title)) => (smiles, title.trim()),
        None => (trimmed, ""),
    };
    parse_smiles_titled(smiles, title)
}

pub fn parse_smiles_titled(smiles: &str, title: &str) -> Result<Molecule, ParseError> {
    if smiles.is_empty() {
        return Err(ParseError::Empty);
    }
    let mut parser = SmilesParser::new(smiles);
    parser.parse()?;
    parser.finish(title)
}

const CHIRAL_CLASSES: [&[u8]; 5] = [b"TH", b"AL", b"SP", b"TB", b"OH"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy)]
struct PendingBond {
    order: BondOrder,
    explicit: bool,
    direction: Option<Direction>,
    pos: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    Atom(usize),
    Hydrogen,
    Ring(u16),
}

#[derive(Debug, Clone, Copy)]
struct RingOpening {
    atom: usize,
    bond: Option<PendingBond>,
    slot: usize,
}

struct SmilesParser<'a> {
    input: &'a [u8],
    pos: usize,
    atoms: Vec<Atom>,
    bonds: Vec<Bond>,
    bonded_pairs: HashSet<(usize, usize)>,
    /// Neighbour order as written, used to interpret `@`/`@@`.
    written: Vec<Vec<Slot>>,
    windings: Vec<Option<Winding>>,
    /// Organic-subset atoms get implicit hydrogens from default valences.
    organic: Vec<bool>,
    ring_openings: BTreeMap<u16, RingOpening>,
    branches: Vec<usize>,
    prev: Option<usize>,
    pending: Option<PendingBond>,
    directions: Vec<(usize, usize, Direction)>,
}

impl<'a> SmilesParser<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            input: input.as_bytes(),
            pos: 0,
            atoms: Vec::new(),
            bonds: Vec::new(),
            bonded_pairs: HashSet::new(),
            written: Vec::new(),
            windings: Vec::new(),
            organic: Vec::new(),
            ring_openings: BTreeMap::new(),
            branches: Vec::new(),
            prev: None,
            pending: None,
            directions: Vec::new(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    fn unexpected(&self, pos: usize) -> ParseError {
        let ch = self.input.get(pos).map(|&b| b as char).unwrap_or('\0');
        ParseError::UnexpectedCharacter { ch, pos }
    }

    fn parse(&mut self) -> Result<(), ParseError> {
        while let Some(ch) = self.peek() {
            let pos = self.pos;
            match ch {
                b'(' => {
                    let Some(prev) = self.prev else {
                        return Err(ParseError::UnbalancedBranch { pos });
                    };
                    if let Some(pending) = self.pending {
                        return Err(ParseError::DanglingBond { pos: pending.pos });
                    }
                    self.branches.push(prev);
                    self.pos += 1;
                }
                b')' => {
                    if let Some(pending) = self.pending {
                        return Err(ParseError::DanglingBond { pos: pending.pos });
                    }
                    self.prev = Some(
                        self.branches
                            .pop()
                            .ok_or(ParseError::UnbalancedBranch { pos })?,
                    );
                    self.pos += 1;
                }
                b'-' | b'=' | b'#' | b':' | b'/' | b'\\' => {
                    if self.pending.is_some() || self.prev.is_none() {
                        return Err(self.unexpected(pos));
                    }
                    let (order, direction) = match ch {
                        b'-' => (BondOrder::Single, None),
                        b'=' => (BondOrder::Double, None),
                        b'#' => (BondOrder::Triple, None),
                        b':' => (BondOrder::Aromatic, None),
                        b'/' => (BondOrder::Single, Some(Direction::Up)),
                        _ => (BondOrder::Single, Some(Direction::Down)),
                    };
                    self.pending = Some(PendingBond {
                        order,
                        explicit: true,
                        direction,
                        pos,
                    });
                    self.pos += 1;
                }
                b'.' => {
                    if let Some(pending) = self.pending {
                        return Err(ParseError::DanglingBond { pos: pending.pos });
                    }
                    if !self.branches.is_empty() {
                        return Err(ParseError::UnbalancedBranch { pos });
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                b'%' => {
                    let (Some(d1), Some(d2)) = (self.peek_at(1), self.peek_at(2)) else {
                        return Err(self.unexpected(pos));
                    };
                    if !d1.is_ascii_digit() || !d2.is_ascii_digit() {
                        return Err(self.unexpected(pos));
                    }
                    let label = ((d1 - b'0') * 10 + (d2 - b'0')) as u16;
                    self.pos += 3;
                    self.ring_closure(label, pos)?;
                }
                b'0'..=b'9' => {
                    self.pos += 1;
                    self.ring_closure((ch - b'0') as u16, pos)?;
                }
                b'[' => self.parse_bracket_atom()?,
                _ if ch.is_ascii_alphabetic() => self.parse_organic_atom()?,
                _ => return Err(self.unexpected(pos)),
            }
        }
        Ok(())
    }

    fn parse_organic_atom(&mut self) -> Result<(), ParseError> {
        let pos = self.pos;
        let ch = self.input[pos];
        let next = self.peek_at(1);
        let (symbol, aromatic, len) = match (ch, next) {
            (b'C', Some(b'l')) => ("Cl", false, 2),
            (b'B', Some(b'r')) => ("Br", false, 2),
            (b'B', _) => ("B", false, 1),
            (b'C', _) => ("C", false, 1),
            (b'N', _) => ("N", false, 1),
            (b'O', _) => ("O", false, 1),
            (b'P', _) => ("P", false, 1),
            (b'S', _) => ("S", false, 1),
            (b'F', _) => ("F", false, 1),
            (b'I', _) => ("I", false, 1),
            (b'b', _) => ("B", true, 1),
            (b'c', _) => ("C", true, 1),
            (b'n', _) => ("N", true, 1),
            (b'o', _) => ("O", true, 1),
            (b'p', _) => ("P", true, 1),
            (b's', _) => ("S", true, 1),
            _ => return Err(self.unexpected(pos)),
        };
        let element = lookup(symbol, pos)?;
        self.pos += len;

        let mut atom = Atom::new(element);
        atom.aromatic = aromatic;
        self.add_atom(atom, true, None, 0)
    }

    fn parse_bracket_atom(&mut self) -> Result<(), ParseError> {
        let start = self.pos;
        self.pos += 1;
        let close = self.input[start..]
            .iter()
            .position(|&b| b == b']')
            .map(|offset| start + offset)
            .ok_or(ParseError::UnterminatedBracket { pos: start })?;

        let isotope: Option<u16> = self.read_bounded(start)?;

        let (element, aromatic) = self.read_bracket_symbol(close)?;

        let mut winding = None;
        if self.peek() == Some(b'@') {
            self.pos += 1;
            winding = Some(Winding::CounterClockwise);
            if self.peek() == Some(b'@') {
                self.pos += 1;
                winding = Some(Winding::Clockwise);
            } else if CHIRAL_CLASSES
                .iter()
                .any(|class| self.input[self.pos..close].starts_with(class))
            {
                winding = self.read_chiral_class()?;
            }
        }

        let mut hydrogens = 0u8;
        if self.peek() == Some(b'H') {
            self.pos += 1;
            hydrogens = self.read_bounded(start)?.unwrap_or(1);
        }

        let mut charge = 0i8;
        if let Some(sign @ (b'+' | b'-')) = self.peek() {
            self.pos += 1;
            let unit: i8 = if sign == b'+' { 1 } else { -1 };
            if let Some(magnitude) = self.read_bounded::<i8>(start)? {
                charge = unit * magnitude;
            } else {
                charge = unit;
                while self.peek() == Some(sign) {
                    self.pos += 1;
                    charge = charge
                        .checked_add(unit)
                        .ok_or(ParseError::InvalidBracketAtom { pos: start })?;
                }
            }
        }

        if self.peek() == Some(b':') {
            self.pos += 1;
            if self.read_number().is_none() {
                return Err(self.unexpected(self.pos));
            }
        }

        if self.pos != close {
            return Err(self.unexpected(self.pos));
        }
        self.pos = close + 1;

        let mut atom = Atom::new(element);
        atom.isotope = isotope;
        atom.aromatic = aromatic;
        atom.formal_charge = charge;
        atom.implicit_hydrogens = hydrogens;
        self.add_atom(atom, false, winding, hydrogens)
    }

    fn read_bracket_symbol(&mut self, close: usize) -> Result<(&'static Element, bool), ParseError> {
        let pos = self.pos;
        let Some(first) = self.peek().filter(|_| pos < close) else {
            return Err(self.unexpected(pos));
        };
        if first.is_ascii_lowercase() {
            for (text, symbol) in [("se", "Se"), ("as", "As"), ("te", "Te")] {
                if self.input[pos..close].starts_with(text.as_bytes()) {
                    self.pos += 2;
                    return Ok((lookup(symbol, pos)?, true));
                }
            }
            let symbol = match first {
                b'b' => "B",
                b'c' => "C",
                b'n' => "N",
                b'o' => "O",
                b'p' => "P",
                b's' => "S",
                _ => {
                    return Err(ParseError::UnknownElement {
                        symbol: (first as char).to_string(),
                        pos,
                    });
                }
            };
            self.pos += 1;
            return Ok((lookup(symbol, pos)?, true));
        }
        if !first.is_ascii_uppercase() {
            return Err(self.unexpected(pos));
        }
        if let Some(second) = self.peek_at(1).filter(|b| b.is_ascii_lowercase()) {
            let two = format!("{}{}", first as char, second as char);
            if let Some(element) = element::by_symbol(&two) {
                self.pos += 2;
                return Ok((element, false));
            }
        }
        self.pos += 1;
        Ok((lookup(&(first as char).to_string(), pos)?, false))
    }

    /// Reads `@TH1`/`@TH2`; other chiral classes are accepted and ignored.
    fn read_chiral_class(&mut self) -> Result<Option<Winding>, ParseError> {
        let pos = self.pos;
        let class = [self.input[pos], self.input[pos + 1]];
        self.pos += 2;
        let number = self.read_number().ok_or_else(|| self.unexpected(self.pos))?;
        Ok(match (&class, number) {
            (b"TH", 1) => Some(Winding::CounterClockwise),
            (b"TH", 2) => Some(Winding::Clockwise),
            _ => None,
        })
    }

    /// Reads a bracket-atom count that must fit `T`. Digits that overflow it
    /// reject the atom opened at `bracket`.
    fn read_bounded<T: TryFrom<u32>>(&mut self, bracket: usize) -> Result<Option<T>, ParseError> {
        if !self.peek().is_some_and(|b| b.is_ascii_digit()) {
            return Ok(None);
        }
        self.read_number()
            .and_then(|n| T::try_from(n).ok())
            .map(Some)
            .ok_or(ParseError::InvalidBracketAtom { pos: bracket })
    }

    fn read_number(&mut self) -> Option<u32> {
        let start = self.pos;
        while self.peek().is_some_and(|b| b.is_ascii_digit()) {
            self.pos += 1;
        }
        if start == self.pos {
            return None;
        }
        std::str::from_utf8(&self.input[start..self.pos])
            .ok()
            .and_then(|s| s.parse().ok())
    }

    fn add_atom(
        &mut self,
        atom: Atom,
        organic: bool,
        winding: Option<Winding>,
        bracket_hydrogens: u8,
    ) -> Result<(), ParseError> {
        let idx = self.atoms.len();
        self.atoms.push(atom);
        self.written.push(Vec::new());
        self.windings.push(winding);
        self.organic.push(organic);

        match (self.prev, self.pending.take()) {
            (Some(prev), pending) => {
                let order = self.resolve_order(prev, idx, pending);
                let bond_idx = self.push_bond(prev, idx, order)?;
                if let Some(direction) = pending.and_then(|p| p.direction) {
                    self.directions.push((bond_idx, prev, direction));
                }
                self.written[idx].push(Slot::Atom(prev));
                self.written[prev].push(Slot::Atom(idx));
            }
            (None, Some(pending)) => return Err(ParseError::DanglingBond { pos: pending.pos }),
            (None, None) => {}
        }
        if bracket_hydrogens > 0 {
            self.written[idx].push(Slot::Hydrogen);
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn resolve_order(&self, a: usize, b: usize, pending: Option<PendingBond>) -> BondOrder {
        match pending {
            Some(p) if p.explicit && p.direction.is_none() => p.order,
            _ if self.atoms[a].aromatic && self.atoms[b].aromatic => BondOrder::Aromatic,
            _ => BondOrder::Single,
        }
    }

    fn push_bond(&mut self, a: usize, b: usize, order: BondOrder) -> Result<usize, ParseError> {
        let key = (a.min(b), a.max(b));
        if !self.bonded_pairs.insert(key) {
            return Err(ParseError::InvalidRingClosure {
                label: 0,
                pos: self.pos,
                reason: "atoms are already bonded",
            });
        }
        self.bonds.push(Bond::new(a, b, order));
        Ok(self.bonds.len() - 1)
    }

    fn ring_closure(&mut self, label: u16, pos: usize) -> Result<(), ParseError> {
        let Some(current) = self.prev else {
            return Err(self.unexpected(pos));
        };
        let pending = self.pending.take();

        let Some(opening) = self.ring_openings.remove(&label) else {
            let slot = self.written[current].len();
            self.written[current].push(Slot::Ring(label));
            self.ring_openings.insert(
                label,
                RingOpening {
                    atom: current,
                    bond: pending,
                    slot,
                },
            );
            return Ok(());
        };

        if opening.atom == current {
            return Err(ParseError::InvalidRingClosure {
                label,
                pos,
                reason: "ring closes on the atom that opened it",
            });
        }
        let explicit = |p: Option<PendingBond>| p.filter(|p| p.explicit && p.direction.is_none());
        let order = match (explicit(opening.bond), explicit(pending)) {
            (Some(a), Some(b)) if a.order != b.order => {
                return Err(ParseError::InvalidRingClosure {
                    label,
                    pos,
                    reason: "conflicting bond orders",
                });
            }
            (Some(p), _) | (_, Some(p)) => p.order,
            (None, None) => self.resolve_order(opening.atom, current, None),
        };
        self.push_bond(opening.atom, current, order)
            .map_err(|_| ParseError::InvalidRingClosure {
                label,
                pos,
                reason: "atoms are already bonded",
            })?;
        self.written[opening.atom][opening.slot] = Slot::Atom(current);
        self.written[current].push(Slot::Atom(opening.atom));
        Ok(())
    }

    fn finish(mut self, title: &str) -> Result<Molecule, ParseError> {
        if let Some(pending) = self.pending {
            return Err(ParseError::DanglingBond { pos: pending.pos });
        }
        if !self.branches.is_empty() {
            return Err(ParseError::UnbalancedBranch { pos: self.input.len() });
        }
        if let Some(&label) = self.ring_openings.keys().next() {
            return Err(ParseError::UnclosedRing { label });
        }
        if self.atoms.is_empty() {
            return Err(ParseError::Empty);
        }

        self.assign_implicit_hydrogens()?;
        self.assign_chirality();
        let stereo = self.double_bond_stereo();
        for (bond_idx, bond_stereo) in stereo {
            self.bonds[bond_idx].stereo = bond_stereo;
        }

        Ok(Molecule::new(title, self.atoms, self.bonds).without_explicit_hydrogens())
    }

    fn assign_implicit_hydrogens(&mut self) -> Result<(), ParseError> {
        let mut valence = vec![0u8; self.atoms.len()];
        for bond in &self.bonds {
            valence[bond.begin] += bond.order.valence();
            valence[bond.end] += bond.order.valence();
        }
        for (idx, atom) in self.atoms.iter_mut().enumerate() {
            if !self.organic[idx] {
                continue;
            }
            let used = valence[idx];
            let Some(&target) = atom.element.valences.iter().find(|&&v| v >= used) else {
                return Err(ParseError::Valence {
                    atom: idx,
                    symbol: atom.element.symbol,
                });
            };
            let aromatic_bonus = u8::from(atom.aromatic);
            atom.implicit_hydrogens = target.saturating_sub(used + aromatic_bonus);
        }
        Ok(())
    }

    fn assign_chirality(&mut self) {
        for idx in 0..self.atoms.len() {
            let Some(winding) = self.windings[idx] else {
                continue;
            };
            let slots = &self.written[idx];
            if slots.len() != 4 {
                continue;
            }
            let mut neighbors = [StereoRef::ImplicitHydrogen; 4];
            let mut complete = true;
            for (target, slot) in neighbors.iter_mut().zip(slots) {
                *target = match *slot {
                    Slot::Atom(n) => StereoRef::Atom(n),
                    Slot::Hydrogen => StereoRef::ImplicitHydrogen,
                    Slot::Ring(_) => {
                        complete = false;
                        break;
                    }
                };
            }
            if complete {
                self.atoms[idx].chirality = Chirality::Tetrahedral { neighbors, winding };
            }
        }
    }

    /// Resolves `/` and `\` markers into cis/trans relations on double bonds.
    fn double_bond_stereo(&self) -> Vec<(usize, BondStereo)> {
        #[derive(PartialEq)]
        enum Side {
            Above,
            Below,
        }

        let side_of = |db_atom: usize, skip_bond: usize| -> Option<(usize, Side)> {
            self.directions
                .iter()
                .find_map(|&(bond_idx, from, direction)| {
                    let bond = &self.bonds[bond_idx];
                    if bond_idx == skip_bond || !bond.contains(db_atom) {
                        return None;
                    }
                    let substituent = bond.other(db_atom);
                    let written_towards_db = from == substituent;
                    let side = match (written_towards_db, direction) {
                        (true, Direction::Up) | (false, Direction::Down) => Side::Below,
                        (true, Direction::Down) | (false, Direction::Up) => Side::Above,
                    };
                    Some((substituent, side))
                })
        };

        self.bonds
            .iter()
            .enumerate()
            .filter(|(_, bond)| bond.order == BondOrder::Double)
            .filter_map(|(bond_idx, bond)| {
                let (begin_ref, begin_side) = side_of(bond.begin, bond_idx)?;
                let (end_ref, end_side) = side_of(bond.end, bond_idx)?;
                let stereo = if begin_side == end_side {
                    BondStereo::Cis { begin_ref, end_ref }
                } else {
                    BondStereo::Trans { begin_ref, end_ref }
                };
                Some((bond_idx, stereo))
            })
            .collect()
    }
}

fn lookup(symbol: &str, pos: usize) -> Result<&'static Element, ParseError> {
    element::by_symbol(symbol).ok_or_else(|| ParseError::UnknownElement {
        symbol: symbol.to_string(),
        pos,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hydrogens(mol: &Molecule) -> Vec<u8> {
        mol.atoms().iter().map(|a| a.implicit_hydrogens).collect()
    }

    #[test]
    fn parses_ethanol_with_implicit_hydrogens() {
        let mol = parse_smiles("CCO").unwrap();
        assert_eq!(mol.atom_count(), 3);
        assert_eq!(mol.bond_count(), 2);
        assert_eq!(hydrogens(&mol), vec![3, 2, 1]);
    }

    #[test]
    fn text_after_whitespace_becomes_title() {
        let mol = parse_smiles("  c1ccccc1 benzene ring ").unwrap();
        assert_eq!(mol.title, "benzene ring");
        assert_eq!(mol.atom_count(), 6);
        assert!(mol.bonds().iter().all(|b| b.order == BondOrder::Aromatic));
        assert_eq!(hydrogens(&mol), vec![1; 6]);
    }

    #[test]
    fn aromatic_heteroatoms_get_correct_hydrogens() {
        let pyridine = parse_smiles("c1ccncc1").unwrap();
        assert_eq!(pyridine.atom(3).implicit_hydrogens, 0);

        let methylpyrrole = parse_smiles("Cn1cccc1").unwrap();
        assert_eq!(methylpyrrole.atom(1).implicit_hydrogens, 0);

        let pyrrole = parse_smiles("c1cc[nH]c1").unwrap();
        assert_eq!(pyrrole.atom(3).implicit_hydrogens, 1);
    }

    #[test]
    fn parses_branches_and_multiple_bonds() {
        let mol = parse_smiles("CC(=O)O").unwrap();
        assert_eq!(mol.bond(1).order, BondOrder::Single);
        assert_eq!(mol.bond(2).order, BondOrder::Double);
        assert_eq!(hydrogens(&mol), vec![3, 0, 0, 1]);

        let nitrile = parse_smiles("CC#N").unwrap();
        assert_eq!(nitrile.bond(1).order, BondOrder::Triple);
        assert_eq!(nitrile.atom(2).implicit_hydrogens, 0);
    }

    #[test]
    fn parses_bracket_atoms_with_charge_and_isotope() {
        let mol = parse_smiles("[13CH3][NH3+].[Cl-]").unwrap();
        assert_eq!(mol.atom(0).isotope, Some(13));
        assert_eq!(mol.atom(0).implicit_hydrogens, 3);
        assert_eq!(mol.atom(1).formal_charge, 1);
        assert_eq!(mol.atom(2).formal_charge, -1);
        assert_eq!(mol.bond_count(), 1);

        let dianion = parse_smiles("[O--]").unwrap();
        assert_eq!(dianion.atom(0).formal_charge, -2);
        let cation = parse_smiles("[Fe+3]").unwrap();
        assert_eq!(cation.atom(0).formal_charge, 3);
    }

    #[test]
    fn two_digit_ring_closures_are_supported() {
        let mol = parse_smiles("C%12CCCCC%12").unwrap();
        assert_eq!(mol.bond_count(), 6);
        assert!(mol.bond_between(0, 5).is_some());
    }

    #[test]
    fn chirality_uses_written_neighbor_order() {
        let mol = parse_smiles("N[C@@H](C)C(=O)O").unwrap();
        assert_eq!(
            mol.atom(1).chirality,
            Chirality::Tetrahedral {
                neighbors: [
                    StereoRef::Atom(0),
                    StereoRef::ImplicitHydrogen,
                    StereoRef::Atom(2),
                    StereoRef::Atom(3),
                ],
                winding: Winding::Clockwise,
            }
        );
    }

    #[test]
    fn ring_closure_neighbor_takes_position_of_digit() {
        let mol = parse_smiles("[C@]1(F)(Cl)CCC1").unwrap();
        let Chirality::Tetrahedral { neighbors, winding } = &mol.atom(0).chirality else {
            panic!("expected tetrahedral chirality");
        };
        assert_eq!(*winding, Winding::CounterClockwise);
        assert_eq!(neighbors[0], StereoRef::Atom(5));
        assert_eq!(neighbors[1], StereoRef::Atom(1));
        assert_eq!(neighbors[2], StereoRef::Atom(2));
        assert_eq!(neighbors[3], StereoRef::Atom(3));
    }

    #[test]
    fn explicit_hydrogen_atoms_are_folded() {
        let mol = parse_smiles("[H]C([H])([H])O").unwrap();
        assert_eq!(mol.atom_count(), 2);
        assert_eq!(hydrogens(&mol), vec![3, 1]);
    }

    #[test]
    fn double_bond_directions_become_cis_trans() {
        let trans = parse_smiles("F/C=C/F").unwrap();
        assert_eq!(
            trans.bond(1).stereo,
            BondStereo::Trans {
                begin_ref: 0,
                end_ref: 3
            }
        );

        let cis = parse_smiles("F/C=C\\F").unwrap();
        assert!(cis.bond(1).stereo.is_cis());

        let branched_cis = parse_smiles("C(/F)=C/F").unwrap();
        assert!(branched_cis.bond(1).stereo.is_cis());

        let unspecified = parse_smiles("FC=CF").unwrap();
        assert_eq!(unspecified.bond(1).stereo, BondStereo::None);
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!(parse_smiles(""), Err(ParseError::Empty));
        assert_eq!(parse_smiles("   "), Err(ParseError::Empty));
        assert!(matches!(
            parse_smiles("not_a_molecule"),
            Err(ParseError::UnexpectedCharacter { ch: 't', .. })
        ));
        assert!(matches!(
            parse_smiles("C1CC"),
            Err(ParseError::UnclosedRing { label: 1 })
        ));
        assert!(matches!(
            parse_smiles("CC(C"),
            Err(ParseError::UnbalancedBranch { .. })
        ));
        assert!(matches!(
            parse_smiles("CC)C"),
            Err(ParseError::UnbalancedBranch { .. })
        ));
        assert!(matches!(
            parse_smiles("CC="),
            Err(ParseError::DanglingBond { .. })
        ));
        assert!(matches!(
            parse_smiles("[Xx]"),
            Err(ParseError::UnknownElement { .. })
        ));
        assert!(matches!(
            parse_smiles("[CH4"),
            Err(ParseError::UnterminatedBracket { .. })
        ));
        for text in ["[C+200]", "[CH300]", "[C-128]", "[70000C]", "[CH99999999999]"] {
            assert_eq!(
                parse_smiles(text),
                Err(ParseError::InvalidBracketAtom { pos: 0 }),
                "{text}"
            );
        }
        assert!(matches!(
            parse_smiles("C[N+1000]"),
            Err(ParseError::InvalidBracketAtom { pos: 1 })
        ));
        assert!(matches!(
            parse_smiles("C11"),
            Err(ParseError::InvalidRingClosure { .. })
        ));
        assert!(matches!(
            parse_smiles("C(C)(C)(C)(C)C"),
            Err(ParseError::Valence { atom: 0, .. })
        ));
    }
}
