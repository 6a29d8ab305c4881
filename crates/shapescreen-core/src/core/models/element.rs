use phf::phf_map;

/// Static per-element data used by parsing, embedding and shape scoring.
#[derive(Debug, PartialEq)]
pub struct Element {
    pub symbol: &'static str,
    pub atomic_number: u8,
    /// Single-bond covalent radius in Ångström.
    pub covalent_radius: f64,
    /// Van der Waals radius in Ångström; drives the shape Gaussians.
    pub vdw_radius: f64,
    /// Allowed neutral valences, smallest first. Empty for elements without
    /// an implicit-hydrogen model (metals and noble gases).
    pub valences: &'static [u8],
}

impl Element {
    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == 1
    }

    pub fn is_halogen(&self) -> bool {
        matches!(self.atomic_number, 9 | 17 | 35 | 53)
    }
}

macro_rules! element {
    ($sym:literal, $z:literal, $cov:literal, $vdw:literal, [$($v:literal),*]) => {
        Element {
            symbol: $sym,
            atomic_number: $z,
            covalent_radius: $cov,
            vdw_radius: $vdw,
            valences: &[$($v),*],
        }
    };
}

static ELEMENTS: phf::Map<&'static str, Element> = phf_map! {
    "H" => element!("H", 1, 0.31, 1.10, [1]),
    "He" => element!("He", 2, 0.28, 1.40, []),
    "Li" => element!("Li", 3, 1.28, 1.81, []),
    "Be" => element!("Be", 4, 0.96, 1.53, []),
    "B" => element!("B", 5, 0.84, 1.92, [3]),
    "C" => element!("C", 6, 0.76, 1.70, [4]),
    "N" => element!("N", 7, 0.71, 1.55, [3, 5]),
    "O" => element!("O", 8, 0.66, 1.52, [2]),
    "F" => element!("F", 9, 0.57, 1.47, [1]),
    "Ne" => element!("Ne", 10, 0.58, 1.54, []),
    "Na" => element!("Na", 11, 1.66, 2.27, []),
    "Mg" => element!("Mg", 12, 1.41, 1.73, []),
    "Al" => element!("Al", 13, 1.21, 1.84, []),
    "Si" => element!("Si", 14, 1.11, 2.10, [4]),
    "P" => element!("P", 15, 1.07, 1.80, [3, 5]),
    "S" => element!("S", 16, 1.05, 1.80, [2, 4, 6]),
    "Cl" => element!("Cl", 17, 1.02, 1.75, [1]),
    "Ar" => element!("Ar", 18, 1.06, 1.88, []),
    "K" => element!("K", 19, 2.03, 2.75, []),
    "Ca" => element!("Ca", 20, 1.76, 2.31, []),
    "Mn" => element!("Mn", 25, 1.39, 2.05, []),
    "Fe" => element!("Fe", 26, 1.32, 2.04, []),
    "Co" => element!("Co", 27, 1.26, 2.00, []),
    "Ni" => element!("Ni", 28, 1.24, 1.97, []),
    "Cu" => element!("Cu", 29, 1.32, 1.96, []),
    "Zn" => element!("Zn", 30, 1.22, 2.01, []),
    "Ga" => element!("Ga", 31, 1.22, 1.87, []),
    "Ge" => element!("Ge", 32, 1.20, 2.11, [4]),
    "As" => element!("As", 33, 1.19, 1.85, [3, 5]),
    "Se" => element!("Se", 34, 1.20, 1.90, [2, 4, 6]),
    "Br" => element!("Br", 35, 1.20, 1.85, [1]),
    "Kr" => element!("Kr", 36, 1.16, 2.02, []),
    "Rb" => element!("Rb", 37, 2.20, 3.03, []),
    "Sr" => element!("Sr", 38, 1.95, 2.49, []),
    "Ag" => element!("Ag", 47, 1.45, 2.11, []),
    "Cd" => element!("Cd", 48, 1.44, 2.18, []),
    "Sn" => element!("Sn", 50, 1.39, 2.17, []),
    "Sb" => element!("Sb", 51, 1.39, 2.06, []),
    "Te" => element!("Te", 52, 1.38, 2.06, [2, 4, 6]),
    "I" => element!("I", 53, 1.39, 1.98, [1]),
    "Xe" => element!("Xe", 54, 1.40, 2.16, []),
    "Cs" => element!("Cs", 55, 2.44, 3.43, []),
    "Ba" => element!("Ba", 56, 2.15, 2.68, []),
    "Pt" => element!("Pt", 78, 1.36, 2.13, []),
    "Au" => element!("Au", 79, 1.36, 2.14, []),
    "Hg" => element!("Hg", 80, 1.32, 2.23, []),
    "Pb" => element!("Pb", 82, 1.46, 2.02, []),
    "Bi" => element!("Bi", 83, 1.48, 2.07, []),
};

/// Looks up an element by its case-sensitive symbol (`"Cl"`, not `"CL"`).
pub fn by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.get(symbol)
}

/// Looks up an element by symbol, accepting any capitalisation.
///
/// MDL files in the wild carry upper-case two-letter symbols.
pub fn by_symbol_ignore_case(symbol: &str) -> Option<&'static Element> {
    let mut chars = symbol.trim().chars();
    let first = chars.next()?.to_ascii_uppercase();
    let rest: String = chars.map(|c| c.to_ascii_lowercase()).collect();
    by_symbol(&format!("{first}{rest}"))
}

pub fn by_atomic_number(atomic_number: u8) -> Option<&'static Element> {
    ELEMENTS
        .values()
        .find(|element| element.atomic_number == atomic_number)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_by_symbol_is_case_sensitive() {
        assert_eq!(by_symbol("Cl").unwrap().atomic_number, 17);
        assert!(by_symbol("CL").is_none());
        assert!(by_symbol("Xx").is_none());
    }

    #[test]
    fn lookup_ignoring_case_normalises_symbol() {
        assert_eq!(by_symbol_ignore_case("CL").unwrap().symbol, "Cl");
        assert_eq!(by_symbol_ignore_case(" br ").unwrap().symbol, "Br");
        assert!(by_symbol_ignore_case("").is_none());
    }

    #[test]
    fn lookup_by_atomic_number_finds_matching_entry() {
        assert_eq!(by_atomic_number(6).unwrap().symbol, "C");
        assert!(by_atomic_number(0).is_none());
    }

    #[test]
    fn organic_subset_has_valence_models() {
        for symbol in ["B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I"] {
            assert!(!by_symbol(symbol).unwrap().valences.is_empty(), "{symbol}");
        }
        assert!(by_symbol("Na").unwrap().valences.is_empty());
    }
}
