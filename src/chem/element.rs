//! Periodic table data for the elements molpipe understands

use std::fmt;

/// Static properties of a chemical element
#[derive(Debug, PartialEq)]
pub struct Element {
    /// Element symbol as written in SMILES (`*` for the dummy atom)
    pub symbol: &'static str,

    /// Atomic number (0 for the dummy atom)
    pub atomic_number: u8,

    /// Standard atomic weight
    pub mass: f64,

    /// Pauling electronegativity
    pub electronegativity: Option<f64>,

    /// First ionisation energy in eV
    pub first_ionisation: Option<f64>,

    /// IUPAC group (1-18)
    pub group: u8,

    /// Period (row)
    pub period: u8,

    /// Allowed valences for uncharged atoms, smallest first (empty = unchecked)
    pub valences: &'static [u8],

    /// Single-bond covalent radius in Angstrom
    pub covalent_radius: f64,
}

macro_rules! element {
    ($sym:expr, $z:expr, $mass:expr, $en:expr, $ie:expr, $group:expr, $period:expr, $val:expr, $r:expr) => {
        Element {
            symbol: $sym,
            atomic_number: $z,
            mass: $mass,
            electronegativity: $en,
            first_ionisation: $ie,
            group: $group,
            period: $period,
            valences: $val,
            covalent_radius: $r,
        }
    };
}

static ELEMENTS: &[Element] = &[
    element!("*", 0, 0.0, None, None, 0, 0, &[], 0.70),
    element!("H", 1, 1.008, Some(2.20), Some(13.598), 1, 1, &[1], 0.31),
    element!("Li", 3, 6.94, Some(0.98), Some(5.392), 1, 2, &[1], 1.28),
    element!("B", 5, 10.81, Some(2.04), Some(8.298), 13, 2, &[3], 0.84),
    element!("C", 6, 12.011, Some(2.55), Some(11.260), 14, 2, &[4], 0.76),
    element!("N", 7, 14.007, Some(3.04), Some(14.534), 15, 2, &[3, 5], 0.71),
    element!("O", 8, 15.999, Some(3.44), Some(13.618), 16, 2, &[2], 0.66),
    element!("F", 9, 18.998, Some(3.98), Some(17.423), 17, 2, &[1], 0.57),
    element!("Na", 11, 22.990, Some(0.93), Some(5.139), 1, 3, &[1], 1.66),
    element!("Mg", 12, 24.305, Some(1.31), Some(7.646), 2, 3, &[2], 1.41),
    element!("Al", 13, 26.982, Some(1.61), Some(5.986), 13, 3, &[3], 1.21),
    element!("Si", 14, 28.085, Some(1.90), Some(8.152), 14, 3, &[4], 1.11),
    element!("P", 15, 30.974, Some(2.19), Some(10.487), 15, 3, &[3, 5], 1.07),
    element!("S", 16, 32.06, Some(2.58), Some(10.360), 16, 3, &[2, 4, 6], 1.05),
    element!("Cl", 17, 35.45, Some(3.16), Some(12.968), 17, 3, &[1], 1.02),
    element!("K", 19, 39.098, Some(0.82), Some(4.341), 1, 4, &[1], 2.03),
    element!("Ca", 20, 40.078, Some(1.00), Some(6.113), 2, 4, &[2], 1.76),
    element!("Mn", 25, 54.938, Some(1.55), Some(7.434), 7, 4, &[], 1.39),
    element!("Fe", 26, 55.845, Some(1.83), Some(7.902), 8, 4, &[], 1.32),
    element!("Co", 27, 58.933, Some(1.88), Some(7.881), 9, 4, &[], 1.26),
    element!("Cu", 29, 63.546, Some(1.90), Some(7.726), 11, 4, &[], 1.32),
    element!("Zn", 30, 65.38, Some(1.65), Some(9.394), 12, 4, &[], 1.22),
    element!("As", 33, 74.922, Some(2.18), Some(9.789), 15, 4, &[3, 5], 1.19),
    element!("Se", 34, 78.971, Some(2.55), Some(9.752), 16, 4, &[2, 4, 6], 1.20),
    element!("Br", 35, 79.904, Some(2.96), Some(11.814), 17, 4, &[1], 1.20),
    element!("Ag", 47, 107.868, Some(1.93), Some(7.576), 11, 5, &[], 1.45),
    element!("Sn", 50, 118.710, Some(1.96), Some(7.344), 14, 5, &[], 1.39),
    element!("I", 53, 126.904, Some(2.66), Some(10.451), 17, 5, &[1], 1.39),
    element!("Pt", 78, 195.084, Some(2.28), Some(8.959), 10, 6, &[], 1.36),
    element!("Au", 79, 196.967, Some(2.54), Some(9.226), 11, 6, &[], 1.36),
    element!("Hg", 80, 200.592, Some(2.00), Some(10.438), 12, 6, &[], 1.32),
];

/// Elements considered organic
pub const ORGANIC: &[&str] = &["H", "B", "C", "N", "O", "F", "P", "S", "Cl", "Br", "I"];

/// Look up an element by symbol (case-sensitive, `*` for dummy)
pub fn by_symbol(symbol: &str) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.symbol == symbol)
}

/// Look up an element by atomic number
pub fn by_atomic_number(atomic_number: u8) -> Option<&'static Element> {
    ELEMENTS.iter().find(|e| e.atomic_number == atomic_number)
}

/// All tabulated elements in atomic-number order
pub fn all() -> &'static [Element] {
    ELEMENTS
}

impl Element {
    /// Whether this element belongs to the organic set
    pub fn is_organic(&self) -> bool {
        ORGANIC.contains(&self.symbol)
    }

    /// Whether the element is a metal (groups 1-12 except hydrogen, plus Al and Sn)
    pub fn is_metal(&self) -> bool {
        (self.group >= 1 && self.group <= 12 && self.atomic_number != 1)
            || matches!(self.symbol, "Al" | "Sn")
    }

    pub fn is_hydrogen(&self) -> bool {
        self.atomic_number == 1
    }

    /// Maximum valence allowed for an atom of this element carrying `charge`
    ///
    /// Returns `None` when the element has no valence model (metals, dummy).
    pub fn max_valence(&self, charge: i8) -> Option<u8> {
        let (&lowest, &highest) = (self.valences.first()?, self.valences.last()?);
        let value = match (self.group, charge) {
            (_, 0) => highest as i16,
            // isoelectronic with the next group to the left
            (15..=17, c) if c > 0 => lowest as i16 + c as i16,
            (15..=17, c) => highest as i16 + c as i16,
            (13, c) if c < 0 => lowest as i16 - c as i16,
            (_, c) => highest as i16 - (c as i16).abs(),
        };
        Some(value.max(0) as u8)
    }

    /// Smallest default valence that accommodates `explicit` bonds
    pub fn default_valence_for(&self, explicit: u8) -> Option<u8> {
        self.valences.iter().copied().find(|&v| v >= explicit)
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol)
    }
}
