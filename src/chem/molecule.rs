//! Molecular graph model

use crate::chem::element::{self, Element};
use serde::{Serialize, Serializer};
use std::collections::VecDeque;
use std::fmt;
use thiserror::Error;

/// Errors raised while building or checking a molecule
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MoleculeError {
    #[error("Explicit valence {valence} for atom #{atom} {symbol} is greater than permitted ({max})")]
    Valence {
        atom: usize,
        symbol: String,
        valence: u8,
        max: u8,
    },

    #[error("Invalid bond between atoms {0} and {1}")]
    InvalidBond(usize, usize),

    #[error("Conformer has {found} positions but the molecule has {expected} atoms")]
    ConformerSize { expected: usize, found: usize },
}

/// Bond order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BondOrder {
    Single,
    Double,
    Triple,
    Aromatic,
}

impl BondOrder {
    /// Integer contribution to explicit valence (aromatic counts as one)
    pub fn valence(&self) -> u8 {
        match self {
            BondOrder::Single | BondOrder::Aromatic => 1,
            BondOrder::Double => 2,
            BondOrder::Triple => 3,
        }
    }

    /// Bond order as a real number (aromatic = 1.5)
    pub fn as_f64(&self) -> f64 {
        match self {
            BondOrder::Single => 1.0,
            BondOrder::Double => 2.0,
            BondOrder::Triple => 3.0,
            BondOrder::Aromatic => 1.5,
        }
    }

    /// SMILES bond symbol
    pub fn symbol(&self) -> &'static str {
        match self {
            BondOrder::Single => "-",
            BondOrder::Double => "=",
            BondOrder::Triple => "#",
            BondOrder::Aromatic => ":",
        }
    }
}

/// Tetrahedral chirality tag as read from SMILES
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Chirality {
    #[default]
    None,
    CounterClockwise,
    Clockwise,
}

/// Orbital hybridisation, perceived from bonding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hybridization {
    S,
    Sp,
    Sp2,
    Sp3,
    Other,
}

/// An atom in a molecule
#[derive(Debug, Clone, PartialEq)]
pub struct Atom {
    pub element: &'static Element,

    /// Formal charge
    pub charge: i8,

    /// Isotope mass number, if given
    pub isotope: Option<u16>,

    /// Hydrogens attached but not represented as atoms
    pub h_count: u8,

    pub aromatic: bool,

    /// Whether the atom was written in brackets (no implicit hydrogens)
    pub bracket: bool,

    pub chirality: Chirality,

    /// Atom class from `[C:1]` notation
    pub class: Option<u32>,
}

impl Atom {
    /// Create a plain uncharged atom with no hydrogens
    pub fn new(element: &'static Element) -> Self {
        Self {
            element,
            charge: 0,
            isotope: None,
            h_count: 0,
            aromatic: false,
            bracket: false,
            chirality: Chirality::None,
            class: None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        self.element.symbol
    }

    pub fn atomic_number(&self) -> u8 {
        self.element.atomic_number
    }

    /// Mass of the atom, using the isotope when one is given
    pub fn mass(&self) -> f64 {
        match self.isotope {
            Some(isotope) => isotope as f64,
            None => self.element.mass,
        }
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element.is_hydrogen()
    }
}

/// A bond between two atoms
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bond {
    pub begin: usize,
    pub end: usize,
    pub order: BondOrder,
}

impl Bond {
    /// The atom at the other end of the bond
    pub fn other(&self, atom: usize) -> usize {
        if self.begin == atom {
            self.end
        } else {
            self.begin
        }
    }
}

/// Ring membership of atoms and bonds
#[derive(Debug, Clone)]
pub struct RingInfo {
    pub atom_in_ring: Vec<bool>,
    pub bond_in_ring: Vec<bool>,
}

/// A molecular graph with an optional 3-D conformer
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    /// Optional display name
    pub name: Option<String>,

    atoms: Vec<Atom>,
    bonds: Vec<Bond>,

    /// atom -> (neighbour, bond index)
    adjacency: Vec<Vec<(usize, usize)>>,

    conformer: Option<Vec<[f64; 3]>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an atom and return its index
    pub fn add_atom(&mut self, atom: Atom) -> usize {
        self.atoms.push(atom);
        self.adjacency.push(Vec::new());
        self.conformer = None;
        self.atoms.len() - 1
    }

    /// Add a bond between two existing atoms and return its index
    pub fn add_bond(&mut self, begin: usize, end: usize, order: BondOrder) -> Result<usize, MoleculeError> {
        if begin == end || begin >= self.atoms.len() || end >= self.atoms.len() || self.bond_between(begin, end).is_some() {
            return Err(MoleculeError::InvalidBond(begin, end));
        }
        let idx = self.bonds.len();
        self.bonds.push(Bond { begin, end, order });
        self.adjacency[begin].push((end, idx));
        self.adjacency[end].push((begin, idx));
        Ok(idx)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn atom(&self, idx: usize) -> &Atom {
        &self.atoms[idx]
    }

    pub fn atom_mut(&mut self, idx: usize) -> &mut Atom {
        &mut self.atoms[idx]
    }

    pub fn bonds(&self) -> &[Bond] {
        &self.bonds
    }

    pub fn num_atoms(&self) -> usize {
        self.atoms.len()
    }

    pub fn num_bonds(&self) -> usize {
        self.bonds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Number of non-hydrogen atoms
    pub fn num_heavy_atoms(&self) -> usize {
        self.atoms.iter().filter(|a| !a.is_hydrogen()).count()
    }

    /// Neighbours of an atom as (neighbour index, bond)
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, &Bond)> + '_ {
        self.adjacency[idx].iter().map(move |&(n, b)| (n, &self.bonds[b]))
    }

    /// Raw adjacency of an atom as (neighbour index, bond index)
    pub fn adjacency(&self, idx: usize) -> &[(usize, usize)] {
        &self.adjacency[idx]
    }

    /// Bond index between two atoms, if bonded
    pub fn bond_between(&self, a: usize, b: usize) -> Option<usize> {
        self.adjacency.get(a)?.iter().find(|&&(n, _)| n == b).map(|&(_, bond)| bond)
    }

    pub fn degree(&self, idx: usize) -> usize {
        self.adjacency[idx].len()
    }

    /// Number of non-hydrogen neighbours
    pub fn heavy_degree(&self, idx: usize) -> usize {
        self.neighbors(idx).filter(|(n, _)| !self.atoms[*n].is_hydrogen()).count()
    }

    /// Total hydrogens on an atom: virtual plus explicit H neighbours
    pub fn total_hydrogens(&self, idx: usize) -> u8 {
        let explicit = self.neighbors(idx).filter(|(n, _)| self.atoms[*n].is_hydrogen()).count() as u8;
        self.atoms[idx].h_count + explicit
    }

    /// Sum of bond valences on an atom (aromatic bonds count one each)
    pub fn explicit_valence(&self, idx: usize) -> u8 {
        self.neighbors(idx).map(|(_, b)| b.order.valence()).sum()
    }

    /// Full valence: bonds plus virtual hydrogens
    pub fn valence(&self, idx: usize) -> u8 {
        self.explicit_valence(idx) + self.atoms[idx].h_count
    }

    /// Hydrogens an organic-subset atom would carry implicitly
    pub fn implicit_hydrogens(&self, idx: usize) -> u8 {
        let atom = &self.atoms[idx];
        let explicit = self.explicit_valence(idx);
        if atom.aromatic {
            // one valence goes to the pi system
            let lowest = atom.element.valences.first().copied().unwrap_or(0);
            return lowest.saturating_sub(explicit + 1);
        }
        match atom.element.default_valence_for(explicit) {
            Some(target) => target - explicit,
            None => 0,
        }
    }

    /// Check every atom against the valence its element allows
    pub fn sanitize(&self) -> Result<(), MoleculeError> {
        for (idx, atom) in self.atoms.iter().enumerate() {
            if let Some(max) = atom.element.max_valence(atom.charge) {
                let valence = self.valence(idx);
                if valence > max {
                    return Err(MoleculeError::Valence {
                        atom: idx,
                        symbol: atom.symbol().to_string(),
                        valence,
                        max,
                    });
                }
            }
        }
        Ok(())
    }

    /// Perceive hybridisation from bond orders
    pub fn hybridization(&self, idx: usize) -> Hybridization {
        let atom = &self.atoms[idx];
        if atom.is_hydrogen() {
            return Hybridization::S;
        }
        if atom.element.valences.is_empty() {
            return Hybridization::Other;
        }
        let mut doubles = 0;
        let mut triples = 0;
        for (_, bond) in self.neighbors(idx) {
            match bond.order {
                BondOrder::Double => doubles += 1,
                BondOrder::Triple => triples += 1,
                _ => {}
            }
        }
        if triples > 0 || doubles > 1 {
            Hybridization::Sp
        } else if doubles == 1 || atom.aromatic {
            Hybridization::Sp2
        } else {
            Hybridization::Sp3
        }
    }

    /// Perceive which atoms and bonds sit on a ring
    ///
    /// A bond is a ring bond when its endpoints stay connected without it.
    pub fn ring_info(&self) -> RingInfo {
        let mut bond_in_ring = vec![false; self.bonds.len()];
        for (idx, bond) in self.bonds.iter().enumerate() {
            bond_in_ring[idx] = self.connected_without(bond.begin, bond.end, idx);
        }
        let mut atom_in_ring = vec![false; self.atoms.len()];
        for (idx, bond) in self.bonds.iter().enumerate() {
            if bond_in_ring[idx] {
                atom_in_ring[bond.begin] = true;
                atom_in_ring[bond.end] = true;
            }
        }
        RingInfo {
            atom_in_ring,
            bond_in_ring,
        }
    }

    fn connected_without(&self, from: usize, to: usize, skip_bond: usize) -> bool {
        let mut seen = vec![false; self.atoms.len()];
        let mut queue = VecDeque::from([from]);
        seen[from] = true;
        while let Some(current) = queue.pop_front() {
            for &(n, b) in &self.adjacency[current] {
                if b == skip_bond || seen[n] {
                    continue;
                }
                if n == to {
                    return true;
                }
                seen[n] = true;
                queue.push_back(n);
            }
        }
        false
    }

    /// Shortest path lengths (in bonds) from one atom to every other
    pub fn graph_distances(&self, from: usize) -> Vec<Option<usize>> {
        let mut dist = vec![None; self.atoms.len()];
        let mut queue = VecDeque::from([from]);
        dist[from] = Some(0);
        while let Some(current) = queue.pop_front() {
            let d = dist[current].unwrap_or(0);
            for &(n, _) in &self.adjacency[current] {
                if dist[n].is_none() {
                    dist[n] = Some(d + 1);
                    queue.push_back(n);
                }
            }
        }
        dist
    }

    /// Connected components as sorted lists of atom indices, in order of first atom
    pub fn fragments(&self) -> Vec<Vec<usize>> {
        let mut assigned = vec![false; self.atoms.len()];
        let mut fragments = Vec::new();
        for start in 0..self.atoms.len() {
            if assigned[start] {
                continue;
            }
            let mut fragment: Vec<usize> = self
                .graph_distances(start)
                .iter()
                .enumerate()
                .filter_map(|(i, d)| d.map(|_| i))
                .collect();
            fragment.sort_unstable();
            for &i in &fragment {
                assigned[i] = true;
            }
            fragments.push(fragment);
        }
        fragments
    }

    /// Copy a subset of atoms (and the bonds among them) into a new molecule
    pub fn extract(&self, atoms: &[usize]) -> Molecule {
        let mut mapping = vec![None; self.atoms.len()];
        let mut mol = Molecule::new();
        mol.name = self.name.clone();
        for &old in atoms {
            mapping[old] = Some(mol.add_atom(self.atoms[old].clone()));
        }
        for bond in &self.bonds {
            if let (Some(b), Some(e)) = (mapping[bond.begin], mapping[bond.end]) {
                // indices come from a valid molecule
                let _ = mol.add_bond(b, e, bond.order);
            }
        }
        if let Some(coords) = &self.conformer {
            mol.conformer = Some(atoms.iter().map(|&i| coords[i]).collect());
        }
        mol
    }

    /// Sum of atomic masses including attached hydrogens
    pub fn molecular_weight(&self) -> f64 {
        let hydrogen = element::by_symbol("H").map(|h| h.mass).unwrap_or(1.008);
        self.atoms
            .iter()
            .map(|a| a.mass() + a.h_count as f64 * hydrogen)
            .sum()
    }

    /// Return a copy where every virtual hydrogen is an explicit atom
    pub fn add_hydrogens(&self) -> Molecule {
        let mut mol = self.clone();
        mol.conformer = None;
        let hydrogen = match element::by_symbol("H") {
            Some(h) => h,
            None => return mol,
        };
        for idx in 0..self.atoms.len() {
            let count = mol.atoms[idx].h_count;
            mol.atoms[idx].h_count = 0;
            for _ in 0..count {
                let mut h = Atom::new(hydrogen);
                h.bracket = true;
                let h_idx = mol.add_atom(h);
                let _ = mol.add_bond(idx, h_idx, BondOrder::Single);
            }
        }
        mol
    }

    /// Return a copy where plain hydrogen atoms are folded back into their neighbour
    pub fn remove_hydrogens(&self) -> Molecule {
        let removable: Vec<bool> = (0..self.atoms.len())
            .map(|idx| {
                let atom = &self.atoms[idx];
                atom.is_hydrogen()
                    && atom.charge == 0
                    && atom.isotope.is_none()
                    && self.degree(idx) == 1
                    && self.neighbors(idx).all(|(n, _)| !self.atoms[n].is_hydrogen())
            })
            .collect();
        let keep: Vec<usize> = (0..self.atoms.len()).filter(|&i| !removable[i]).collect();
        let mut mol = self.extract(&keep);
        let mut new_index = vec![0usize; self.atoms.len()];
        for (new, &old) in keep.iter().enumerate() {
            new_index[old] = new;
        }
        for bond in &self.bonds {
            if removable[bond.end] && !removable[bond.begin] {
                mol.atoms[new_index[bond.begin]].h_count += 1;
            } else if removable[bond.begin] && !removable[bond.end] {
                mol.atoms[new_index[bond.end]].h_count += 1;
            }
        }
        mol
    }

    pub fn conformer(&self) -> Option<&[[f64; 3]]> {
        self.conformer.as_deref()
    }

    /// Attach 3-D coordinates, one per atom
    pub fn set_conformer(&mut self, coords: Vec<[f64; 3]>) -> Result<(), MoleculeError> {
        if coords.len() != self.atoms.len() {
            return Err(MoleculeError::ConformerSize {
                expected: self.atoms.len(),
                found: coords.len(),
            });
        }
        self.conformer = Some(coords);
        Ok(())
    }

    /// Molecular formula in Hill order
    pub fn formula(&self) -> String {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        let mut bump = |symbol: &'static str, n: usize| {
            if n == 0 {
                return;
            }
            match counts.iter_mut().find(|(s, _)| *s == symbol) {
                Some((_, c)) => *c += n,
                None => counts.push((symbol, n)),
            }
        };
        for atom in &self.atoms {
            bump(atom.symbol(), 1);
            bump("H", atom.h_count as usize);
        }
        counts.sort_by(|a, b| {
            let rank = |s: &str| match s {
                "C" => 0,
                "H" => 1,
                _ => 2,
            };
            rank(a.0).cmp(&rank(b.0)).then(a.0.cmp(b.0))
        });
        counts
            .iter()
            .map(|(s, n)| if *n == 1 { s.to_string() } else { format!("{}{}", s, n) })
            .collect()
    }
}

/// Molecules serialize as their SMILES string
impl Serialize for Molecule {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_smiles())
    }
}

impl fmt::Display for Molecule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_smiles())
    }
}
