//! SMILES line notation: parsing and writing

use crate::chem::element;
use crate::chem::molecule::{Atom, BondOrder, Chirality, Molecule, MoleculeError};
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::OnceLock;
use thiserror::Error;

/// Errors raised while parsing a SMILES string
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SmilesError {
    #[error("Empty SMILES string")]
    Empty,

    #[error("Unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { pos: usize, ch: char },

    #[error("Unknown element '{symbol}' at position {pos}")]
    UnknownElement { pos: usize, symbol: String },

    #[error("Invalid bracket atom '[{content}]' at position {pos}")]
    InvalidBracketAtom { pos: usize, content: String },

    #[error("Unclosed branch")]
    UnclosedBranch,

    #[error("Unmatched ')' at position {0}")]
    UnmatchedBranch(usize),

    #[error("Unclosed ring bond {0}")]
    UnclosedRing(u32),

    #[error("Bond at position {0} is not followed by an atom")]
    DanglingBond(usize),

    #[error("Bond order '{0}' is not supported")]
    UnsupportedBond(char),

    #[error(transparent)]
    Molecule(#[from] MoleculeError),
}

fn bracket_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?P<isotope>\d+)?(?P<symbol>se|as|[A-Z][a-z]?|[bcnops]|\*)(?P<chiral>@@?)?(?P<hydrogens>H(?P<hcount>\d)?)?(?P<charge>[+-]\d+|\+\+?|--?)?(?::(?P<class>\d+))?$",
        )
        .expect("bracket atom pattern is valid")
    })
}

struct RingOpening {
    atom: usize,
    order: Option<BondOrder>,
}

impl Molecule {
    /// Parse a SMILES string into a sanitized molecule
    pub fn from_smiles(smiles: &str) -> Result<Molecule, SmilesError> {
        let mol = Parser::new(smiles.trim()).parse()?;
        mol.sanitize()?;
        Ok(mol)
    }

    /// Write the molecule as (non-canonical) SMILES
    pub fn to_smiles(&self) -> String {
        Writer::new(self).write()
    }
}

struct Parser<'a> {
    chars: Vec<char>,
    source: &'a str,
    pos: usize,
    mol: Molecule,
    prev: Option<usize>,
    pending_bond: Option<(BondOrder, usize)>,
    branches: Vec<Option<usize>>,
    rings: BTreeMap<u32, RingOpening>,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().collect(),
            source,
            pos: 0,
            mol: Molecule::new(),
            prev: None,
            pending_bond: None,
            branches: Vec::new(),
            rings: BTreeMap::new(),
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn parse(mut self) -> Result<Molecule, SmilesError> {
        if self.source.is_empty() {
            return Err(SmilesError::Empty);
        }

        while let Some(ch) = self.peek() {
            match ch {
                '(' => {
                    if self.prev.is_none() {
                        return Err(SmilesError::UnexpectedChar { pos: self.pos, ch });
                    }
                    self.branches.push(self.prev);
                    self.pos += 1;
                }
                ')' => {
                    if self.pending_bond.is_some() {
                        return Err(SmilesError::DanglingBond(self.pos));
                    }
                    self.prev = self
                        .branches
                        .pop()
                        .ok_or(SmilesError::UnmatchedBranch(self.pos))?;
                    self.pos += 1;
                }
                '.' => {
                    if self.pending_bond.is_some() || !self.branches.is_empty() {
                        return Err(SmilesError::UnexpectedChar { pos: self.pos, ch });
                    }
                    self.prev = None;
                    self.pos += 1;
                }
                '-' | '=' | '#' | ':' | '/' | '\\' | '$' => {
                    let order = match ch {
                        '-' | '/' | '\\' => BondOrder::Single,
                        '=' => BondOrder::Double,
                        '#' => BondOrder::Triple,
                        ':' => BondOrder::Aromatic,
                        _ => return Err(SmilesError::UnsupportedBond(ch)),
                    };
                    if self.pending_bond.is_some() || self.prev.is_none() {
                        return Err(SmilesError::UnexpectedChar { pos: self.pos, ch });
                    }
                    self.pending_bond = Some((order, self.pos));
                    self.pos += 1;
                }
                '0'..='9' | '%' => self.ring_closure()?,
                '[' => {
                    let atom = self.bracket_atom()?;
                    self.push_atom(atom)?;
                }
                _ => {
                    let atom = self.organic_atom()?;
                    self.push_atom(atom)?;
                }
            }
        }

        if let Some((_, pos)) = self.pending_bond {
            return Err(SmilesError::DanglingBond(pos));
        }
        if !self.branches.is_empty() {
            return Err(SmilesError::UnclosedBranch);
        }
        if let Some((&number, _)) = self.rings.iter().next() {
            return Err(SmilesError::UnclosedRing(number));
        }

        let mut mol = self.mol;
        for idx in 0..mol.num_atoms() {
            if !mol.atom(idx).bracket {
                let implicit = mol.implicit_hydrogens(idx);
                mol.atom_mut(idx).h_count = implicit;
            }
        }
        Ok(mol)
    }

    fn default_order(&self, a: usize, b: usize) -> BondOrder {
        if self.mol.atom(a).aromatic && self.mol.atom(b).aromatic {
            BondOrder::Aromatic
        } else {
            BondOrder::Single
        }
    }

    fn push_atom(&mut self, atom: Atom) -> Result<(), SmilesError> {
        let idx = self.mol.add_atom(atom);
        if let Some(prev) = self.prev {
            let order = match self.pending_bond.take() {
                Some((order, _)) => order,
                None => self.default_order(prev, idx),
            };
            self.mol.add_bond(prev, idx, order)?;
        }
        self.prev = Some(idx);
        Ok(())
    }

    fn ring_closure(&mut self) -> Result<(), SmilesError> {
        let start = self.pos;
        let number = if self.peek() == Some('%') {
            let digits: String = self.chars.iter().skip(self.pos + 1).take(2).collect();
            if digits.len() != 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(SmilesError::UnexpectedChar { pos: start, ch: '%' });
            }
            self.pos += 3;
            digits.parse::<u32>().unwrap_or_default()
        } else {
            let digit = self.chars[self.pos].to_digit(10).unwrap_or_default();
            self.pos += 1;
            digit
        };

        let atom = self.prev.ok_or(SmilesError::UnexpectedChar {
            pos: start,
            ch: self.chars[start],
        })?;
        let bond = self.pending_bond.take().map(|(order, _)| order);

        match self.rings.remove(&number) {
            Some(opening) => {
                let order = bond
                    .or(opening.order)
                    .unwrap_or_else(|| self.default_order(opening.atom, atom));
                self.mol.add_bond(opening.atom, atom, order)?;
            }
            None => {
                self.rings.insert(number, RingOpening { atom, order: bond });
            }
        }
        Ok(())
    }

    fn organic_atom(&mut self) -> Result<Atom, SmilesError> {
        let pos = self.pos;
        let ch = self.chars[pos];
        let next = self.chars.get(pos + 1).copied();
        let (symbol, aromatic, len) = match (ch, next) {
            ('C', Some('l')) => ("Cl", false, 2),
            ('B', Some('r')) => ("Br", false, 2),
            ('B', _) => ("B", false, 1),
            ('C', _) => ("C", false, 1),
            ('N', _) => ("N", false, 1),
            ('O', _) => ("O", false, 1),
            ('P', _) => ("P", false, 1),
            ('S', _) => ("S", false, 1),
            ('F', _) => ("F", false, 1),
            ('I', _) => ("I", false, 1),
            ('b', _) => ("B", true, 1),
            ('c', _) => ("C", true, 1),
            ('n', _) => ("N", true, 1),
            ('o', _) => ("O", true, 1),
            ('p', _) => ("P", true, 1),
            ('s', _) => ("S", true, 1),
            ('*', _) => ("*", false, 1),
            _ => return Err(SmilesError::UnexpectedChar { pos, ch }),
        };
        let element = element::by_symbol(symbol).ok_or_else(|| SmilesError::UnknownElement {
            pos,
            symbol: symbol.to_string(),
        })?;
        self.pos += len;
        let mut atom = Atom::new(element);
        atom.aromatic = aromatic;
        Ok(atom)
    }

    fn bracket_atom(&mut self) -> Result<Atom, SmilesError> {
        let start = self.pos;
        let close = self.chars[start..]
            .iter()
            .position(|&c| c == ']')
            .ok_or(SmilesError::UnexpectedChar { pos: start, ch: '[' })?;
        let content: String = self.chars[start + 1..start + close].iter().collect();
        self.pos = start + close + 1;

        let invalid = || SmilesError::InvalidBracketAtom {
            pos: start,
            content: content.clone(),
        };
        let caps = bracket_regex().captures(&content).ok_or_else(invalid)?;

        let raw_symbol = &caps["symbol"];
        let aromatic = raw_symbol.chars().next().is_some_and(|c| c.is_ascii_lowercase());
        let symbol = if aromatic {
            let mut chars = raw_symbol.chars();
            chars
                .next()
                .map(|c| c.to_ascii_uppercase().to_string() + chars.as_str())
                .unwrap_or_default()
        } else {
            raw_symbol.to_string()
        };
        let element = element::by_symbol(&symbol).ok_or(SmilesError::UnknownElement { pos: start + 1, symbol })?;

        let mut atom = Atom::new(element);
        atom.aromatic = aromatic;
        atom.bracket = true;
        atom.isotope = match caps.name("isotope") {
            Some(m) => Some(m.as_str().parse().map_err(|_| invalid())?),
            None => None,
        };
        atom.chirality = match caps.name("chiral").map(|m| m.as_str()) {
            Some("@") => Chirality::CounterClockwise,
            Some("@@") => Chirality::Clockwise,
            _ => Chirality::None,
        };
        if caps.name("hydrogens").is_some() {
            atom.h_count = match caps.name("hcount") {
                Some(h) => h.as_str().parse().map_err(|_| invalid())?,
                None => 1,
            };
        }
        atom.charge = match caps.name("charge").map(|m| m.as_str()) {
            None => 0,
            Some("+") => 1,
            Some("++") => 2,
            Some("-") => -1,
            Some("--") => -2,
            Some(other) => other.parse().map_err(|_| invalid())?,
        };
        atom.class = match caps.name("class") {
            Some(m) => Some(m.as_str().parse().map_err(|_| invalid())?),
            None => None,
        };
        Ok(atom)
    }
}

const ORGANIC_SUBSET: &[&str] = &["B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I", "*"];

struct Writer<'a> {
    mol: &'a Molecule,
    visited: Vec<bool>,
    children: Vec<Vec<(usize, usize)>>,
    closures: Vec<Vec<usize>>,
    open_rings: BTreeMap<usize, u32>,
    out: String,
}

impl<'a> Writer<'a> {
    fn new(mol: &'a Molecule) -> Self {
        let n = mol.num_atoms();
        Self {
            mol,
            visited: vec![false; n],
            children: vec![Vec::new(); n],
            closures: vec![Vec::new(); n],
            open_rings: BTreeMap::new(),
            out: String::new(),
        }
    }

    fn write(mut self) -> String {
        let mut seen = vec![false; self.mol.num_atoms()];
        let mut tree_bond = vec![false; self.mol.num_bonds()];
        let mut roots = Vec::new();
        for start in 0..self.mol.num_atoms() {
            if !seen[start] {
                roots.push(start);
                self.build_tree(start, &mut seen, &mut tree_bond);
            }
        }
        for (idx, bond) in self.mol.bonds().iter().enumerate() {
            if !tree_bond[idx] {
                self.closures[bond.begin].push(idx);
                self.closures[bond.end].push(idx);
            }
        }

        for (i, root) in roots.into_iter().enumerate() {
            if i > 0 {
                self.out.push('.');
            }
            self.write_atom(root);
        }
        self.out
    }

    fn build_tree(&mut self, atom: usize, seen: &mut [bool], tree_bond: &mut [bool]) {
        seen[atom] = true;
        for &(n, bond) in self.mol.adjacency(atom) {
            if !seen[n] {
                tree_bond[bond] = true;
                self.children[atom].push((n, bond));
                self.build_tree(n, seen, tree_bond);
            }
        }
    }

    fn write_atom(&mut self, atom: usize) {
        self.visited[atom] = true;
        let token = self.atom_token(atom);
        self.out.push_str(&token);

        for bond_idx in self.closures[atom].clone() {
            let bond = self.mol.bonds()[bond_idx];
            let other = bond.other(atom);
            if let Some(number) = self.open_rings.remove(&bond_idx) {
                let symbol = self.bond_token(atom, other, bond.order);
                self.out.push_str(symbol);
                self.push_ring_number(number);
            } else if !self.visited[other] {
                let number = self.free_ring_number();
                self.open_rings.insert(bond_idx, number);
                let symbol = self.bond_token(atom, other, bond.order);
                self.out.push_str(symbol);
                self.push_ring_number(number);
            }
        }

        let children = self.children[atom].clone();
        let last = children.len().saturating_sub(1);
        for (i, (child, bond_idx)) in children.into_iter().enumerate() {
            let order = self.mol.bonds()[bond_idx].order;
            let symbol = self.bond_token(atom, child, order);
            if i < last {
                self.out.push('(');
                self.out.push_str(symbol);
                self.write_atom(child);
                self.out.push(')');
            } else {
                self.out.push_str(symbol);
                self.write_atom(child);
            }
        }
    }

    fn free_ring_number(&self) -> u32 {
        (1..).find(|n| !self.open_rings.values().any(|v| v == n)).unwrap_or(1)
    }

    fn push_ring_number(&mut self, number: u32) {
        if number < 10 {
            self.out.push_str(&number.to_string());
        } else {
            self.out.push_str(&format!("%{:02}", number));
        }
    }

    fn bond_token(&self, a: usize, b: usize, order: BondOrder) -> &'static str {
        let both_aromatic = self.mol.atom(a).aromatic && self.mol.atom(b).aromatic;
        match (order, both_aromatic) {
            (BondOrder::Single, true) => "-",
            (BondOrder::Single, false) | (BondOrder::Aromatic, true) => "",
            (BondOrder::Aromatic, false) => ":",
            (order, _) => order.symbol(),
        }
    }

    fn atom_token(&self, idx: usize) -> String {
        let atom = self.mol.atom(idx);
        let symbol = if atom.aromatic {
            atom.symbol().to_lowercase()
        } else {
            atom.symbol().to_string()
        };
        let bare = ORGANIC_SUBSET.contains(&atom.symbol())
            && atom.charge == 0
            && atom.isotope.is_none()
            && atom.chirality == Chirality::None
            && atom.class.is_none()
            && atom.h_count == self.mol.implicit_hydrogens(idx);
        if bare {
            return symbol;
        }

        let mut token = String::from("[");
        if let Some(isotope) = atom.isotope {
            token.push_str(&isotope.to_string());
        }
        token.push_str(&symbol);
        match atom.chirality {
            Chirality::CounterClockwise => token.push('@'),
            Chirality::Clockwise => token.push_str("@@"),
            Chirality::None => {}
        }
        match atom.h_count {
            0 => {}
            1 => token.push('H'),
            n => token.push_str(&format!("H{}", n)),
        }
        match atom.charge {
            0 => {}
            1 => token.push('+'),
            -1 => token.push('-'),
            c if c > 0 => token.push_str(&format!("+{}", c)),
            c => token.push_str(&c.to_string()),
        }
        if let Some(class) = atom.class {
            token.push_str(&format!(":{}", class));
        }
        token.push(']');
        token
    }
}
