//! Chemistry model: elements, molecular graphs and SMILES

pub mod element;
pub mod molecule;
pub mod smiles;

pub use element::{Element, ORGANIC};
pub use molecule::{Atom, Bond, BondOrder, Chirality, Hybridization, Molecule, MoleculeError, RingInfo};
pub use smiles::SmilesError;
