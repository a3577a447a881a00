//! Force-field geometry optimization
//!
//! Embeds deterministic 3-D coordinates and relaxes them with steepest
//! descent over a harmonic bond and angle energy plus a soft repulsion
//! between non-bonded atoms.

use crate::chem::{BondOrder, Hybridization, Molecule};
use crate::core::item::Value;
use crate::core::stage::{into_molecule, Stage, StageError, StageOptions, Transform};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Elements with MMFF parameters
const MMFF_ELEMENTS: &[&str] = &[
    "H", "C", "N", "O", "F", "Si", "P", "S", "Cl", "Br", "I", "Li", "Na", "K", "Mg", "Ca", "Fe", "Cu", "Zn",
];

const BOND_K: f64 = 300.0;
const ANGLE_K: f64 = 50.0;
const REPULSION_K: f64 = 5.0;
const REPULSION_CUTOFF: f64 = 2.5;
const CONVERGENCE: f64 = 1e-3;
const MAX_STEP: f64 = 0.3;

/// Parameter set
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ForceFieldKind {
    #[default]
    Uff,
    Mmff,
}

impl ForceFieldKind {
    fn supports(&self, symbol: &str) -> bool {
        match self {
            ForceFieldKind::Uff => symbol != "*",
            ForceFieldKind::Mmff => MMFF_ELEMENTS.contains(&symbol),
        }
    }
}

fn default_max_iterations() -> usize {
    200
}

fn default_true() -> bool {
    true
}

/// Force field configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForceFieldConfig {
    #[serde(default)]
    pub forcefield: ForceFieldKind,

    /// Steepest-descent iterations
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Make hydrogens explicit before embedding
    #[serde(default = "default_true")]
    pub add_hydrogens: bool,
}

impl Default for ForceFieldConfig {
    fn default() -> Self {
        Self {
            forcefield: ForceFieldKind::Uff,
            max_iterations: default_max_iterations(),
            add_hydrogens: true,
        }
    }
}

/// Transform that attaches an optimized conformer to each molecule
pub struct ForceField {
    name: String,
    options: StageOptions,
    config: ForceFieldConfig,
}

impl ForceField {
    pub fn new(config: ForceFieldConfig) -> Self {
        Self {
            name: "forcefield".to_string(),
            options: StageOptions::default(),
            config,
        }
    }

    pub fn with_options(mut self, options: StageOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Embed and optimize a molecule, returning the copy with a conformer
    pub fn optimize(&self, mol: &Molecule) -> Result<Molecule, StageError> {
        if mol.is_empty() {
            return Err(StageError::ForceField("molecule has no atoms".to_string()));
        }
        if let Some(atom) = mol.atoms().iter().find(|a| !self.config.forcefield.supports(a.symbol())) {
            return Err(StageError::ForceField(format!(
                "no {:?} parameters for element '{}'",
                self.config.forcefield,
                atom.symbol()
            )));
        }

        let mut mol = if self.config.add_hydrogens {
            mol.add_hydrogens()
        } else {
            mol.clone()
        };

        let terms = Terms::build(&mol);
        let mut coords = embed(&mol);
        let (energy, iterations) = minimize(&terms, &mut coords, self.config.max_iterations);
        debug!("Optimized {} atoms in {} iterations, energy {:.4}", mol.num_atoms(), iterations, energy);

        mol.set_conformer(coords)?;
        Ok(mol)
    }
}

impl Default for ForceField {
    fn default() -> Self {
        Self::new(ForceFieldConfig::default())
    }
}

impl Stage for ForceField {
    fn name(&self) -> &str {
        &self.name
    }

    fn options(&self) -> StageOptions {
        self.options
    }

    fn as_transform(&self) -> Option<&dyn Transform> {
        Some(self)
    }
}

impl Transform for ForceField {
    fn transform(&self, value: Value) -> Result<Value, StageError> {
        let mol = into_molecule(value)?;
        self.optimize(&mol).map(Value::Mol)
    }
}

/// A harmonic distance restraint `k (r - target)^2`
#[derive(Debug, Clone, Copy)]
struct Spring {
    a: usize,
    b: usize,
    target: f64,
    k: f64,
}

/// Energy terms of one molecule
#[derive(Debug, Default)]
struct Terms {
    springs: Vec<Spring>,
    /// Pairs only penalized when closer than the cutoff
    repulsive: Vec<(usize, usize)>,
}

impl Terms {
    fn build(mol: &Molecule) -> Self {
        let n = mol.num_atoms();
        let mut related = vec![vec![false; n]; n];
        let mut terms = Terms::default();

        for bond in mol.bonds() {
            terms.springs.push(Spring {
                a: bond.begin,
                b: bond.end,
                target: bond_length(mol, bond.begin, bond.end, bond.order),
                k: BOND_K,
            });
            related[bond.begin][bond.end] = true;
            related[bond.end][bond.begin] = true;
        }

        for centre in 0..n {
            let theta = match mol.hybridization(centre) {
                Hybridization::Sp => 180.0_f64,
                Hybridization::Sp2 => 120.0,
                _ => 109.47,
            }
            .to_radians();
            let neighbours: Vec<(usize, f64)> = mol
                .neighbors(centre)
                .map(|(other, bond)| (other, bond_length(mol, centre, other, bond.order)))
                .collect();
            for (i, &(a, ra)) in neighbours.iter().enumerate() {
                for &(b, rb) in &neighbours[i + 1..] {
                    // law of cosines gives the 1-3 distance for the ideal angle
                    let target = (ra * ra + rb * rb - 2.0 * ra * rb * theta.cos()).sqrt();
                    terms.springs.push(Spring { a, b, target, k: ANGLE_K });
                    related[a][b] = true;
                    related[b][a] = true;
                }
            }
        }

        for a in 0..n {
            for b in a + 1..n {
                if !related[a][b] {
                    terms.repulsive.push((a, b));
                }
            }
        }
        terms
    }

    /// Energy and its gradient at `coords`
    fn evaluate(&self, coords: &[[f64; 3]], gradient: &mut [[f64; 3]]) -> f64 {
        for g in gradient.iter_mut() {
            *g = [0.0; 3];
        }
        let mut energy = 0.0;

        let pull = |a: usize, b: usize, target: f64, k: f64, gradient: &mut [[f64; 3]]| -> f64 {
            let delta = sub(coords[a], coords[b]);
            let r = norm(delta).max(1e-8);
            let stretch = r - target;
            let scale = 2.0 * k * stretch / r;
            for axis in 0..3 {
                gradient[a][axis] += scale * delta[axis];
                gradient[b][axis] -= scale * delta[axis];
            }
            k * stretch * stretch
        };

        for spring in &self.springs {
            energy += pull(spring.a, spring.b, spring.target, spring.k, gradient);
        }
        for &(a, b) in &self.repulsive {
            if norm(sub(coords[a], coords[b])) < REPULSION_CUTOFF {
                energy += pull(a, b, REPULSION_CUTOFF, REPULSION_K, gradient);
            }
        }
        energy
    }
}

/// Ideal bond length from covalent radii, shortened for multiple bonds
fn bond_length(mol: &Molecule, a: usize, b: usize, order: BondOrder) -> f64 {
    let single = mol.atom(a).element.covalent_radius + mol.atom(b).element.covalent_radius;
    let factor = match order {
        BondOrder::Single => 1.0,
        BondOrder::Aromatic => 0.91,
        BondOrder::Double => 0.87,
        BondOrder::Triple => 0.78,
    };
    single * factor
}

/// Deterministic starting coordinates
///
/// Atoms are placed breadth-first, each at its ideal bond length from the
/// atom that reached it, along a pseudo-random direction.
fn embed(mol: &Molecule) -> Vec<[f64; 3]> {
    let n = mol.num_atoms();
    let mut rng = Lcg::new(n as u64 + 1);
    let mut coords = vec![[0.0; 3]; n];
    let mut placed = vec![false; n];

    for start in 0..n {
        if placed[start] {
            continue;
        }
        // disconnected fragments are laid out side by side
        coords[start] = [start as f64 * 4.0, 0.0, 0.0];
        placed[start] = true;
        let mut queue = std::collections::VecDeque::from([start]);
        while let Some(current) = queue.pop_front() {
            for &(next, bond) in mol.adjacency(current) {
                if placed[next] {
                    continue;
                }
                let length = bond_length(mol, current, next, mol.bonds()[bond].order);
                let direction = rng.unit_vector();
                for axis in 0..3 {
                    coords[next][axis] = coords[current][axis] + length * direction[axis];
                }
                placed[next] = true;
                queue.push_back(next);
            }
        }
    }
    coords
}

/// Steepest descent with an adaptive step; returns final energy and iterations used
fn minimize(terms: &Terms, coords: &mut [[f64; 3]], max_iterations: usize) -> (f64, usize) {
    let n = coords.len();
    let mut gradient = vec![[0.0; 3]; n];
    let mut trial_gradient = vec![[0.0; 3]; n];
    let mut energy = terms.evaluate(coords, &mut gradient);
    let mut step = 0.01;

    for iteration in 0..max_iterations {
        let largest = gradient.iter().map(|g| norm(*g)).fold(0.0, f64::max);
        if largest < CONVERGENCE {
            return (energy, iteration);
        }

        let trial: Vec<[f64; 3]> = coords
            .iter()
            .zip(&gradient)
            .map(|(c, g)| {
                let mut move_by = [-step * g[0], -step * g[1], -step * g[2]];
                let length = norm(move_by);
                if length > MAX_STEP {
                    for m in move_by.iter_mut() {
                        *m *= MAX_STEP / length;
                    }
                }
                [c[0] + move_by[0], c[1] + move_by[1], c[2] + move_by[2]]
            })
            .collect();

        let trial_energy = terms.evaluate(&trial, &mut trial_gradient);
        if trial_energy < energy {
            coords.copy_from_slice(&trial);
            std::mem::swap(&mut gradient, &mut trial_gradient);
            energy = trial_energy;
            step *= 1.2;
        } else {
            step *= 0.5;
        }
    }
    (energy, max_iterations)
}

fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

fn norm(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

/// Small linear congruential generator for reproducible embeddings
struct Lcg(u64);

impl Lcg {
    fn new(seed: u64) -> Self {
        Self(seed)
    }

    fn next_f64(&mut self) -> f64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }

    fn unit_vector(&mut self) -> [f64; 3] {
        loop {
            let v = [
                self.next_f64() * 2.0 - 1.0,
                self.next_f64() * 2.0 - 1.0,
                self.next_f64() * 2.0 - 1.0,
            ];
            let length = norm(v);
            if length > 1e-3 && length <= 1.0 {
                return [v[0] / length, v[1] / length, v[2] / length];
            }
        }
    }
}
