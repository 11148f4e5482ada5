use std::collections::{BTreeSet, HashMap};

use crate::error::Result;

pub mod filter;
pub mod fingerprint;
pub mod rdkit_toolkit;

pub use filter::{MolFilter, MolProfile, Rejection};
pub use fingerprint::Fingerprint;
pub use rdkit_toolkit::RdkitToolkit;

/// The chemistry operations the pipeline delegates. Selection and bookkeeping
/// code only ever talks to this trait.
pub trait Toolkit {
    type Mol;
    type Query;

    fn compile_query(&self, smarts: &str) -> Result<Self::Query>;

    fn mol_from_block(&self, mol_block: &str) -> Result<Self::Mol>;

    fn mol_from_smiles(&self, smiles: &str) -> Result<Self::Mol>;

    fn largest_component(&self, mol: &Self::Mol) -> Result<Self::Mol>;

    fn canonical_smiles(&self, mol: &Self::Mol) -> String;

    fn matches(&self, query: &Self::Query, mol: &Self::Mol) -> bool;

    fn fingerprint(&self, mol: &Self::Mol) -> Fingerprint;

    fn descriptors(&self, mol: &Self::Mol) -> HashMap<String, f64>;

    /// Sum of formal charges over all atoms.
    fn net_charge(&self, mol: &Self::Mol) -> i32;

    /// Element symbols of the molecule's atoms; implicit hydrogens are not reported.
    fn elements(&self, mol: &Self::Mol) -> BTreeSet<String>;

    /// Fingerprint similarity in [0, 1]; two empty fingerprints are identical.
    fn similarity(a: &Fingerprint, b: &Fingerprint) -> f64 {
        a.tanimoto(b)
    }

    fn profile(&self, mol: &Self::Mol) -> MolProfile {
        MolProfile {
            descriptors: self.descriptors(mol),
            elements: self.elements(mol),
            net_charge: self.net_charge(mol),
        }
    }
}
