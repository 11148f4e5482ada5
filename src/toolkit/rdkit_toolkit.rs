use std::collections::{BTreeSet, HashMap};

use rdkit::{
    fragment_parent, substruct_match, CleanupParameters, Properties, ROMol, RWMol,
    SubstructMatchParameters,
};

use super::{Fingerprint, Toolkit};
use crate::error::{Result, ScreenError};

thread_local! {
    static PROPERTIES: Properties = Properties::new();
}

/// RDKit-backed toolkit. Fingerprints are RDKit topological fingerprints.
#[derive(Debug, Default, Clone, Copy)]
pub struct RdkitToolkit;

impl RdkitToolkit {
    pub fn new() -> Self {
        Self
    }
}

impl Toolkit for RdkitToolkit {
    type Mol = ROMol;
    type Query = ROMol;

    fn compile_query(&self, smarts: &str) -> Result<ROMol> {
        let query = RWMol::from_smarts(smarts).map_err(|e| ScreenError::InvalidPattern {
            smarts: smarts.to_string(),
            details: e.to_string(),
        })?;
        Ok(query.to_ro_mol())
    }

    fn mol_from_block(&self, mol_block: &str) -> Result<ROMol> {
        RWMol::from_mol_block(mol_block, true, true, false)
            .map(|rw_mol| rw_mol.to_ro_mol())
            .ok_or_else(|| {
                let header = mol_block.lines().next().unwrap_or_default();
                ScreenError::molecule(header, "could not convert mol block")
            })
    }

    fn mol_from_smiles(&self, smiles: &str) -> Result<ROMol> {
        ROMol::from_smiles(smiles).map_err(|e| ScreenError::molecule(smiles, e))
    }

    fn largest_component(&self, mol: &ROMol) -> Result<ROMol> {
        let rwmol = mol.as_rw_mol(false, 1);
        let cleanup_params = CleanupParameters::default();
        // skip standardization, only the fragment choice is wanted
        let parent = fragment_parent(&rwmol, &cleanup_params, true);
        Ok(parent.to_ro_mol())
    }

    fn canonical_smiles(&self, mol: &ROMol) -> String {
        mol.as_smiles()
    }

    fn matches(&self, query: &ROMol, mol: &ROMol) -> bool {
        let params = SubstructMatchParameters::default();
        !substruct_match(mol, query, &params).is_empty()
    }

    fn fingerprint(&self, mol: &ROMol) -> Fingerprint {
        mol.fingerprint().into()
    }

    fn descriptors(&self, mol: &ROMol) -> HashMap<String, f64> {
        PROPERTIES.with(|properties| properties.compute_properties(mol))
    }

    fn net_charge(&self, mol: &ROMol) -> i32 {
        let mut romol = mol.clone();
        (0..romol.num_atoms(true))
            .map(|idx| romol.atom_with_idx(idx).get_formal_charge())
            .sum()
    }

    fn elements(&self, mol: &ROMol) -> BTreeSet<String> {
        let mut romol = mol.clone();
        (0..romol.num_atoms(true))
            .map(|idx| romol.atom_with_idx(idx).symbol())
            .collect()
    }

    fn similarity(a: &Fingerprint, b: &Fingerprint) -> f64 {
        // rdkit divides 0 by 0 for two empty vectors
        if a.no_bits_set() && b.no_bits_set() {
            return 1.0;
        }
        let a = rdkit::Fingerprint(a.0.clone());
        let b = rdkit::Fingerprint(b.0.clone());
        a.tanimoto_distance(&b) as f64
    }
}
