#![allow(dead_code)]

pub mod smiles;

use std::collections::hash_map::DefaultHasher;
use std::collections::{BTreeSet, HashMap};
use std::hash::{Hash, Hasher};

use bitvec::prelude::*;
use smarts_screen::error::{Result, ScreenError};
use smarts_screen::pubchem::SdfRecord;
use smarts_screen::toolkit::{Fingerprint, Toolkit};

const FINGERPRINT_BITS: usize = 4096;
const BITS_PER_MOL: u64 = 8;

/// String-backed toolkit for pipeline tests.
///
/// * a molecule is its SMILES; `##` or an empty string fails to parse
/// * a query matches when its text is a substring of the SMILES; `!!` fails to compile
/// * a mol block's first line holds the SMILES
/// * the fingerprint hashes the SMILES up to the first `~`, so `X~1` and `X~2`
///   are identical to the selector while staying distinct molecules
/// * NumHeavyAtoms counts atom letters other than H
/// * charge and elements are read off the SMILES text
#[derive(Debug, Default, Clone, Copy)]
pub struct MockToolkit;

impl Toolkit for MockToolkit {
    type Mol = String;
    type Query = String;

    fn compile_query(&self, smarts: &str) -> Result<String> {
        if smarts.contains("!!") {
            return Err(ScreenError::InvalidPattern {
                smarts: smarts.to_string(),
                details: "mock parse failure".to_string(),
            });
        }
        Ok(smarts.to_string())
    }

    fn mol_from_block(&self, mol_block: &str) -> Result<String> {
        self.mol_from_smiles(mol_block.lines().next().unwrap_or_default().trim())
    }

    fn mol_from_smiles(&self, smiles: &str) -> Result<String> {
        if smiles.is_empty() || smiles.contains("##") {
            return Err(ScreenError::molecule(smiles, "mock parse failure"));
        }
        Ok(smiles.to_string())
    }

    fn largest_component(&self, mol: &String) -> Result<String> {
        Ok(mol
            .split('.')
            .max_by_key(|fragment| fragment.len())
            .unwrap_or_default()
            .to_string())
    }

    fn canonical_smiles(&self, mol: &String) -> String {
        mol.clone()
    }

    fn matches(&self, query: &String, mol: &String) -> bool {
        mol.contains(query.as_str())
    }

    fn fingerprint(&self, mol: &String) -> Fingerprint {
        let key = mol.split('~').next().unwrap_or_default();
        let mut bits = bitvec![u8, Lsb0; 0; FINGERPRINT_BITS];
        for seed in 0..BITS_PER_MOL {
            let mut hasher = DefaultHasher::new();
            (seed, key).hash(&mut hasher);
            bits.set(hasher.finish() as usize % FINGERPRINT_BITS, true);
        }
        Fingerprint(bits)
    }

    fn descriptors(&self, mol: &String) -> HashMap<String, f64> {
        let heavy = heavy_atoms(mol) as f64;
        HashMap::from([
            ("NumHeavyAtoms".to_string(), heavy),
            ("amw".to_string(), heavy * 12.0),
        ])
    }

    fn net_charge(&self, mol: &String) -> i32 {
        smiles::net_charge(mol)
    }

    fn elements(&self, mol: &String) -> BTreeSet<String> {
        smiles::elements(mol)
    }
}

fn heavy_atoms(smiles: &str) -> usize {
    smiles
        .split('~')
        .next()
        .unwrap_or_default()
        .chars()
        .filter(|c| c.is_ascii_alphabetic() && !matches!(c, 'H' | 'l' | 'r'))
        .count()
}

/// Distinct nitrogen-bearing SMILES, each with its own fingerprint.
pub fn nitrogen_molecules(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("{}N", "C".repeat(i % 7 + 1)) + &"O".repeat(i / 7)).collect()
}

pub fn sdf_record(smiles: &str, cid: u64) -> SdfRecord {
    SdfRecord {
        title: smiles.to_string(),
        mol_block: format!("{smiles}\n  mock\n\nM  END\n"),
        data: vec![("PUBCHEM_COMPOUND_CID".to_string(), cid.to_string())],
    }
}

pub const PERMISSIVE_FILTER: &str = "ALLOWED_ELEMENTS H C N O S P F Cl Br I\nMAX_ABS_CHARGE 4\n";
