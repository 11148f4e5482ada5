#![feature(test)]

use smarts_screen::selection::{DiversitySelector, SelectionLimits};
use smarts_screen::toolkit::{RdkitToolkit, Toolkit};

extern crate test;
use test::Bencher;

#[bench]
fn bench_tanimoto(b: &mut Bencher) {
    let toolkit = RdkitToolkit::new();
    let mol1 = toolkit
        .mol_from_smiles("[N]Cc1cncc2c(=O)c3cccc(CCC(=O)O)c3[nH]c12")
        .unwrap();
    let mol2 = toolkit
        .mol_from_smiles("CCc1cccc2c(=O)c3cncc(CN)c3[nH]c12")
        .unwrap();
    let fingerprint1 = toolkit.fingerprint(&mol1);
    let fingerprint2 = toolkit.fingerprint(&mol2);

    b.iter(|| fingerprint1.tanimoto(&fingerprint2));
}

#[bench]
fn bench_offer_to_full_bucket(b: &mut Bencher) {
    let toolkit = RdkitToolkit::new();
    let described = (1..=60)
        .map(|n| {
            let smiles = format!("{}N", "C".repeat(n));
            let mol = toolkit.mol_from_smiles(&smiles).unwrap();
            (smiles, toolkit.net_charge(&mol), toolkit.fingerprint(&mol))
        })
        .collect::<Vec<_>>();
    let limits = SelectionLimits {
        similarity_threshold: 1.01,
        ..Default::default()
    };

    b.iter(|| {
        let mut selector = DiversitySelector::new(vec!["[#7]".to_string()], limits);
        for (smiles, net_charge, fingerprint) in &described {
            selector.offer(smiles, "1", |_| true, || (*net_charge, fingerprint.clone()));
        }
        selector.num_selected()
    });
}
