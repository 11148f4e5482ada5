use std::collections::BTreeSet;

use regex::Regex;

/// Sum of the charges written on bracket atoms, e.g. `[NH3+]`, `[O-]`, `[Fe+2]`.
pub fn net_charge(smiles: &str) -> i32 {
    let charge = Regex::new(r"\[[^\]]*?(?P<sign>[+-])(?P<count>\d*)\]").unwrap();
    charge
        .captures_iter(smiles)
        .map(|caps| {
            let magnitude = caps["count"].parse::<i32>().unwrap_or(1);
            if &caps["sign"] == "+" {
                magnitude
            } else {
                -magnitude
            }
        })
        .sum()
}

/// Element symbols written in the SMILES, aromatic ones upper-cased.
pub fn elements(smiles: &str) -> BTreeSet<String> {
    let element = Regex::new(
        r"\[\d*(?P<bracket>[A-Z][a-z]?|[cnops])|(?P<organic>Cl|Br|[BCNOPSFI]|[cnops])",
    )
    .unwrap();
    element
        .captures_iter(smiles)
        .filter_map(|caps| caps.name("bracket").or_else(|| caps.name("organic")))
        .map(|m| {
            let symbol = m.as_str();
            symbol[..1].to_ascii_uppercase() + &symbol[1..]
        })
        .collect()
}

#[test]
fn test_mock_charge_and_elements() {
    assert_eq!(net_charge("CC[NH3+]"), 1);
    assert_eq!(net_charge("O=P([O-])([O-])OC"), -2);
    assert_eq!(net_charge("[Fe+2]"), 2);

    let found = elements("Clc1ccc(cc1)[Si]N");
    let expected = ["C", "Cl", "N", "Si"]
        .iter()
        .map(|s| s.to_string())
        .collect::<BTreeSet<_>>();
    assert_eq!(found, expected);
}
