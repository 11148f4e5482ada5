use std::cmp::Ordering;
use std::collections::BTreeMap;

pub mod diversity;
pub mod merge;
pub mod split;

pub use diversity::{DiversitySelector, MatchReport, Offer, SelectionLimits};
pub use merge::{merge_batches, MergePolicy};
pub use split::{PatternCandidates, SetSplitter, SplitLimits, SplitPolicy, Verdict};

pub const CHARGE_BUCKET_PREFIX: &str = "net_abs_charge_";
pub const SOURCE_ID_PREFIX: &str = "Pubchem_CID_";

/// charge bucket → molecule entries, in selection order
pub type ChargeBuckets = BTreeMap<String, Vec<String>>;

/// SMARTS pattern → charge buckets
pub type SelectionMap = BTreeMap<String, ChargeBuckets>;

pub fn charge_bucket_key(net_charge: i32) -> String {
    format!("{}{}", CHARGE_BUCKET_PREFIX, net_charge.unsigned_abs())
}

fn bucket_charge(key: &str) -> Option<u32> {
    key.strip_prefix(CHARGE_BUCKET_PREFIX)?.parse().ok()
}

/// Neutral bucket first, then by increasing absolute charge; keys that are not
/// charge buckets go last in lexical order.
pub fn compare_bucket_keys(a: &str, b: &str) -> Ordering {
    match (bucket_charge(a), bucket_charge(b)) {
        (Some(x), Some(y)) => x.cmp(&y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Formats the stored entry: `"<smiles> Pubchem_CID_<id>"`.
pub fn molecule_entry(smiles: &str, source_id: &str) -> String {
    if source_id.is_empty() {
        smiles.to_string()
    } else {
        format!("{smiles} {SOURCE_ID_PREFIX}{source_id}")
    }
}

/// SMILES part of a stored entry.
pub fn entry_smiles(entry: &str) -> &str {
    let entry = entry.trim();
    entry.split_whitespace().next().unwrap_or(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charge_bucket_key() {
        assert_eq!(charge_bucket_key(0), "net_abs_charge_0");
        assert_eq!(charge_bucket_key(-2), "net_abs_charge_2");
        assert_eq!(charge_bucket_key(3), "net_abs_charge_3");
    }

    #[test]
    fn test_bucket_ordering() {
        let mut keys = vec![
            "net_abs_charge_10",
            "other",
            "net_abs_charge_2",
            "net_abs_charge_0",
        ];
        keys.sort_by(|a, b| compare_bucket_keys(a, b));
        assert_eq!(
            keys,
            vec![
                "net_abs_charge_0",
                "net_abs_charge_2",
                "net_abs_charge_10",
                "other"
            ]
        );
    }

    #[test]
    fn test_molecule_entry() {
        let entry = molecule_entry("c1ccncc1", "1049");
        assert_eq!(entry, "c1ccncc1 Pubchem_CID_1049");
        assert_eq!(entry_smiles(&entry), "c1ccncc1");

        assert_eq!(molecule_entry("CCO", ""), "CCO");
        assert_eq!(entry_smiles("CCO"), "CCO");
    }
}
