use bitvec::prelude::*;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint(pub BitVec<u8>);

impl Fingerprint {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(BitVec::<u8>::from_slice(bytes))
    }

    pub fn no_bits_set(&self) -> bool {
        self.0.not_any()
    }

    /// Tanimoto similarity in [0, 1]. Two empty fingerprints count as identical;
    /// the shorter of two vectors is padded with unset bits.
    pub fn tanimoto(&self, other: &Fingerprint) -> f64 {
        if self.no_bits_set() && other.no_bits_set() {
            return 1.0;
        }

        let len = self.0.len().max(other.0.len());
        let mut a = self.0.clone();
        a.resize(len, false);
        let mut b = other.0.clone();
        b.resize(len, false);

        let union = (a.clone() | &b).count_ones();
        let intersection = (a & &b).count_ones();
        intersection as f64 / union as f64
    }
}

impl From<rdkit::Fingerprint> for Fingerprint {
    fn from(fp: rdkit::Fingerprint) -> Self {
        Self(fp.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tanimoto_identical() {
        let fp = Fingerprint::from_bytes(&[0b00000001, 0b10101010]);
        assert_eq!(fp.tanimoto(&fp), 1.0);
    }

    #[test]
    fn test_tanimoto_partial_overlap() {
        // 2 shared bits out of 10 set in either
        let fp1 = Fingerprint::from_bytes(&[0b00001111, 0b00000011]);
        let fp2 = Fingerprint::from_bytes(&[0b11111100, 0b00000000]);
        let sim = fp1.tanimoto(&fp2);
        assert!((sim - 2.0 / 10.0).abs() < 1e-12, "tanimoto = {sim}");
    }

    #[test]
    fn test_tanimoto_disjoint() {
        let fp1 = Fingerprint::from_bytes(&[0b11110000]);
        let fp2 = Fingerprint::from_bytes(&[0b00001111]);
        assert_eq!(fp1.tanimoto(&fp2), 0.0);
    }

    #[test]
    fn test_tanimoto_unequal_lengths() {
        let fp1 = Fingerprint::from_bytes(&[0b00000001]);
        let fp2 = Fingerprint::from_bytes(&[0b00000001, 0b00000001]);
        assert_eq!(fp1.tanimoto(&fp2), 0.5);
        assert_eq!(fp2.tanimoto(&fp1), 0.5);
    }

    #[test]
    fn test_tanimoto_empty() {
        let fp1 = Fingerprint::from_bytes(&[0, 0]);
        let fp2 = Fingerprint::from_bytes(&[0, 0]);
        assert_eq!(fp1.tanimoto(&fp2), 1.0);
        assert_eq!(fp1.tanimoto(&Fingerprint::from_bytes(&[0b1])), 0.0);
    }
}
