//! Predicted-sign × observed-value cross tabulation for one source.
//!
//! Cell names read `n{sign}{value}` with sign in {p, m, r} (increases,
//! decreases, ambiguous) and value in {p, m, z} (up, down, no evidence).
//! Non-children use sign `z`.

use serde::{Deserialize, Serialize};

use crate::network::SourceIndex;

/// The 12 contingency counts of a source node.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Contingency {
    pub npp: u64,
    pub npm: u64,
    pub npz: u64,
    pub nmp: u64,
    pub nmm: u64,
    pub nmz: u64,
    pub nrp: u64,
    pub nrm: u64,
    pub nrz: u64,
    pub nzp: u64,
    pub nzm: u64,
    pub nzz: u64,
}

impl Contingency {
    pub fn from_source(source: &SourceIndex) -> Self {
        Self::tally(&source.signs, &source.child_values, &source.non_child_values)
    }

    /// Count children by (sign, value) and non-children by value.
    ///
    /// `signs` and `child_values` are aligned per child.
    pub fn tally(signs: &[i8], child_values: &[i8], non_child_values: &[i8]) -> Self {
        let mut c = Contingency::default();

        for (&sign, &value) in signs.iter().zip(child_values) {
            let cell = match (sign.signum(), value.signum()) {
                (1, 1) => &mut c.npp,
                (1, -1) => &mut c.npm,
                (1, _) => &mut c.npz,
                (-1, 1) => &mut c.nmp,
                (-1, -1) => &mut c.nmm,
                (-1, _) => &mut c.nmz,
                (_, 1) => &mut c.nrp,
                (_, -1) => &mut c.nrm,
                _ => &mut c.nrz,
            };
            *cell += 1;
        }

        for &value in non_child_values {
            match value.signum() {
                1 => c.nzp += 1,
                -1 => c.nzm += 1,
                _ => c.nzz += 1,
            }
        }

        c
    }

    /// Sum of the 9 child cells.
    pub fn children(&self) -> u64 {
        self.npp
            + self.npm
            + self.npz
            + self.nmp
            + self.nmm
            + self.nmz
            + self.nrp
            + self.nrm
            + self.nrz
    }

    /// Sum of the 3 non-child cells.
    pub fn non_children(&self) -> u64 {
        self.nzp + self.nzm + self.nzz
    }

    pub fn population(&self) -> u64 {
        self.children() + self.non_children()
    }

    /// Children whose observed direction agrees with an up-regulated source.
    pub fn correct_up(&self) -> u64 {
        self.npp + self.nmm
    }

    /// Children whose observed direction contradicts an up-regulated source.
    pub fn incorrect_up(&self) -> u64 {
        self.npm + self.nmp
    }

    /// Children with any observed change.
    pub fn significant_reachable(&self) -> u64 {
        self.npp + self.npm + self.nmp + self.nmm + self.nrp + self.nrm
    }

    pub fn significant_ambiguous(&self) -> u64 {
        self.nrp + self.nrm
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_every_cell() {
        let signs = [1, 1, 1, -1, -1, -1, 0, 0, 0];
        let values = [1, -1, 0, 1, -1, 0, 1, -1, 0];
        let c = Contingency::tally(&signs, &values, &[1, 1, -1, 0, 0, 0]);

        #[rustfmt::skip]
        let expected = Contingency {
            npp: 1, npm: 1, npz: 1,
            nmp: 1, nmm: 1, nmz: 1,
            nrp: 1, nrm: 1, nrz: 1,
            nzp: 2, nzm: 1, nzz: 3,
        };
        assert_eq!(c, expected);
        assert_eq!(c.children(), 9);
        assert_eq!(c.non_children(), 6);
        assert_eq!(c.population(), 15);
    }

    #[test]
    fn test_quaternary_child_counts() {
        let c = Contingency::tally(&[1, -1, 1, 0], &[1, -1, -1, 1], &[]);
        assert_eq!(c.correct_up(), 2);
        assert_eq!(c.incorrect_up(), 1);
        assert_eq!(c.significant_reachable(), 4);
        assert_eq!(c.significant_ambiguous(), 1);
    }

    #[test]
    fn test_empty_source() {
        let c = Contingency::tally(&[], &[], &[0, 0]);
        assert_eq!(c.children(), 0);
        assert_eq!(c.nzz, 2);
    }
}
