//! Scoring statistics.
//!
//! Each method rewrites the contingency counts into the form its oracle
//! queries see, then applies the quaternary remapping to build one query per
//! regulation hypothesis:
//!
//! - Quaternary: counts unchanged.
//! - Ternary: ambiguous children dropped from the query's partition and
//!   population. The reported counts keep them.
//! - Enrichment: signed children folded into the ambiguous group, which makes
//!   the up and down queries identical.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use regscore_common::{RegScoreError, Result};

use crate::contingency::Contingency;
use crate::oracle::{OracleQuery, PValueOracle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Method {
    Quaternary,
    Ternary,
    Enrichment,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Method::Quaternary => "Quaternary",
            Method::Ternary => "Ternary",
            Method::Enrichment => "Enrichment",
        }
    }

    /// Counts reported in the result table under this method.
    pub fn effective_counts(self, c: &Contingency) -> Contingency {
        match self {
            Method::Quaternary | Method::Ternary => *c,
            Method::Enrichment => Contingency {
                npp: 0,
                npm: 0,
                npz: 0,
                nmp: 0,
                nmm: 0,
                nmz: 0,
                nrp: c.npp + c.nmp + c.nrp,
                nrm: c.npm + c.nmm + c.nrm,
                nrz: c.npz + c.nmz + c.nrz,
                ..*c
            },
        }
    }

    /// Counts the oracle queries are built from.
    pub fn query_counts(self, c: &Contingency) -> Contingency {
        let effective = self.effective_counts(c);
        match self {
            Method::Ternary => Contingency {
                nrp: 0,
                nrm: 0,
                nrz: 0,
                ..effective
            },
            Method::Quaternary | Method::Enrichment => effective,
        }
    }

    /// Oracle query for one hypothesis.
    pub fn query(self, c: &Contingency, regulation: Regulation) -> OracleQuery {
        quaternary_query(&self.query_counts(c), regulation)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Method {
    type Err = RegScoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "Quaternary" => Ok(Method::Quaternary),
            "Ternary" => Ok(Method::Ternary),
            "Enrichment" => Ok(Method::Enrichment),
            other => Err(RegScoreError::InvalidMethod(other.to_string())),
        }
    }
}

/// Assumed direction of a source's own regulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regulation {
    Up,
    Down,
}

impl Regulation {
    pub fn as_str(self) -> &'static str {
        match self {
            Regulation::Up => "up",
            Regulation::Down => "down",
        }
    }
}

fn quaternary_query(c: &Contingency, regulation: Regulation) -> OracleQuery {
    let plus_group = c.npp + c.npm + c.npz;
    let minus_group = c.nmp + c.nmm + c.nmz;
    let ambiguous_hits = (c.nrp + c.nrm) as i64;

    let (q_plus, q_minus, score) = match regulation {
        Regulation::Up => (
            plus_group,
            minus_group,
            (c.npp + c.nmm) as i64 + ambiguous_hits - (c.npm + c.nmp) as i64,
        ),
        Regulation::Down => (
            minus_group,
            plus_group,
            (c.nmp + c.npm) as i64 + ambiguous_hits - (c.npp + c.nmm) as i64,
        ),
    };

    OracleQuery {
        score,
        q_plus,
        q_minus,
        q_zero: c.nzp + c.nzm + c.nzz,
        q_r: c.nrp + c.nrm + c.nrz,
        n_plus: c.npp + c.nmp + c.nrp + c.nzp,
        n_minus: c.npm + c.nmm + c.nrm + c.nzm,
        n_zero: c.npz + c.nmz + c.nrz + c.nzz,
    }
}

/// Both hypotheses of one source under one method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodScore {
    /// Counts reported for the method (see [`Method::effective_counts`])
    pub effective: Contingency,
    pub up: OracleQuery,
    pub down: OracleQuery,
    pub pvalue_up: f64,
    pub pvalue_down: f64,
}

/// Build both queries for a source and ask the oracle.
pub fn score_counts(
    method: Method,
    counts: &Contingency,
    oracle: &dyn PValueOracle,
) -> Result<MethodScore> {
    let effective = method.effective_counts(counts);
    let up = method.query(counts, Regulation::Up);
    let down = method.query(counts, Regulation::Down);

    let pvalue_up = oracle.pvalue(&up)?;
    let pvalue_down = match method {
        Method::Enrichment => pvalue_up,
        Method::Quaternary | Method::Ternary => oracle.pvalue(&down)?,
    };

    Ok(MethodScore {
        effective,
        up,
        down,
        pvalue_up,
        pvalue_down,
    })
}
