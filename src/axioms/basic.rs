//! Axioms that need no text collaborators.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::axiom::Axiom;
use crate::cache::fingerprint;
use crate::error::AxiomError;
use crate::model::Identified;
use crate::preference::{strictly_greater, Preference};

fn ordering_preference(ordering: Option<Ordering>) -> Preference {
    match ordering {
        Some(Ordering::Greater) => 1.0,
        Some(Ordering::Less) => -1.0,
        _ => 0.0,
    }
}

/// Prefers the larger output.
#[derive(Debug, Clone, Copy, Default)]
pub struct GreaterThan;

impl<I, O: PartialOrd> Axiom<I, O> for GreaterThan {
    fn preference(&self, _input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        Ok(ordering_preference(output1.partial_cmp(output2)))
    }

    fn name(&self) -> String {
        "GT".to_string()
    }
}

/// Prefers the smaller output.
#[derive(Debug, Clone, Copy, Default)]
pub struct LessThan;

impl<I, O: PartialOrd> Axiom<I, O> for LessThan {
    fn preference(&self, _input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        Ok(ordering_preference(output2.partial_cmp(output1)))
    }

    fn name(&self) -> String {
        "LT".to_string()
    }
}

/// Arbitrary but reproducible judgments.
///
/// The decision for a pair is derived from the seed and both outputs'
/// fingerprints, so it is stable across calls and antisymmetric. Identical
/// outputs are a tie.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomAxiom {
    seed: u64,
}

impl RandomAxiom {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }
}

impl<I, O: Serialize> Axiom<I, O> for RandomAxiom {
    fn preference(&self, _input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        let hash1 = fingerprint(output1)?;
        let hash2 = fingerprint(output2)?;
        let (low, high, direction) = match hash1.cmp(&hash2) {
            Ordering::Equal => return Ok(0.0),
            Ordering::Less => (hash1, hash2, 1.0),
            Ordering::Greater => (hash2, hash1, -1.0),
        };
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(low.as_bytes());
        hasher.update(b"|");
        hasher.update(high.as_bytes());
        let coin = hasher.finalize().as_bytes()[0] & 1;
        Ok(if coin == 1 { direction } else { -direction })
    }

    fn name(&self) -> String {
        format!("RANDOM({})", self.seed)
    }
}

/// One line of a ratings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingRecord {
    pub query_id: String,
    pub document_id: String,
    pub rating: f64,
}

/// Prefers the output with the higher judged rating for the input.
///
/// Abstains when either output is unrated.
#[derive(Debug, Clone, Default)]
pub struct OracleAxiom {
    ratings: HashMap<String, HashMap<String, f64>>,
}

impl OracleAxiom {
    pub fn new(records: impl IntoIterator<Item = RatingRecord>) -> Self {
        let mut oracle = Self::default();
        for record in records {
            oracle.insert(record);
        }
        oracle
    }

    /// Load ratings from a JSONL file of [`RatingRecord`]s.
    pub fn from_jsonl(path: impl AsRef<Path>) -> Result<Self, AxiomError> {
        let file = File::open(path.as_ref()).map_err(AxiomError::external)?;
        let mut oracle = Self::default();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(AxiomError::external)?;
            if line.trim().is_empty() {
                continue;
            }
            let record: RatingRecord =
                serde_json::from_str(&line).map_err(AxiomError::external)?;
            oracle.insert(record);
        }
        Ok(oracle)
    }

    pub fn insert(&mut self, record: RatingRecord) {
        self.ratings
            .entry(record.query_id)
            .or_default()
            .insert(record.document_id, record.rating);
    }

    pub fn rating(&self, query_id: &str, document_id: &str) -> Option<f64> {
        self.ratings.get(query_id)?.get(document_id).copied()
    }
}

impl<I: Identified, O: Identified> Axiom<I, O> for OracleAxiom {
    fn preference(&self, input: &I, output1: &O, output2: &O) -> Result<Preference, AxiomError> {
        let query_id = input.id();
        match (
            self.rating(query_id, output1.id()),
            self.rating(query_id, output2.id()),
        ) {
            (Some(r1), Some(r2)) => Ok(strictly_greater(r1, r2)),
            _ => Ok(0.0),
        }
    }

    fn name(&self) -> String {
        "ORACLE".to_string()
    }
}
