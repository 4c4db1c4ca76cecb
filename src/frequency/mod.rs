pub mod embedded;
pub mod tsv;
pub mod source;
pub mod cache;
pub mod sampler;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::HlaError;
use crate::random::RandomSource;

pub use cache::*;
pub use sampler::*;
pub use source::*;

/// Returned when a draw is made from a table with no positive weight.
pub const UNKNOWN_ALLELE: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlleleFrequency {
    pub allele: String,
    /// Relative weight; tables need not sum to 1.
    pub frequency: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub population: Option<String>,
}

impl AlleleFrequency {
    pub fn new(allele: impl Into<String>, frequency: f64) -> Self {
        Self {
            allele: allele.into(),
            frequency,
            population: None,
        }
    }
}

/// Weighted alleles for one locus, in a fixed draw order.
pub type FrequencyTable = Vec<AlleleFrequency>;

/// Draws an allele with probability proportional to its frequency.
///
/// Entries are walked in table order and only positive, finite weights
/// take part. A table without any yields [`UNKNOWN_ALLELE`]; if rounding
/// leaves the walk without a pick, the first eligible entry is returned.
pub fn select_weighted_allele<R: RandomSource>(table: &[AlleleFrequency], rng: &mut R) -> String {
    let eligible: Vec<&AlleleFrequency> = table.iter()
        .filter(|entry| entry.frequency > 0.0 && entry.frequency.is_finite())
        .collect();

    let total_weight: f64 = eligible.iter().map(|entry| entry.frequency).sum();
    if eligible.is_empty() {
        return UNKNOWN_ALLELE.to_string();
    }

    let mut remaining = rng.next_f64() * total_weight;
    for entry in &eligible {
        remaining -= entry.frequency;
        if remaining <= 0.0 {
            return entry.allele.clone();
        }
    }

    eligible[0].allele.clone()
}

/// Population tags accepted by population-specific sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Population {
    Caucasian,
    African,
    Asian,
    Hispanic,
}

impl Population {
    pub const ALL: [Population; 4] = [
        Population::Caucasian, Population::African,
        Population::Asian, Population::Hispanic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Population::Caucasian => "caucasian",
            Population::African => "african",
            Population::Asian => "asian",
            Population::Hispanic => "hispanic",
        }
    }

    pub fn multiplier(&self) -> f64 {
        match self {
            Population::Caucasian => 1.0,
            Population::African => 0.8,
            Population::Asian => 0.6,
            Population::Hispanic => 0.7,
        }
    }

    /// Re-weights a table for this population.
    ///
    /// Every entry is scaled by the population multiplier and a fresh factor
    /// in `[0.5, 1.5)`, so the shape of the distribution changes per call.
    pub fn reweight<R: RandomSource>(&self, table: &[AlleleFrequency], rng: &mut R) -> FrequencyTable {
        table.iter()
            .map(|entry| AlleleFrequency {
                frequency: entry.frequency * self.multiplier() * (0.5 + rng.next_f64()),
                ..entry.clone()
            })
            .collect()
    }
}

impl fmt::Display for Population {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Population {
    type Err = HlaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Population::ALL.iter()
            .copied()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| HlaError::InvalidConfig(format!("Unknown population: {}", s)))
    }
}

/// Population-specific weighted draw.
pub fn select_population_specific_allele<R: RandomSource>(
    table: &[AlleleFrequency],
    population: Population,
    rng: &mut R,
) -> String {
    let reweighted = population.reweight(table, rng);
    select_weighted_allele(&reweighted, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{make_rng, SequenceSource};
    use approx::assert_relative_eq;

    fn table(entries: &[(&str, f64)]) -> FrequencyTable {
        entries.iter().map(|&(a, f)| AlleleFrequency::new(a, f)).collect()
    }

    #[test]
    fn test_empty_table_returns_unknown() {
        let mut rng = make_rng(Some(1));
        assert_eq!(select_weighted_allele(&[], &mut rng), UNKNOWN_ALLELE);
    }

    #[test]
    fn test_weighted_ratio_converges() {
        let t = table(&[("A*02:01", 0.9), ("A*01:01", 0.1)]);
        let mut rng = make_rng(Some(42));
        let draws = 10_000;
        let first = (0..draws)
            .filter(|_| select_weighted_allele(&t, &mut rng) == "A*02:01")
            .count();
        assert_relative_eq!(first as f64 / draws as f64, 0.9, epsilon = 0.015);
    }

    #[test]
    fn test_walk_follows_table_order() {
        let t = table(&[("x", 1.0), ("y", 2.0), ("z", 1.0)]);
        // r = 0.1 * 4 = 0.4 -> x; r = 0.5 * 4 = 2.0 -> y; r = 0.9 * 4 = 3.6 -> z.
        let mut source = SequenceSource::new(vec![0.1, 0.5, 0.9]);
        assert_eq!(select_weighted_allele(&t, &mut source), "x");
        assert_eq!(select_weighted_allele(&t, &mut source), "y");
        assert_eq!(select_weighted_allele(&t, &mut source), "z");
    }

    #[test]
    fn test_zero_weight_entries_are_skipped() {
        let t = table(&[("never", 0.0), ("always", 0.3)]);
        let mut source = SequenceSource::constant(0.0);
        assert_eq!(select_weighted_allele(&t, &mut source), "always");

        let mut rng = make_rng(Some(5));
        for _ in 0..500 {
            assert_eq!(select_weighted_allele(&t, &mut rng), "always");
        }
    }

    #[test]
    fn test_table_without_positive_weights_returns_unknown() {
        let mut rng = make_rng(Some(3));
        let zeros = table(&[("A*01:01", 0.0), ("A*02:01", 0.0)]);
        assert_eq!(select_weighted_allele(&zeros, &mut rng), UNKNOWN_ALLELE);

        let invalid = table(&[("A*01:01", -0.4), ("A*02:01", f64::NAN), ("A*03:01", f64::INFINITY)]);
        assert_eq!(select_weighted_allele(&invalid, &mut rng), UNKNOWN_ALLELE);
    }

    #[test]
    fn test_rounding_fallback_stays_eligible() {
        // A draw just above 1.0 walks past the last entry.
        let t = table(&[("never", 0.0), ("first", 0.1), ("second", 0.2)]);
        let mut source = SequenceSource::constant(1.0 + 1e-9);
        assert_eq!(select_weighted_allele(&t, &mut source), "first");
    }

    #[test]
    fn test_every_positive_entry_can_be_drawn() {
        let t = table(&[("a", 0.5), ("b", 0.01), ("c", 0.49)]);
        let mut rng = make_rng(Some(9));
        let mut seen = std::collections::HashSet::new();
        for _ in 0..20_000 {
            seen.insert(select_weighted_allele(&t, &mut rng));
        }
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_population_reweighting() {
        let t = table(&[("a", 1.0), ("b", 1.0)]);
        let mut source = SequenceSource::new(vec![0.0, 0.5]);
        let reweighted = Population::African.reweight(&t, &mut source);
        assert_relative_eq!(reweighted[0].frequency, 0.4);
        assert_relative_eq!(reweighted[1].frequency, 0.8);
        assert_eq!(reweighted[0].allele, "a");

        let mut rng = make_rng(Some(2));
        for population in Population::ALL {
            let allele = select_population_specific_allele(&t, population, &mut rng);
            assert!(allele == "a" || allele == "b");
        }
    }

    #[test]
    fn test_population_parsing() {
        assert_eq!("Asian".parse::<Population>().unwrap(), Population::Asian);
        assert!("martian".parse::<Population>().is_err());
    }
}
