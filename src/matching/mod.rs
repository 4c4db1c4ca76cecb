pub mod predictive;
pub mod ranking;

use serde::{Deserialize, Serialize};
use std::fmt;
use crate::hla::{HlaProfile, Locus};
use crate::organs::calculate_organ_specific_compatibility;
use crate::random::RandomSource;

pub use predictive::*;
pub use ranking::*;

/// Points available per scored locus. Sums to `TOTAL_WEIGHT`.
pub const LOCUS_WEIGHTS: [(Locus, u32); 3] = [
    (Locus::A, 30),
    (Locus::B, 35),
    (Locus::Drb1, 35),
];

pub const TOTAL_WEIGHT: u32 = 100;

/// Maximum absolute jitter applied when no organ is given.
pub const JITTER: i32 = 5;

/// Allele pairs treated as cross-reactive. Membership is symmetric.
const CROSS_REACTIVE_PAIRS: &[(&str, &str)] = &[
    // HLA-A
    ("A*01:01", "A*36:01"),
    ("A*02:01", "A*02:02"),
    ("A*02:01", "A*02:03"),
    ("A*02:02", "A*02:03"),
    ("A*03:01", "A*11:01"),
    ("A*23:01", "A*24:02"),
    // HLA-B
    ("B*07:02", "B*42:01"),
    ("B*13:02", "B*44:03"),
    ("B*27:05", "B*27:02"),
    ("B*35:01", "B*53:01"),
    // HLA-DRB1
    ("DRB1*01:01", "DRB1*10:01"),
    ("DRB1*03:01", "DRB1*11:01"),
    ("DRB1*04:01", "DRB1*04:02"),
    ("DRB1*15:01", "DRB1*16:01"),
];

pub fn is_cross_reactive(first: &str, second: &str) -> bool {
    CROSS_REACTIVE_PAIRS.iter()
        .any(|&(x, y)| (x == first && y == second) || (x == second && y == first))
}

/// Same allele group (the part before `:`) but a different allele.
pub fn is_partial_match(first: &str, second: &str) -> bool {
    let group = |allele: &str| allele.split(':').next().unwrap_or_default().to_string();
    first != second && group(first) == group(second)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MatchTier {
    #[serde(rename = "Perfect")]
    Exact,
    #[serde(rename = "Partial")]
    Partial,
    #[serde(rename = "Cross-Reactive")]
    CrossReactive,
    #[serde(rename = "Mismatch")]
    Mismatch,
}

impl MatchTier {
    /// Highest tier that applies; exact > partial > cross-reactive.
    pub fn classify(recipient: &str, donor: &str) -> Self {
        if recipient == donor {
            MatchTier::Exact
        } else if is_partial_match(recipient, donor) {
            MatchTier::Partial
        } else if is_cross_reactive(recipient, donor) {
            MatchTier::CrossReactive
        } else {
            MatchTier::Mismatch
        }
    }

    /// Share of the locus weight awarded, in percent.
    pub fn percent(&self) -> u32 {
        match self {
            MatchTier::Exact => 100,
            MatchTier::Partial => 60,
            MatchTier::CrossReactive => 30,
            MatchTier::Mismatch => 0,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MatchTier::Exact => "Perfect",
            MatchTier::Partial => "Partial",
            MatchTier::CrossReactive => "Cross-Reactive",
            MatchTier::Mismatch => "Mismatch",
        }
    }
}

impl fmt::Display for MatchTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn locus_alleles<'a>(recipient: &'a HlaProfile, donor: &'a HlaProfile, locus: Locus) -> (&'a str, &'a str) {
    (
        recipient.allele(locus).unwrap_or_default(),
        donor.allele(locus).unwrap_or_default(),
    )
}

/// Weighted HLA score in [0, 100] before any organ or random adjustment.
pub fn base_score(recipient: &HlaProfile, donor: &HlaProfile) -> u8 {
    // Points are kept in hundredths so 35 * 30% stays exact.
    let awarded: u32 = LOCUS_WEIGHTS.iter()
        .map(|&(locus, weight)| {
            let (r, d) = locus_alleles(recipient, donor, locus);
            weight * MatchTier::classify(r, d).percent()
        })
        .sum();

    let scaled = awarded * 100 / TOTAL_WEIGHT;
    ((scaled + 50) / 100) as u8
}

/// Compatibility percentage between a recipient and a donor.
///
/// With a non-empty organ key the organ-specific adjustment is applied and
/// the result is deterministic; unknown keys keep the base score. With no key
/// or an empty one, a uniform integer jitter in
/// `[-JITTER, JITTER]` is drawn from `rng`.
pub fn calculate_compatibility<R: RandomSource>(
    recipient: &HlaProfile,
    donor: &HlaProfile,
    organ: Option<&str>,
    rng: &mut R,
) -> u8 {
    let base = base_score(recipient, donor);

    match organ.filter(|key| !key.is_empty()) {
        Some(key) => calculate_organ_specific_compatibility(recipient, donor, key, base),
        None => {
            let variation = rng.next_in_range(-JITTER, JITTER);
            (base as i32 + variation).clamp(0, 100) as u8
        },
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocusDetail {
    pub recipient: String,
    pub donor: String,
    #[serde(rename = "match")]
    pub tier: MatchTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityDetails {
    #[serde(rename = "hlaA")]
    pub hla_a: LocusDetail,
    #[serde(rename = "hlaB")]
    pub hla_b: LocusDetail,
    #[serde(rename = "hlaDR")]
    pub hla_dr: LocusDetail,
}

impl CompatibilityDetails {
    pub fn loci(&self) -> [(Locus, &LocusDetail); 3] {
        [
            (Locus::A, &self.hla_a),
            (Locus::B, &self.hla_b),
            (Locus::Drb1, &self.hla_dr),
        ]
    }
}

/// Per-locus tier labels, consistent with `base_score`.
pub fn get_compatibility_details(recipient: &HlaProfile, donor: &HlaProfile) -> CompatibilityDetails {
    let detail = |locus: Locus| {
        let (r, d) = locus_alleles(recipient, donor, locus);
        LocusDetail {
            recipient: r.to_string(),
            donor: d.to_string(),
            tier: MatchTier::classify(r, d),
        }
    };

    CompatibilityDetails {
        hla_a: detail(Locus::A),
        hla_b: detail(Locus::B),
        hla_dr: detail(Locus::Drb1),
    }
}
