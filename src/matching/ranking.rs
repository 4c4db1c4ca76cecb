use serde::{Deserialize, Serialize};
use log::{debug, info};
use super::calculate_compatibility;
use crate::donors::Donor;
use crate::hla::HlaProfile;
use crate::random::RandomSource;

pub const DEFAULT_MATCH_LIMIT: usize = 15;
pub const DEFAULT_URGENCY_WEIGHT: f64 = 0.1;

pub const HIGH_COMPATIBILITY: u8 = 80;
pub const MEDIUM_COMPATIBILITY: u8 = 60;

/// A donor scored against one recipient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    #[serde(flatten)]
    pub donor: Donor,
    pub compatibility: u8,
}

impl MatchResult {
    /// Ranking key: compatibility plus weighted urgency (missing urgency is 0).
    pub fn ranking_score(&self, urgency_weight: f64) -> f64 {
        self.compatibility as f64 + self.donor.urgency_score.unwrap_or(0) as f64 * urgency_weight
    }
}

#[derive(Debug, Clone)]
pub struct RankingOptions<'a> {
    /// Organ key to keep; `None` or `"all"` keeps every donor.
    pub organ_filter: Option<&'a str>,
    pub limit: usize,
    pub urgency_weight: f64,
}

impl Default for RankingOptions<'_> {
    fn default() -> Self {
        Self {
            organ_filter: None,
            limit: DEFAULT_MATCH_LIMIT,
            urgency_weight: DEFAULT_URGENCY_WEIGHT,
        }
    }
}

/// Scores every donor against `recipient` using the donor's own organ and
/// returns the best matches, highest ranking score first.
pub fn rank_matches<R: RandomSource>(
    recipient: &HlaProfile,
    donors: &[Donor],
    options: &RankingOptions<'_>,
    rng: &mut R,
) -> Vec<MatchResult> {
    let filter = options.organ_filter
        .map(str::trim)
        .filter(|key| !key.is_empty() && !key.eq_ignore_ascii_case("all"));

    let mut matches: Vec<MatchResult> = donors.iter()
        .filter(|donor| filter.map_or(true, |key| donor.organ.info().id.eq_ignore_ascii_case(key)))
        .map(|donor| {
            let compatibility = calculate_compatibility(recipient, &donor.hla, Some(donor.organ.info().id), &mut *rng);
            debug!("Donor {} scored {}", donor.id, compatibility);
            MatchResult {
                donor: donor.clone(),
                compatibility,
            }
        })
        .collect();

    matches.sort_by(|a, b| {
        b.ranking_score(options.urgency_weight)
            .total_cmp(&a.ranking_score(options.urgency_weight))
    });
    matches.truncate(options.limit);

    info!("Ranked {} matches (of {} donors)", matches.len(), donors.len());
    matches
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub n_matches: usize,
    pub high: usize,
    pub medium: usize,
    pub low: usize,
    pub mean_compatibility: f64,
    pub best_compatibility: Option<u8>,
}

impl MatchSummary {
    pub fn from_matches(matches: &[MatchResult]) -> Self {
        let count = |range: std::ops::RangeInclusive<u8>| {
            matches.iter().filter(|m| range.contains(&m.compatibility)).count()
        };

        let mean_compatibility = if matches.is_empty() {
            0.0
        } else {
            matches.iter().map(|m| m.compatibility as f64).sum::<f64>() / matches.len() as f64
        };

        Self {
            n_matches: matches.len(),
            high: count(HIGH_COMPATIBILITY..=100),
            medium: count(MEDIUM_COMPATIBILITY..=HIGH_COMPATIBILITY - 1),
            low: count(0..=MEDIUM_COMPATIBILITY - 1),
            mean_compatibility,
            best_compatibility: matches.iter().map(|m| m.compatibility).max(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::donors::{DonorType, OrganCondition};
    use crate::organs::OrganKind;
    use crate::random::make_rng;
    use approx::assert_relative_eq;

    fn donor(id: &str, organ: OrganKind, hla: HlaProfile, urgency: Option<u8>) -> Donor {
        Donor {
            id: id.to_string(),
            age: 40,
            blood_type: "O+".to_string(),
            organ,
            location: "Boston, MA".to_string(),
            hla,
            medical_status: "Good".to_string(),
            availability: "Available".to_string(),
            urgency_score: urgency,
            donor_type: DonorType::Deceased,
            organ_condition: OrganCondition::Good,
            preservation_time: Some(6),
        }
    }

    fn recipient() -> HlaProfile {
        HlaProfile::new("A*02:01", "B*35:01", "DRB1*04:01")
    }

    #[test]
    fn test_matches_sorted_by_ranking_score() {
        let donors = vec![
            donor("low", OrganKind::Pancreas, HlaProfile::new("A*01:01", "B*08:01", "DRB1*07:01"), Some(90)),
            donor("best", OrganKind::Pancreas, recipient(), None),
            // Scores 65 like "mid"; urgency puts it ahead.
            donor("urgent", OrganKind::Pancreas, HlaProfile::new("A*02:01", "B*35:01", "DRB1*07:01"), Some(90)),
            donor("mid", OrganKind::Pancreas, HlaProfile::new("A*02:01", "B*07:02", "DRB1*04:01"), None),
        ];
        let mut rng = make_rng(Some(1));
        let ranked = rank_matches(&recipient(), &donors, &RankingOptions::default(), &mut rng);

        let ids: Vec<_> = ranked.iter().map(|m| m.donor.id.as_str()).collect();
        assert_eq!(ids, vec!["best", "urgent", "mid", "low"]);
        assert_eq!(ranked[0].compatibility, 100);
        assert_eq!(ranked[1].compatibility, 65);
        assert_eq!(ranked[2].compatibility, 65);
    }

    #[test]
    fn test_organ_filter_and_limit() {
        let donors: Vec<Donor> = (0..20)
            .map(|i| {
                let organ = if i % 2 == 0 { OrganKind::Kidney } else { OrganKind::Heart };
                donor(&format!("D{:04}", i), organ, recipient(), Some(i as u8))
            })
            .collect();
        let mut rng = make_rng(Some(1));

        let options = RankingOptions { organ_filter: Some("KIDNEY"), limit: 3, ..Default::default() };
        let ranked = rank_matches(&recipient(), &donors, &options, &mut rng);
        assert_eq!(ranked.len(), 3);
        assert!(ranked.iter().all(|m| m.donor.organ == OrganKind::Kidney));
        // Equal compatibility, so urgency decides.
        assert_eq!(ranked[0].donor.id, "D0018");

        let options = RankingOptions { organ_filter: Some("all"), ..Default::default() };
        assert_eq!(rank_matches(&recipient(), &donors, &options, &mut rng).len(), DEFAULT_MATCH_LIMIT);
    }

    #[test]
    fn test_summary_buckets() {
        let make = |c: u8| MatchResult {
            donor: donor("x", OrganKind::Liver, recipient(), None),
            compatibility: c,
        };
        let matches = vec![make(95), make(80), make(79), make(60), make(59), make(10)];
        let summary = MatchSummary::from_matches(&matches);

        assert_eq!(summary.high, 2);
        assert_eq!(summary.medium, 2);
        assert_eq!(summary.low, 2);
        assert_eq!(summary.best_compatibility, Some(95));
        assert_relative_eq!(summary.mean_compatibility, 383.0 / 6.0);

        let empty = MatchSummary::from_matches(&[]);
        assert_eq!(empty.n_matches, 0);
        assert_eq!(empty.best_compatibility, None);
    }

    #[test]
    fn test_match_result_flattens_donor() {
        let result = MatchResult { donor: donor("D0001", OrganKind::Lung, recipient(), Some(80)), compatibility: 77 };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["id"], "D0001");
        assert_eq!(json["compatibility"], 77);
        assert_eq!(json["urgencyScore"], 80);
    }
}
