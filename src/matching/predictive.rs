use serde::{Deserialize, Serialize};
use crate::organs::OrganKind;

pub const MIN_SUCCESS_PROBABILITY: i32 = 20;
pub const MAX_SUCCESS_PROBABILITY: i32 = 95;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictiveScore {
    pub success_probability: u8,
    pub risk_factors: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Outcome estimate from compatibility, ages and organ.
///
/// Adjustments are additive; the clamp to
/// [`MIN_SUCCESS_PROBABILITY`, `MAX_SUCCESS_PROBABILITY`] happens once at the end.
pub fn calculate_predictive_score(
    compatibility: u8,
    donor_age: u32,
    recipient_age: u32,
    organ: &str,
) -> PredictiveScore {
    let mut probability = compatibility as i32;
    let mut risk_factors = Vec::new();
    let mut recommendations = Vec::new();

    if donor_age.abs_diff(recipient_age) > 20 {
        probability -= 5;
        risk_factors.push("Significant age difference".to_string());
        recommendations.push("Consider age-related complications".to_string());
    }

    if donor_age > 60 {
        probability -= 8;
        risk_factors.push("Older donor".to_string());
        recommendations.push("Enhanced monitoring post-transplant".to_string());
    }

    if recipient_age > 65 {
        probability -= 5;
        risk_factors.push("Older recipient".to_string());
        recommendations.push("Comprehensive pre-transplant evaluation".to_string());
    }

    match OrganKind::from_key(organ) {
        Some(OrganKind::Heart) if compatibility < 80 => {
            probability -= 10;
            risk_factors.push("Suboptimal HLA matching for cardiac transplant".to_string());
        },
        Some(OrganKind::Lung) if compatibility < 75 => {
            probability -= 8;
            risk_factors.push("HLA mismatch increases rejection risk".to_string());
        },
        Some(OrganKind::Liver) => {
            probability += 5;
        },
        _ => {}
    }

    PredictiveScore {
        success_probability: probability.clamp(MIN_SUCCESS_PROBABILITY, MAX_SUCCESS_PROBABILITY) as u8,
        risk_factors,
        recommendations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_adjustments() {
        let score = calculate_predictive_score(80, 40, 45, "kidney");
        assert_eq!(score.success_probability, 80);
        assert!(score.risk_factors.is_empty());
        assert!(score.recommendations.is_empty());
    }

    #[test]
    fn test_age_penalties_accumulate() {
        // Gap 22, older donor (-5, -8).
        let score = calculate_predictive_score(90, 62, 40, "kidney");
        assert_eq!(score.success_probability, 77);
        assert_eq!(score.risk_factors, vec!["Significant age difference", "Older donor"]);
        assert_eq!(score.recommendations.len(), 2);

        let score = calculate_predictive_score(90, 50, 70, "pancreas");
        assert_eq!(score.success_probability, 85);
        assert_eq!(score.risk_factors, vec!["Older recipient"]);
    }

    #[test]
    fn test_organ_rules() {
        assert_eq!(calculate_predictive_score(79, 40, 40, "Heart").success_probability, 69);
        assert_eq!(calculate_predictive_score(80, 40, 40, "heart").success_probability, 80);
        assert_eq!(calculate_predictive_score(74, 40, 40, "lung").success_probability, 66);
        assert_eq!(calculate_predictive_score(75, 40, 40, "lung").success_probability, 75);
        assert_eq!(calculate_predictive_score(60, 40, 40, "liver").success_probability, 65);
    }

    #[test]
    fn test_probability_is_clamped() {
        assert_eq!(calculate_predictive_score(100, 40, 40, "liver").success_probability, 95);

        let worst = calculate_predictive_score(10, 64, 20, "heart");
        assert_eq!(worst.success_probability, 20);
        assert_eq!(worst.risk_factors.len(), 3);
    }
}
