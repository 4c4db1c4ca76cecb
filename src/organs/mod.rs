use serde::{Deserialize, Serialize};
use std::fmt;
use crate::hla::HlaProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrganKind {
    Kidney,
    Liver,
    Heart,
    Lung,
    Pancreas,
}

/// Static reference data for one transplantable organ.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganType {
    pub id: &'static str,
    pub display_name: &'static str,
    pub icon: &'static str,
    pub description: &'static str,
    pub urgency_weight: f64,
    pub compatibility_threshold: u8,
    pub average_wait_time: &'static str,
    pub risk_factors: &'static [&'static str],
    pub specific_requirements: &'static [&'static str],
}

static KIDNEY: OrganType = OrganType {
    id: "kidney",
    display_name: "Kidney",
    icon: "kidney",
    description: "Most common organ transplant with highest success rates",
    urgency_weight: 0.7,
    compatibility_threshold: 60,
    average_wait_time: "3-5 years",
    risk_factors: &["Diabetes", "Hypertension", "Age over 65"],
    specific_requirements: &["ABO compatibility", "Crossmatch negative", "Size matching"],
};

static LIVER: OrganType = OrganType {
    id: "liver",
    display_name: "Liver",
    icon: "liver",
    description: "Life-saving transplant with regenerative capabilities",
    urgency_weight: 0.9,
    compatibility_threshold: 50,
    average_wait_time: "6-12 months",
    risk_factors: &["Hepatitis", "Cirrhosis", "Alcohol dependency"],
    specific_requirements: &["Size matching critical", "Blood type compatibility", "MELD score priority"],
};

static HEART: OrganType = OrganType {
    id: "heart",
    display_name: "Heart",
    icon: "heart",
    description: "Critical transplant requiring precise timing and matching",
    urgency_weight: 1.0,
    compatibility_threshold: 70,
    average_wait_time: "6 months",
    risk_factors: &["Cardiomyopathy", "Coronary artery disease", "Previous cardiac surgery"],
    specific_requirements: &["Size matching essential", "Geographic proximity", "Ischemic time <4 hours"],
};

static LUNG: OrganType = OrganType {
    id: "lung",
    display_name: "Lung",
    icon: "lungs",
    description: "Complex transplant with strict compatibility requirements",
    urgency_weight: 0.95,
    compatibility_threshold: 75,
    average_wait_time: "4-6 months",
    risk_factors: &["COPD", "Pulmonary fibrosis", "Cystic fibrosis"],
    specific_requirements: &["Size matching critical", "CMV status", "Smoking history consideration"],
};

static PANCREAS: OrganType = OrganType {
    id: "pancreas",
    display_name: "Pancreas",
    icon: "pancreas",
    description: "Specialized transplant often combined with kidney",
    urgency_weight: 0.8,
    compatibility_threshold: 65,
    average_wait_time: "1-2 years",
    risk_factors: &["Type 1 diabetes", "Diabetic complications", "Previous transplants"],
    specific_requirements: &["HLA matching important", "Age considerations", "Simultaneous kidney evaluation"],
};

impl OrganKind {
    pub const ALL: [OrganKind; 5] = [
        OrganKind::Kidney, OrganKind::Liver, OrganKind::Heart,
        OrganKind::Lung, OrganKind::Pancreas,
    ];

    /// Case-insensitive lookup by catalog key (`"kidney"`, `"Heart"`, ...).
    pub fn from_key(key: &str) -> Option<Self> {
        let key = key.trim();
        OrganKind::ALL.iter()
            .copied()
            .find(|organ| organ.info().id.eq_ignore_ascii_case(key))
    }

    pub fn info(&self) -> &'static OrganType {
        match self {
            OrganKind::Kidney => &KIDNEY,
            OrganKind::Liver => &LIVER,
            OrganKind::Heart => &HEART,
            OrganKind::Lung => &LUNG,
            OrganKind::Pancreas => &PANCREAS,
        }
    }

    pub fn meets_threshold(&self, compatibility: u8) -> bool {
        compatibility >= self.info().compatibility_threshold
    }
}

impl fmt::Display for OrganKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.info().display_name)
    }
}

pub fn organ_type(key: &str) -> Option<&'static OrganType> {
    OrganKind::from_key(key).map(|organ| organ.info())
}

/// Adjusts a base HLA score for the immunological tolerance of an organ.
///
/// Heart and lung penalize weak matches, liver boosts them, kidney rewards
/// an exact DRB1 match. Unknown organ keys pass the base score through.
pub fn calculate_organ_specific_compatibility(
    recipient: &HlaProfile,
    donor: &HlaProfile,
    organ_key: &str,
    base_score: u8,
) -> u8 {
    let Some(organ) = OrganKind::from_key(organ_key) else {
        return base_score;
    };

    let base = base_score as f64;
    let adjusted = match organ {
        OrganKind::Heart | OrganKind::Lung if base < 70.0 => base * 0.8,
        OrganKind::Liver if base < 60.0 => base * 1.2,
        OrganKind::Kidney if recipient.hla_dr == donor.hla_dr => (base + 5.0).min(100.0),
        _ => base,
    };

    adjusted.max(0.0).min(100.0).round() as u8
}
