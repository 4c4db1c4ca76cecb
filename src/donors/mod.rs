use serde::{Deserialize, Serialize};
use log::{debug, info};
use crate::frequency::{Population, ProfileSampler};
use crate::hla::HlaProfile;
use crate::organs::OrganKind;
use crate::random::RandomSource;

pub const BLOOD_TYPES: [&str; 8] = ["A+", "A-", "B+", "B-", "AB+", "AB-", "O+", "O-"];

pub const LOCATIONS: [&str; 25] = [
    "New York, NY", "Los Angeles, CA", "Chicago, IL", "Houston, TX", "Phoenix, AZ",
    "Philadelphia, PA", "San Antonio, TX", "San Diego, CA", "Dallas, TX", "San Jose, CA",
    "Austin, TX", "Jacksonville, FL", "Fort Worth, TX", "Columbus, OH", "Charlotte, NC",
    "San Francisco, CA", "Indianapolis, IN", "Seattle, WA", "Denver, CO", "Washington, DC",
    "Boston, MA", "El Paso, TX", "Nashville, TN", "Detroit, MI", "Oklahoma City, OK",
];

/// Donor ages are drawn from `[MIN_DONOR_AGE, MAX_DONOR_AGE]`.
pub const MIN_DONOR_AGE: u32 = 18;
pub const MAX_DONOR_AGE: u32 = 64;

/// Size range of one regeneration cycle.
pub const REGENERATION_MIN: usize = 45;
pub const REGENERATION_MAX: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DonorType {
    Living,
    Deceased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganCondition {
    Excellent,
    Good,
    Fair,
}

impl DonorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonorType::Living => "living",
            DonorType::Deceased => "deceased",
        }
    }
}

impl OrganCondition {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganCondition::Excellent => "excellent",
            OrganCondition::Good => "good",
            OrganCondition::Fair => "fair",
        }
    }

    fn urgency_modifier(&self) -> i32 {
        match self {
            OrganCondition::Excellent => 10,
            OrganCondition::Good => 5,
            OrganCondition::Fair => -5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Donor {
    pub id: String,
    pub age: u32,
    pub blood_type: String,
    pub organ: OrganKind,
    pub location: String,
    pub hla: HlaProfile,
    pub medical_status: String,
    pub availability: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urgency_score: Option<u8>,
    pub donor_type: DonorType,
    pub organ_condition: OrganCondition,
    /// Hours; deceased donors only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preservation_time: Option<u32>,
}

fn base_urgency(organ: OrganKind) -> i32 {
    match organ {
        OrganKind::Heart => 95,
        OrganKind::Lung => 90,
        OrganKind::Liver => 85,
        OrganKind::Kidney | OrganKind::Pancreas => 70,
    }
}

/// Builds batches of synthetic donors. Donors are never mutated after
/// creation; each batch replaces the previous one wholesale.
pub struct DonorGenerator<'a, R: RandomSource> {
    sampler: &'a ProfileSampler,
    rng: &'a mut R,
}

impl<'a, R: RandomSource> DonorGenerator<'a, R> {
    pub fn new(sampler: &'a ProfileSampler, rng: &'a mut R) -> Self {
        Self { sampler, rng }
    }

    /// Number of donors in one periodic refresh.
    pub fn regeneration_count(&mut self) -> usize {
        self.rng.next_in_range(REGENERATION_MIN as i32, REGENERATION_MAX as i32) as usize
    }

    pub fn generate(&mut self, count: usize) -> Vec<Donor> {
        info!("Generating {} donors", count);
        let donors: Vec<Donor> = (1..=count)
            .map(|i| {
                let hla = self.sampler.generate_sync(&mut *self.rng);
                self.random_donor(format!("D{:04}", i), hla)
            })
            .collect();
        debug!("Generated donors {:?}..", donors.iter().take(3).map(|d| &d.id).collect::<Vec<_>>());
        donors
    }

    /// Donors whose loci copy the recipient's allele with probability 0.7.
    pub fn generate_high_compatibility(&mut self, recipient: &HlaProfile, count: usize) -> Vec<Donor> {
        info!("Generating {} high compatibility donors for {}", count, recipient);
        (1..=count)
            .map(|i| {
                let base = self.sampler.generate_sync(&mut *self.rng);
                let mut pick = |own: &str, sampled: String| {
                    if self.rng.chance(0.7) { own.to_string() } else { sampled }
                };
                let hla = HlaProfile {
                    hla_a: pick(&recipient.hla_a, base.hla_a),
                    hla_b: pick(&recipient.hla_b, base.hla_b),
                    hla_dr: pick(&recipient.hla_dr, base.hla_dr),
                };

                Donor {
                    id: format!("HC{:03}", i),
                    age: self.rng.next_in_range(25, 54) as u32,
                    blood_type: self.rng.pick(&BLOOD_TYPES).to_string(),
                    organ: *self.rng.pick(&OrganKind::ALL),
                    location: self.rng.pick(&LOCATIONS).to_string(),
                    hla,
                    medical_status: "Excellent".to_string(),
                    availability: "Available".to_string(),
                    urgency_score: None,
                    donor_type: DonorType::Living,
                    organ_condition: OrganCondition::Excellent,
                    preservation_time: None,
                }
            })
            .collect()
    }

    pub fn generate_population_specific(&mut self, population: Population, count: usize) -> Vec<Donor> {
        info!("Generating {} {} donors", count, population);
        let prefix = population.as_str()[..2].to_uppercase();
        (1..=count)
            .map(|i| {
                let hla = self.sampler.generate_population_specific(population, &mut *self.rng);
                self.random_donor(format!("{}{:03}", prefix, i), hla)
            })
            .collect()
    }

    fn random_donor(&mut self, id: String, hla: HlaProfile) -> Donor {
        let rng = &mut *self.rng;

        let availability = if rng.next_f64() > 0.8 {
            rng.pick(&["Pending", "Reserved"]).to_string()
        } else {
            "Available".to_string()
        };
        let medical_status = if rng.next_f64() > 0.9 {
            "Fair".to_string()
        } else {
            rng.pick(&["Excellent", "Good", "Stable"]).to_string()
        };
        let organ = *rng.pick(&OrganKind::ALL);
        let donor_type = if organ == OrganKind::Kidney && rng.next_f64() > 0.7 {
            DonorType::Living
        } else {
            DonorType::Deceased
        };
        let organ_condition = if rng.next_f64() > 0.8 {
            OrganCondition::Fair
        } else if rng.next_f64() > 0.5 {
            OrganCondition::Good
        } else {
            OrganCondition::Excellent
        };

        let urgency = base_urgency(organ)
            + organ_condition.urgency_modifier()
            + rng.next_in_range(-5, 4);

        Donor {
            id,
            age: rng.next_in_range(MIN_DONOR_AGE as i32, MAX_DONOR_AGE as i32) as u32,
            blood_type: rng.pick(&BLOOD_TYPES).to_string(),
            organ,
            location: rng.pick(&LOCATIONS).to_string(),
            hla,
            medical_status,
            availability,
            urgency_score: Some(urgency.clamp(0, 100) as u8),
            donor_type,
            organ_condition,
            preservation_time: match donor_type {
                DonorType::Deceased => Some(rng.next_in_range(1, 12) as u32),
                DonorType::Living => None,
            },
        }
    }
}
