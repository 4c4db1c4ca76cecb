use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use crate::error::HlaError;

/// HLA loci present in the population frequency dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Locus {
    A,
    B,
    C,
    Dpa1,
    Dpb1,
    Dqa1,
    Dqb1,
    Drb1,
}

impl Locus {
    pub const ALL: [Locus; 8] = [
        Locus::A, Locus::B, Locus::C, Locus::Dpa1,
        Locus::Dpb1, Locus::Dqa1, Locus::Dqb1, Locus::Drb1,
    ];

    /// Loci that take part in compatibility scoring.
    pub const SCORED: [Locus; 3] = [Locus::A, Locus::B, Locus::Drb1];

    pub fn as_str(&self) -> &'static str {
        match self {
            Locus::A => "A",
            Locus::B => "B",
            Locus::C => "C",
            Locus::Dpa1 => "DPA1",
            Locus::Dpb1 => "DPB1",
            Locus::Dqa1 => "DQA1",
            Locus::Dqb1 => "DQB1",
            Locus::Drb1 => "DRB1",
        }
    }
}

impl fmt::Display for Locus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locus {
    type Err = HlaError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Locus::ALL.iter()
            .copied()
            .find(|locus| locus.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| HlaError::InvalidProfile(format!("Unknown HLA locus: {}", s)))
    }
}

/// One allele per scored locus. An empty string marks a locus that has not
/// been entered yet (recipients only).
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HlaProfile {
    #[serde(rename = "hlaA")]
    pub hla_a: String,
    #[serde(rename = "hlaB")]
    pub hla_b: String,
    #[serde(rename = "hlaDR")]
    pub hla_dr: String,
}

impl HlaProfile {
    pub fn new(hla_a: impl Into<String>, hla_b: impl Into<String>, hla_dr: impl Into<String>) -> Self {
        Self {
            hla_a: hla_a.into(),
            hla_b: hla_b.into(),
            hla_dr: hla_dr.into(),
        }
    }

    /// Allele at a scored locus; `None` for loci the profile does not track.
    pub fn allele(&self, locus: Locus) -> Option<&str> {
        match locus {
            Locus::A => Some(&self.hla_a),
            Locus::B => Some(&self.hla_b),
            Locus::Drb1 => Some(&self.hla_dr),
            _ => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        !self.hla_a.is_empty() && !self.hla_b.is_empty() && !self.hla_dr.is_empty()
    }

    /// Checks that every locus is populated with a `<prefix>*NN:NN` allele.
    pub fn validate(&self) -> Result<(), HlaError> {
        if !self.is_complete() {
            return Err(HlaError::InvalidProfile(
                "All three loci (A, B, DRB1) must be entered".to_string()
            ));
        }

        for locus in Locus::SCORED {
            let allele = self.allele(locus).unwrap_or_default();
            if !is_well_formed(allele, locus) {
                return Err(HlaError::InvalidProfile(
                    format!("Allele {:?} is not a valid {}*NN:NN designation", allele, locus)
                ));
            }
        }

        Ok(())
    }
}

impl fmt::Display for HlaProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, {}, {}", self.hla_a, self.hla_b, self.hla_dr)
    }
}

impl FromStr for HlaProfile {
    type Err = HlaError;

    /// Parses `A*02:01,B*35:01,DRB1*04:01`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        match parts.as_slice() {
            [a, b, dr] => Ok(HlaProfile::new(*a, *b, *dr)),
            _ => Err(HlaError::InvalidProfile(
                format!("Expected three comma-separated alleles, got {:?}", s)
            )),
        }
    }
}

/// `<LOCUS>*NN:NN`, where NN are ASCII digits.
pub fn is_well_formed(allele: &str, locus: Locus) -> bool {
    let Some((prefix, fields)) = allele.split_once('*') else {
        return false;
    };
    if prefix != locus.as_str() {
        return false;
    }

    let mut parts = fields.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(group), Some(protein), None) => {
            is_two_digits(group) && is_two_digits(protein)
        },
        _ => false,
    }
}

fn is_two_digits(field: &str) -> bool {
    field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit())
}

/// Rewrites a raw dataset designation into canonical `<LOCUS>*NN:NN` form.
///
/// Accepts `HLA-A*02:01`, `A*02:01:01:02`, `A0201`, `02:01` and the like.
/// Designations beyond two fields are truncated. Returns `None` for names
/// with no fields, or compact names that do not start with a numeric group.
pub fn normalize_allele(raw: &str, locus: Locus) -> Option<String> {
    let trimmed = raw.trim();

    let fields = match trimmed.rsplit_once('*') {
        Some((_, fields)) => fields,
        None => strip_locus_prefix(trimmed, locus),
    };
    if fields.is_empty() {
        return None;
    }

    let mut fields = fields.to_string();
    if !fields.contains(':') && fields.len() >= 4 {
        fields.get(..2).filter(|group| is_two_digits(group))?;
        fields.insert(2, ':');
    }

    let two_field = fields.split(':').take(2).collect::<Vec<_>>().join(":");
    Some(format!("{}*{}", locus.as_str(), two_field))
}

fn strip_locus_prefix<'a>(value: &'a str, locus: Locus) -> &'a str {
    let strip = |s: &'a str, prefix: &str| -> &'a str {
        match s.get(..prefix.len()) {
            Some(head) if head.eq_ignore_ascii_case(prefix) => &s[prefix.len()..],
            _ => s,
        }
    };
    strip(strip(value, "HLA-"), locus.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_allele_variants() {
        let normalized = |raw: &str, locus| normalize_allele(raw, locus).unwrap();
        assert_eq!(normalized("A*02:01", Locus::A), "A*02:01");
        assert_eq!(normalized("HLA-A*02:01", Locus::A), "A*02:01");
        assert_eq!(normalized("A*02:01:01:02", Locus::A), "A*02:01");
        assert_eq!(normalized("0201", Locus::A), "A*02:01");
        assert_eq!(normalized("A0201", Locus::A), "A*02:01");
        assert_eq!(normalized("DRB1*04:01", Locus::Drb1), "DRB1*04:01");
        assert_eq!(normalized("hla-drb10401", Locus::Drb1), "DRB1*04:01");
    }

    #[test]
    fn test_normalize_rejects_unusable_names() {
        // Byte 2 falls inside the multi-byte character.
        assert_eq!(normalize_allele("Axé1", Locus::A), None);
        assert_eq!(normalize_allele("Aé01", Locus::A), None);
        assert_eq!(normalize_allele("Axy01", Locus::A), None);
        assert_eq!(normalize_allele("A*", Locus::A), None);
        assert_eq!(normalize_allele("   ", Locus::A), None);
    }

    #[test]
    fn test_well_formed_alleles() {
        assert!(is_well_formed("A*02:01", Locus::A));
        assert!(is_well_formed("DRB1*15:01", Locus::Drb1));
        assert!(!is_well_formed("B*02:01", Locus::A));
        assert!(!is_well_formed("A*2:01", Locus::A));
        assert!(!is_well_formed("A*02:01:01", Locus::A));
        assert!(!is_well_formed("", Locus::A));
    }

    #[test]
    fn test_profile_validation() {
        let profile = HlaProfile::new("A*02:01", "B*35:01", "DRB1*04:01");
        assert!(profile.validate().is_ok());

        let partial = HlaProfile::new("A*02:01", "", "DRB1*04:01");
        assert!(!partial.is_complete());
        assert!(partial.validate().is_err());

        let swapped = HlaProfile::new("A*02:01", "DRB1*04:01", "B*35:01");
        assert!(swapped.validate().is_err());
    }

    #[test]
    fn test_profile_parsing() {
        let profile: HlaProfile = "A*01:01, B*08:01 ,DRB1*03:01".parse().unwrap();
        assert_eq!(profile, HlaProfile::new("A*01:01", "B*08:01", "DRB1*03:01"));
        assert!("A*01:01,B*08:01".parse::<HlaProfile>().is_err());
    }

    #[test]
    fn test_locus_lookup() {
        assert_eq!("drb1".parse::<Locus>().unwrap(), Locus::Drb1);
        assert_eq!(Locus::Dqb1.to_string(), "DQB1");
        assert!("E".parse::<Locus>().is_err());

        let profile = HlaProfile::new("A*01:01", "B*08:01", "DRB1*03:01");
        assert_eq!(profile.allele(Locus::Drb1), Some("DRB1*03:01"));
        assert_eq!(profile.allele(Locus::C), None);
    }
}
