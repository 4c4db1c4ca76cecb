use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use crate::error::{HlaError, HlaResult};
use crate::frequency::tsv::MAX_ALLELES_PER_LOCUS;
use crate::frequency::{DirectorySource, EmbeddedOnly, Population, TableSource};
use crate::matching::{DEFAULT_MATCH_LIMIT, DEFAULT_URGENCY_WEIGHT};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub generation: GenerationConfig,
    pub ranking: RankingConfig,
    pub recipient: RecipientConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Directory holding `<LOCUS>.tsv` tables. Embedded frequencies only when unset.
    pub primary_dir: Option<PathBuf>,
    /// Tried when a table is missing from `primary_dir`.
    pub alternate_dir: Option<PathBuf>,
    pub max_alleles_per_locus: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Donor batch size; a random regeneration-cycle size when unset.
    pub donor_count: Option<usize>,
    /// Extra donors seeded from the recipient's own alleles.
    pub high_compatibility_count: usize,
    /// Draw donors with population-specific weighting.
    pub population: Option<Population>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub limit: usize,
    pub urgency_weight: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecipientConfig {
    pub age: u32,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            primary_dir: None,
            alternate_dir: None,
            max_alleles_per_locus: MAX_ALLELES_PER_LOCUS,
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            limit: DEFAULT_MATCH_LIMIT,
            urgency_weight: DEFAULT_URGENCY_WEIGHT,
        }
    }
}

impl Default for RecipientConfig {
    fn default() -> Self {
        Self { age: 45 }
    }
}

impl Config {
    pub fn from_file<P: AsRef<Path>>(path: P) -> HlaResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> HlaResult<()> {
        if self.data.max_alleles_per_locus == 0 {
            return Err(HlaError::InvalidConfig(
                "max_alleles_per_locus must be positive".to_string()
            ));
        }

        if self.data.alternate_dir.is_some() && self.data.primary_dir.is_none() {
            return Err(HlaError::InvalidConfig(
                "alternate_dir requires primary_dir".to_string()
            ));
        }

        if self.generation.donor_count == Some(0) {
            return Err(HlaError::InvalidConfig(
                "donor_count must be positive".to_string()
            ));
        }

        self.validate_ranking()?;

        if self.recipient.age > 120 {
            return Err(HlaError::InvalidConfig(
                format!("Recipient age {} is out of range", self.recipient.age)
            ));
        }

        Ok(())
    }

    fn validate_ranking(&self) -> HlaResult<()> {
        if self.ranking.limit == 0 {
            return Err(HlaError::InvalidConfig(
                "Ranking limit must be positive".to_string()
            ));
        }

        if !self.ranking.urgency_weight.is_finite() || self.ranking.urgency_weight < 0.0 {
            return Err(HlaError::InvalidConfig(
                "Urgency weight must be a non-negative number".to_string()
            ));
        }

        Ok(())
    }

    /// Table source described by the data section.
    pub fn table_source(&self) -> Box<dyn TableSource> {
        match &self.data.primary_dir {
            Some(primary) => Box::new(DirectorySource::new(primary, self.data.alternate_dir.as_ref())),
            None => Box::new(EmbeddedOnly),
        }
    }
}
