use std::sync::Arc;
use log::debug;
use super::cache::FrequencyCache;
use super::embedded::fallback_table;
use super::source::LoadedTables;
use super::{select_population_specific_allele, select_weighted_allele, FrequencyTable, Population};
use crate::hla::{HlaProfile, Locus};
use crate::random::RandomSource;

/// Synthesizes HLA profiles from population allele frequencies.
pub struct ProfileSampler {
    cache: Arc<FrequencyCache>,
    fallback: [(Locus, FrequencyTable); 3],
}

impl ProfileSampler {
    pub fn new(cache: Arc<FrequencyCache>) -> Self {
        Self {
            cache,
            fallback: Locus::SCORED.map(|locus| (locus, fallback_table(locus))),
        }
    }

    pub fn cache(&self) -> &Arc<FrequencyCache> {
        &self.cache
    }

    fn fallback(&self, locus: Locus) -> &FrequencyTable {
        self.fallback.iter()
            .find(|(l, _)| *l == locus)
            .map(|(_, table)| table)
            .unwrap_or(&self.fallback[0].1)
    }

    /// Loaded table for a locus, or the embedded one when absent.
    fn table_for<'a>(&'a self, tables: Option<&'a LoadedTables>, locus: Locus) -> &'a FrequencyTable {
        tables.and_then(|t| t.get(&locus))
            .filter(|table| !table.is_empty())
            .unwrap_or_else(|| self.fallback(locus))
    }

    fn draw<R, F>(&self, tables: Option<&LoadedTables>, rng: &mut R, mut select: F) -> HlaProfile
    where
        R: RandomSource,
        F: FnMut(&FrequencyTable, &mut R) -> String,
    {
        let [a, b, dr] = Locus::SCORED.map(|locus| select(self.table_for(tables, locus), &mut *rng));
        HlaProfile::new(a, b, dr)
    }

    /// Profile drawn from the embedded tables only.
    pub fn generate_realistic<R: RandomSource>(&self, rng: &mut R) -> HlaProfile {
        self.draw(None, rng, |table, rng| select_weighted_allele(table, rng))
    }

    /// Waits for the loaded tables (sharing any in-flight load) and draws
    /// from them, falling back per locus.
    pub fn generate_from_tables<R: RandomSource>(&self, rng: &mut R) -> HlaProfile {
        let tables = self.cache.load();
        self.draw(Some(tables.as_ref()), rng, |table, rng| select_weighted_allele(table, rng))
    }

    /// Never waits. Uses cached tables when present; otherwise starts a
    /// background load for later calls and draws from the embedded tables.
    pub fn generate_sync<R: RandomSource>(&self, rng: &mut R) -> HlaProfile {
        match self.cache.cached() {
            Some(tables) => self.draw(Some(tables.as_ref()), rng, |table, rng| select_weighted_allele(table, rng)),
            None => {
                if self.cache.load_in_background() {
                    debug!("Started background frequency load");
                }
                self.generate_realistic(rng)
            }
        }
    }

    pub fn generate_population_specific<R: RandomSource>(&self, population: Population, rng: &mut R) -> HlaProfile {
        let tables = self.cache.load();
        self.draw(Some(tables.as_ref()), rng, |table, rng| {
            select_population_specific_allele(table, population, rng)
        })
    }
}
