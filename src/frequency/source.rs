use std::collections::HashMap;
use std::path::{Path, PathBuf};
use log::{debug, info, warn};
use super::tsv::parse_frequency_table;
use super::FrequencyTable;
use crate::error::{HlaError, HlaResult};
use crate::hla::Locus;

/// Where raw per-locus frequency tables come from.
pub trait TableSource: Send + Sync {
    /// Raw tab-separated content for one locus.
    fn fetch(&self, locus: Locus) -> HlaResult<String>;

    /// `false` when there is nothing to fetch, so no load is ever started.
    fn is_configured(&self) -> bool {
        true
    }
}

/// Reads `<LOCUS>.tsv` from a primary directory, then an alternate one.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    primary: PathBuf,
    alternate: Option<PathBuf>,
}

impl DirectorySource {
    pub fn new<P: AsRef<Path>>(primary: P, alternate: Option<P>) -> Self {
        Self {
            primary: primary.as_ref().to_path_buf(),
            alternate: alternate.map(|p| p.as_ref().to_path_buf()),
        }
    }

    fn file_for(dir: &Path, locus: Locus) -> PathBuf {
        dir.join(format!("{}.tsv", locus.as_str()))
    }
}

impl TableSource for DirectorySource {
    fn fetch(&self, locus: Locus) -> HlaResult<String> {
        let primary = Self::file_for(&self.primary, locus);
        match std::fs::read_to_string(&primary) {
            Ok(content) => return Ok(content),
            Err(e) => debug!("Could not read {:?}: {}", primary, e),
        }

        let Some(alternate_dir) = &self.alternate else {
            return Err(HlaError::DataSource(format!("no table for {} at {:?}", locus, primary)));
        };

        let alternate = Self::file_for(alternate_dir, locus);
        std::fs::read_to_string(&alternate).map_err(|e| {
            HlaError::DataSource(format!("no table for {} at {:?} or {:?}: {}", locus, primary, alternate, e))
        })
    }
}

/// Source that never has data; every locus falls back to embedded tables.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedOnly;

impl TableSource for EmbeddedOnly {
    fn fetch(&self, locus: Locus) -> HlaResult<String> {
        Err(HlaError::DataSource(format!("no external table configured for {}", locus)))
    }

    fn is_configured(&self) -> bool {
        false
    }
}

/// Tables keyed by locus; a locus is present only if it parsed to at least
/// one allele.
pub type LoadedTables = HashMap<Locus, FrequencyTable>;

/// Fetches and parses every locus. Failures are logged and skipped.
pub fn load_tables(source: &dyn TableSource, limit: usize) -> LoadedTables {
    let mut tables = LoadedTables::new();

    for locus in Locus::ALL {
        let content = match source.fetch(locus) {
            Ok(content) => content,
            Err(e) => {
                warn!("Skipping HLA-{} frequencies: {}", locus, e);
                continue;
            }
        };

        match parse_frequency_table(&content, locus, limit) {
            Ok(table) if !table.is_empty() => {
                debug!("Loaded {} alleles for HLA-{}", table.len(), locus);
                tables.insert(locus, table);
            },
            Ok(_) => warn!("HLA-{} table contained no usable rows", locus),
            Err(e) => warn!("Malformed HLA-{} table: {}", locus, e),
        }
    }

    info!("Loaded frequency tables for {} of {} loci", tables.len(), Locus::ALL.len());
    tables
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    /// In-memory source that counts fetches and can be slowed down.
    pub struct StaticSource {
        pub tables: HashMap<Locus, String>,
        pub delay: Duration,
        pub fetches: AtomicUsize,
    }

    impl StaticSource {
        pub fn new(tables: &[(Locus, &str)]) -> Self {
            Self {
                tables: tables.iter().map(|&(l, c)| (l, c.to_string())).collect(),
                delay: Duration::ZERO,
                fetches: AtomicUsize::new(0),
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        /// Number of full loads performed (one fetch per locus per load).
        pub fn loads(&self) -> usize {
            self.fetches.load(Ordering::SeqCst) / Locus::ALL.len()
        }
    }

    impl TableSource for StaticSource {
        fn fetch(&self, locus: Locus) -> HlaResult<String> {
            self.fetches.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            self.tables.get(&locus)
                .cloned()
                .ok_or_else(|| HlaError::DataSource(format!("missing {}", locus)))
        }
    }

    impl TableSource for Arc<StaticSource> {
        fn fetch(&self, locus: Locus) -> HlaResult<String> {
            self.as_ref().fetch(locus)
        }
    }
}
