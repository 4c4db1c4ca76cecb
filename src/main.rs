use anyhow::Context;
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::Arc;

mod config;
mod donors;
mod error;
mod frequency;
mod hla;
mod matching;
mod organs;
mod output;
mod random;

use crate::config::Config;
use crate::donors::{Donor, DonorGenerator};
use crate::frequency::{FrequencyCache, Population, ProfileSampler};
use crate::hla::HlaProfile;
use crate::matching::{
    base_score, calculate_predictive_score, get_compatibility_details, rank_matches, RankingOptions,
};
use crate::organs::organ_type;
use crate::output::MatchReport;
use crate::random::{make_rng, RandomSource};

#[derive(Parser)]
#[command(name = "hla_match")]
#[command(about = "Donor/recipient HLA compatibility matching")]
struct Cli {
    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Random seed for reproducibility
    #[arg(short, long, global = true)]
    seed: Option<u64>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Rank synthetic donors against a recipient profile
    Match {
        #[arg(long = "hla-a")]
        hla_a: String,
        #[arg(long = "hla-b")]
        hla_b: String,
        #[arg(long = "hla-dr")]
        hla_dr: String,
        /// Only consider donors of this organ ("all" for every organ)
        #[arg(long)]
        organ: Option<String>,
        #[arg(long)]
        recipient_age: Option<u32>,
        /// Directory for CSV, JSON and markdown results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print a batch of synthetic donors as JSON
    Generate {
        #[arg(long)]
        count: Option<usize>,
        /// caucasian, african, asian or hispanic
        #[arg(long)]
        population: Option<Population>,
    },
    /// Per-locus match tiers between two profiles, e.g. A*02:01,B*35:01,DRB1*04:01
    Details {
        #[arg(long)]
        recipient: HlaProfile,
        #[arg(long)]
        donor: HlaProfile,
    },
    /// Outcome estimate for a compatibility score
    Predict {
        #[arg(long)]
        compatibility: u8,
        #[arg(long)]
        donor_age: u32,
        #[arg(long)]
        recipient_age: u32,
        #[arg(long)]
        organ: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    }

    // Load configuration
    let config = match &cli.config {
        Some(path) => {
            let config = Config::from_file(path)
                .with_context(|| format!("Failed to load configuration from {:?}", path))?;
            info!("Loaded configuration from {:?}", path);
            config
        },
        None => Config::default(),
    };

    let mut rng = make_rng(cli.seed);
    match cli.seed {
        Some(seed) => info!("Using seed {}", seed),
        None => info!("Using random seed"),
    }

    match cli.command {
        Command::Match { hla_a, hla_b, hla_dr, organ, recipient_age, output } => {
            let recipient = HlaProfile::new(hla_a, hla_b, hla_dr);
            recipient.validate()?;
            let recipient_age = recipient_age.unwrap_or(config.recipient.age);

            // Generate donor pool
            let sampler = build_sampler(&config);
            let donors = generate_donors(&config, &sampler, Some(&recipient), None, None, &mut rng);

            // Rank against the recipient
            let options = RankingOptions {
                organ_filter: organ.as_deref(),
                limit: config.ranking.limit,
                urgency_weight: config.ranking.urgency_weight,
            };
            let matches = rank_matches(&recipient, &donors, &options, &mut rng);
            let report = MatchReport::new(&recipient, recipient_age, organ.as_deref(), donors.len(), matches);

            print_matches(&report);

            // Save results
            if let Some(dir) = output {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create output directory {:?}", dir))?;
                crate::output::save_results(&report, &donors, &dir)?;
                info!("Results saved to {:?}", dir);
            }
        },
        Command::Generate { count, population } => {
            let sampler = build_sampler(&config);
            if config.data.primary_dir.is_some() {
                // Exported batches should come from the dataset when one is configured.
                let tables = sampler.cache().load();
                info!("Using frequency tables for {} loci", tables.len());
            }
            let donors = generate_donors(&config, &sampler, None, count, population, &mut rng);
            println!("{}", serde_json::to_string_pretty(&donors)?);
        },
        Command::Details { recipient, donor } => {
            let details = get_compatibility_details(&recipient, &donor);
            for (locus, detail) in details.loci() {
                println!("HLA-{:<5} {:<12} {:<12} {}", locus, detail.recipient, detail.donor, detail.tier);
            }
            println!("Base score: {}%", base_score(&recipient, &donor));
        },
        Command::Predict { compatibility, donor_age, recipient_age, organ } => {
            if compatibility > 100 {
                warn!("Compatibility {} is above 100", compatibility);
            }
            match organ_type(&organ) {
                Some(info) => info!("{} threshold: {}%", info.display_name, info.compatibility_threshold),
                None => warn!("Unknown organ {:?}; no organ-specific rules apply", organ),
            }
            let score = calculate_predictive_score(compatibility.min(100), donor_age, recipient_age, &organ);
            println!("{}", serde_json::to_string_pretty(&score)?);
        },
    }

    Ok(())
}

fn build_sampler(config: &Config) -> ProfileSampler {
    let cache = FrequencyCache::with_limit(config.table_source(), config.data.max_alleles_per_locus);
    let cache = Arc::new(cache);
    if config.data.primary_dir.is_some() {
        // Donor synthesis is not worth delaying for the tables; later batches pick them up.
        cache.load_in_background();
    }
    ProfileSampler::new(cache)
}

fn generate_donors<R: RandomSource>(
    config: &Config,
    sampler: &ProfileSampler,
    recipient: Option<&HlaProfile>,
    count: Option<usize>,
    population: Option<Population>,
    rng: &mut R,
) -> Vec<Donor> {
    let mut generator = DonorGenerator::new(sampler, rng);
    let count = count
        .or(config.generation.donor_count)
        .unwrap_or_else(|| generator.regeneration_count());

    let mut donors = match population.or(config.generation.population) {
        Some(population) => generator.generate_population_specific(population, count),
        None => generator.generate(count),
    };

    if let Some(recipient) = recipient {
        if config.generation.high_compatibility_count > 0 {
            donors.extend(generator.generate_high_compatibility(recipient, config.generation.high_compatibility_count));
        }
    }

    donors
}

fn print_matches(report: &MatchReport) {
    println!("Recipient: {} (age {})", report.recipient, report.recipient_age);
    println!(
        "{} donors screened, {} high / {} medium / {} low compatibility matches",
        report.donors_screened, report.summary.high, report.summary.medium, report.summary.low
    );

    for entry in &report.matches {
        let donor = &entry.result.donor;
        let meets = if donor.organ.meets_threshold(entry.result.compatibility) { "" } else { " (below threshold)" };
        println!(
            "{:>2}. {:<6} {:<8} {:>3}%{}  {}  urgency {}  success {}%",
            entry.rank,
            donor.id,
            donor.organ,
            entry.result.compatibility,
            meets,
            donor.hla,
            donor.urgency_score.map(|u| u.to_string()).unwrap_or_else(|| "-".to_string()),
            entry.predictive.success_probability,
        );
    }
}
