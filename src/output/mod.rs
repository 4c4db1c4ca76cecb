use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::Path;
use log::info;
use crate::donors::Donor;
use crate::error::HlaResult;
use crate::hla::HlaProfile;
use crate::matching::{
    calculate_predictive_score, get_compatibility_details, CompatibilityDetails,
    MatchResult, MatchSummary, PredictiveScore,
};

/// One ranked match with the derived per-locus and outcome analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    pub rank: usize,
    #[serde(flatten)]
    pub result: MatchResult,
    pub details: CompatibilityDetails,
    pub predictive: PredictiveScore,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchReport {
    pub generated_at: DateTime<Utc>,
    pub recipient: HlaProfile,
    pub recipient_age: u32,
    pub organ_filter: Option<String>,
    pub donors_screened: usize,
    pub summary: MatchSummary,
    pub matches: Vec<ReportEntry>,
}

impl MatchReport {
    pub fn new(
        recipient: &HlaProfile,
        recipient_age: u32,
        organ_filter: Option<&str>,
        donors_screened: usize,
        matches: Vec<MatchResult>,
    ) -> Self {
        let summary = MatchSummary::from_matches(&matches);
        let entries = matches.into_iter()
            .enumerate()
            .map(|(i, result)| ReportEntry {
                rank: i + 1,
                details: get_compatibility_details(recipient, &result.donor.hla),
                predictive: calculate_predictive_score(
                    result.compatibility,
                    result.donor.age,
                    recipient_age,
                    result.donor.organ.info().id,
                ),
                result,
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            recipient: recipient.clone(),
            recipient_age,
            organ_filter: organ_filter.map(str::to_string),
            donors_screened,
            summary,
            matches: entries,
        }
    }
}

pub fn save_results<P: AsRef<Path>>(report: &MatchReport, donors: &[Donor], output_dir: P) -> HlaResult<()> {
    let output_path = output_dir.as_ref();

    // Save ranked matches
    save_match_data(report, &output_path.join("matches.csv"))?;

    // Save screened donor pool
    save_donor_data(donors, &output_path.join("donors.csv"))?;

    // Save full report
    save_json_report(report, &output_path.join("match_report.json"))?;

    // Markdown summary
    generate_report(report, output_path)?;

    info!("All results saved to {:?}", output_path);
    Ok(())
}

fn save_match_data<P: AsRef<Path>>(report: &MatchReport, path: P) -> HlaResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    // Write header
    writer.write_record(&[
        "RANK", "DONOR_ID", "ORGAN", "COMPATIBILITY", "URGENCY",
        "HLA_A", "HLA_A_MATCH", "HLA_B", "HLA_B_MATCH", "HLA_DR", "HLA_DR_MATCH",
        "SUCCESS_PROBABILITY",
    ])?;

    // Write data
    for entry in &report.matches {
        let donor = &entry.result.donor;
        writer.write_record(&[
            entry.rank.to_string(),
            donor.id.clone(),
            donor.organ.to_string(),
            entry.result.compatibility.to_string(),
            donor.urgency_score.map(|u| u.to_string()).unwrap_or_default(),
            entry.details.hla_a.donor.clone(),
            entry.details.hla_a.tier.to_string(),
            entry.details.hla_b.donor.clone(),
            entry.details.hla_b.tier.to_string(),
            entry.details.hla_dr.donor.clone(),
            entry.details.hla_dr.tier.to_string(),
            entry.predictive.success_probability.to_string(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_donor_data<P: AsRef<Path>>(donors: &[Donor], path: P) -> HlaResult<()> {
    let mut writer = csv::Writer::from_path(path)?;

    // Write header
    writer.write_record(&[
        "DONOR_ID", "AGE", "BLOOD_TYPE", "ORGAN", "LOCATION", "HLA_A", "HLA_B", "HLA_DR",
        "MEDICAL_STATUS", "AVAILABILITY", "URGENCY", "DONOR_TYPE", "ORGAN_CONDITION",
        "PRESERVATION_HOURS",
    ])?;

    // Write data
    for donor in donors {
        writer.write_record(&[
            donor.id.clone(),
            donor.age.to_string(),
            donor.blood_type.clone(),
            donor.organ.to_string(),
            donor.location.clone(),
            donor.hla.hla_a.clone(),
            donor.hla.hla_b.clone(),
            donor.hla.hla_dr.clone(),
            donor.medical_status.clone(),
            donor.availability.clone(),
            donor.urgency_score.map(|u| u.to_string()).unwrap_or_default(),
            donor.donor_type.as_str().to_string(),
            donor.organ_condition.as_str().to_string(),
            donor.preservation_time.map(|h| h.to_string()).unwrap_or_default(),
        ])?;
    }

    writer.flush()?;
    Ok(())
}

fn save_json_report<P: AsRef<Path>>(report: &MatchReport, path: P) -> HlaResult<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}

/// Markdown summary of an analysis run
pub fn generate_report<P: AsRef<Path>>(report: &MatchReport, output_dir: P) -> HlaResult<()> {
    let report_path = output_dir.as_ref().join("match_report.md");

    let mut rows = String::new();
    for entry in &report.matches {
        let donor = &entry.result.donor;
        rows.push_str(&format!(
            "| {} | {} | {} | {}% | {} / {} / {} | {}% |\n",
            entry.rank,
            donor.id,
            donor.organ,
            entry.result.compatibility,
            entry.details.hla_a.tier,
            entry.details.hla_b.tier,
            entry.details.hla_dr.tier,
            entry.predictive.success_probability,
        ));
    }

    let report_content = format!(
        r#"# HLA Compatibility Report

Generated {}

## Recipient
- **HLA-A**: {}
- **HLA-B**: {}
- **HLA-DRB1**: {}
- **Age**: {}
- **Organ filter**: {}

## Summary
- **Donors screened**: {}
- **Matches reported**: {}
- **High compatibility (>=80%)**: {}
- **Medium compatibility (60-79%)**: {}
- **Low compatibility (<60%)**: {}
- **Mean compatibility**: {:.1}%

## Ranked Matches
| Rank | Donor | Organ | Compatibility | A / B / DRB1 | Predicted Success |
|------|-------|-------|---------------|--------------|-------------------|
{}
## Files Generated
- `matches.csv`: Ranked matches with per-locus tiers
- `donors.csv`: Every donor screened in this run
- `match_report.json`: Full report including predictive analysis

## Notes
Donor records are synthetic and drawn from population allele frequencies.
Scores are a screening heuristic, not a clinical crossmatch.
"#,
        report.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        report.recipient.hla_a,
        report.recipient.hla_b,
        report.recipient.hla_dr,
        report.recipient_age,
        report.organ_filter.as_deref().unwrap_or("all"),
        report.donors_screened,
        report.summary.n_matches,
        report.summary.high,
        report.summary.medium,
        report.summary.low,
        report.summary.mean_compatibility,
        rows,
    );

    std::fs::write(report_path, report_content)?;
    Ok(())
}
