use std::collections::HashMap;
use log::debug;
use super::{AlleleFrequency, FrequencyTable};
use crate::error::HlaResult;
use crate::hla::{normalize_allele, Locus};

/// Alleles kept per locus after sorting by frequency.
pub const MAX_ALLELES_PER_LOCUS: usize = 30;

const ALLELE_COLUMN: &str = "allele";
const FREQUENCY_COLUMN: &str = "alleles_over_2n";
const POPULATION_COLUMN: &str = "population";

/// Parses one locus table of tab-separated observations.
///
/// Rows are grouped by canonical allele name and their frequencies averaged.
/// The result is sorted by descending frequency and truncated to `limit`.
/// Content without a data row or without the allele/frequency columns
/// yields an empty table.
pub fn parse_frequency_table(content: &str, locus: Locus, limit: usize) -> HlaResult<FrequencyTable> {
    let content = content.trim();
    if content.lines().count() < 2 {
        debug!("{} table has no data rows", locus);
        return Ok(Vec::new());
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(true)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let column = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));

    let (allele_index, frequency_index) = match (column(ALLELE_COLUMN), column(FREQUENCY_COLUMN)) {
        (Some(a), Some(f)) => (a, f),
        _ => {
            debug!("{} table is missing allele/frequency columns: {:?}", locus, headers);
            return Ok(Vec::new());
        }
    };
    let population_index = column(POPULATION_COLUMN);
    debug!(
        "{} columns - allele: {}, frequency: {}, population: {:?}",
        locus, allele_index, frequency_index, population_index
    );

    // Insertion order keeps ties stable after sorting.
    let mut order: Vec<String> = Vec::new();
    let mut observations: HashMap<String, Vec<f64>> = HashMap::new();

    for record in reader.records() {
        let record = record?;
        if record.len() <= allele_index.max(frequency_index) {
            continue;
        }

        let raw_allele = &record[allele_index];
        let raw_frequency = &record[frequency_index];
        if raw_allele.is_empty() || raw_frequency.is_empty() {
            continue;
        }

        let frequency = match raw_frequency.parse::<f64>() {
            Ok(f) if f.is_finite() && f > 0.0 => f,
            _ => continue,
        };

        let Some(allele) = normalize_allele(raw_allele, locus) else {
            debug!("Skipping unrecognised {} allele {:?}", locus, raw_allele);
            continue;
        };
        observations.entry(allele.clone())
            .or_insert_with(|| {
                order.push(allele);
                Vec::new()
            })
            .push(frequency);
    }

    let mut table: FrequencyTable = order.into_iter()
        .map(|allele| {
            let values = &observations[&allele];
            let average = values.iter().sum::<f64>() / values.len() as f64;
            AlleleFrequency::new(allele, average)
        })
        .collect();

    table.sort_by(|a, b| b.frequency.total_cmp(&a.frequency));
    table.truncate(limit);

    debug!("Parsed {} alleles for HLA-{}", table.len(), locus);
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_duplicate_rows_are_averaged() {
        let content = "population\tallele\talleles_over_2n\n\
                       Pop1\tA*02:01\t0.30\n\
                       Pop2\tA*02:01\t0.20\n\
                       Pop1\tA*01:01\t0.40\n";
        let table = parse_frequency_table(content, Locus::A, MAX_ALLELES_PER_LOCUS).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].allele, "A*01:01");
        assert_relative_eq!(table[0].frequency, 0.40);
        assert_eq!(table[1].allele, "A*02:01");
        assert_relative_eq!(table[1].frequency, 0.25);
    }

    #[test]
    fn test_headers_are_case_insensitive_and_names_normalized() {
        let content = "Allele\tSample_Size\tALLELES_OVER_2N\n\
                       HLA-DRB1*04:01:01\t100\t0.1\n\
                       DRB10401\t50\t0.3\n\
                       DRB1*15:01\t80\t0.15\n";
        let table = parse_frequency_table(content, Locus::Drb1, MAX_ALLELES_PER_LOCUS).unwrap();

        assert_eq!(table.len(), 2);
        assert_eq!(table[0].allele, "DRB1*04:01");
        assert_relative_eq!(table[0].frequency, 0.2);
        assert_eq!(table[1].allele, "DRB1*15:01");
    }

    #[test]
    fn test_invalid_rows_are_skipped() {
        let content = "allele\talleles_over_2n\n\
                       A*01:01\t0.1\n\
                       A*02:01\tn/a\n\
                       A*03:01\t0\n\
                       A*11:01\t-0.2\n\
                       \t0.5\n\
                       A*24:02\n";
        let table = parse_frequency_table(content, Locus::A, MAX_ALLELES_PER_LOCUS).unwrap();
        assert_eq!(table, vec![AlleleFrequency::new("A*01:01", 0.1)]);
    }

    #[test]
    fn test_non_ascii_allele_cells_are_skipped() {
        let content = "allele\talleles_over_2n\n\
                       Axé1\t0.1\n\
                       A*02:01\t0.2\n\
                       Ä*01:01\t0.3\n";
        let table = parse_frequency_table(content, Locus::A, MAX_ALLELES_PER_LOCUS).unwrap();

        // The starred name keeps its fields whatever the prefix.
        assert_eq!(table.len(), 2);
        assert_eq!(table[0].allele, "A*01:01");
        assert_eq!(table[1].allele, "A*02:01");
    }

    #[test]
    fn test_short_or_headerless_content_is_empty() {
        assert!(parse_frequency_table("", Locus::A, 30).unwrap().is_empty());
        assert!(parse_frequency_table("allele\talleles_over_2n\n", Locus::A, 30).unwrap().is_empty());
        assert!(parse_frequency_table("name\tfreq\nA*01:01\t0.1\n", Locus::A, 30).unwrap().is_empty());
    }

    #[test]
    fn test_table_is_truncated_to_limit() {
        let mut content = String::from("allele\talleles_over_2n\n");
        for i in 1..=40 {
            content.push_str(&format!("B*{:02}:01\t{}\n", i, i as f64 / 1000.0));
        }
        let table = parse_frequency_table(&content, Locus::B, MAX_ALLELES_PER_LOCUS).unwrap();

        assert_eq!(table.len(), MAX_ALLELES_PER_LOCUS);
        assert_eq!(table[0].allele, "B*40:01");
        assert!(table.windows(2).all(|w| w[0].frequency >= w[1].frequency));
    }
}
