//! Aggregate global allele frequencies, used whenever no dataset table is
//! available for a locus.

use super::{AlleleFrequency, FrequencyTable};
use crate::hla::Locus;

const GLOBAL_AVERAGE: &str = "Global Average";

const HLA_A: &[(&str, f64)] = &[
    ("A*01:01", 0.146), ("A*02:01", 0.289), ("A*03:01", 0.125), ("A*11:01", 0.098),
    ("A*23:01", 0.042), ("A*24:02", 0.118), ("A*26:01", 0.035), ("A*29:02", 0.028),
    ("A*30:01", 0.032), ("A*31:01", 0.029), ("A*32:01", 0.038), ("A*33:01", 0.025),
    ("A*68:01", 0.018), ("A*68:02", 0.016), ("A*69:01", 0.014), ("A*74:01", 0.012),
];

const HLA_B: &[(&str, f64)] = &[
    ("B*07:02", 0.142), ("B*08:01", 0.098), ("B*13:02", 0.035), ("B*14:02", 0.028),
    ("B*15:01", 0.042), ("B*18:01", 0.038), ("B*27:05", 0.045), ("B*35:01", 0.068),
    ("B*38:01", 0.032), ("B*39:01", 0.029), ("B*40:01", 0.058), ("B*44:02", 0.089),
    ("B*44:03", 0.034), ("B*49:01", 0.025), ("B*50:01", 0.038), ("B*51:01", 0.062),
    ("B*52:01", 0.045), ("B*53:01", 0.028), ("B*55:01", 0.032), ("B*56:01", 0.018),
    ("B*57:01", 0.042), ("B*58:01", 0.035),
];

const HLA_DRB1: &[(&str, f64)] = &[
    ("DRB1*01:01", 0.089), ("DRB1*03:01", 0.125), ("DRB1*04:01", 0.098), ("DRB1*07:01", 0.142),
    ("DRB1*08:01", 0.035), ("DRB1*09:01", 0.028), ("DRB1*10:01", 0.018), ("DRB1*11:01", 0.068),
    ("DRB1*12:01", 0.032), ("DRB1*13:01", 0.089), ("DRB1*14:01", 0.025), ("DRB1*15:01", 0.118),
    ("DRB1*16:01", 0.029),
];

/// Embedded table for a scored locus; empty for loci without one.
pub fn fallback_table(locus: Locus) -> FrequencyTable {
    let rows: &[(&str, f64)] = match locus {
        Locus::A => HLA_A,
        Locus::B => HLA_B,
        Locus::Drb1 => HLA_DRB1,
        _ => &[],
    };

    rows.iter()
        .map(|&(allele, frequency)| AlleleFrequency {
            allele: allele.to_string(),
            frequency,
            population: Some(GLOBAL_AVERAGE.to_string()),
        })
        .collect()
}
