//! Body-mass-index calculation and WHO style bucketing.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{BmiRecord, MeditrackError};

/// Weight classes shown next to a BMI value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum BmiCategory {
    Underweight,
    NormalWeight,
    Overweight,
    ObesityClass1,
    ObesityClass2,
    ObesityClass3,
    Invalid,
}

impl BmiCategory {
    pub fn label(self) -> &'static str {
        match self {
            Self::Underweight => "Underweight",
            Self::NormalWeight => "Normal weight",
            Self::Overweight => "Overweight",
            Self::ObesityClass1 => "Obesity Class 1",
            Self::ObesityClass2 => "Obesity Class 2",
            Self::ObesityClass3 => "Obesity Class 3",
            Self::Invalid => "Invalid BMI",
        }
    }
}

impl fmt::Display for BmiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A rounded BMI value paired with its category.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BmiReading {
    pub value: f64,
    pub category: BmiCategory,
}

impl BmiReading {
    /// Classifies an already stored sample. Returns `None` when the stored
    /// text is not a number.
    pub fn from_record(record: &BmiRecord) -> Option<Self> {
        let value = record.parsed_value()?;
        Some(Self {
            value,
            category: classify_bmi(value),
        })
    }

    /// The two-decimal text handed to persistence.
    pub fn stored_value(&self) -> String {
        format!("{:.2}", self.value)
    }
}

impl fmt::Display for BmiReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2} ({})", self.value, self.category)
    }
}

/// `weight / height²`, rounded half-up to two decimals.
pub fn compute_bmi(weight_kg: f64, height_m: f64) -> Result<f64, MeditrackError> {
    if !is_positive_measurement(weight_kg) || !is_positive_measurement(height_m) {
        return Err(MeditrackError::InvalidMeasurement {
            weight_kg,
            height_m,
        });
    }

    let raw = weight_kg / (height_m * height_m);
    Ok(round_to_hundredths(raw))
}

/// Buckets a BMI value. Lower edges are inclusive.
pub fn classify_bmi(value: f64) -> BmiCategory {
    if !value.is_finite() || value < 0.0 {
        return BmiCategory::Invalid;
    }

    match value {
        v if v < 18.5 => BmiCategory::Underweight,
        v if v < 25.0 => BmiCategory::NormalWeight,
        v if v < 30.0 => BmiCategory::Overweight,
        v if v < 35.0 => BmiCategory::ObesityClass1,
        v if v < 40.0 => BmiCategory::ObesityClass2,
        _ => BmiCategory::ObesityClass3,
    }
}

/// Computes a BMI submission. The category is taken from the rounded value so
/// it always agrees with what gets stored.
pub fn assess_bmi(weight_kg: f64, height_m: f64) -> Result<BmiReading, MeditrackError> {
    let value = compute_bmi(weight_kg, height_m)?;
    Ok(BmiReading {
        value,
        category: classify_bmi(value),
    })
}

/// The most recently created sample. On equal timestamps the later entry in
/// the slice wins.
pub fn current_bmi(records: &[BmiRecord]) -> Option<&BmiRecord> {
    records.iter().max_by_key(|record| record.created_at)
}

fn is_positive_measurement(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn round_to_hundredths(value: f64) -> f64 {
    // f64::round is half away from zero, which is half-up for positive input.
    (value * 100.0).round() / 100.0
}
