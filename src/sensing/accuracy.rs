//! Offline accuracy check of a classifier against a labelled face set.
//!
//! Labelled files follow the `<age>_<gender>_<...>.jpg` naming convention,
//! gender 0 = male and 1 = female.

use std::path::Path;

use serde::Serialize;

use crate::models::{AgeBucket, Gender, Sample};

pub fn label_from_file_name(path: &Path) -> Option<Sample> {
    let name = path.file_name()?.to_str()?;
    if !name.ends_with(".jpg") {
        return None;
    }
    let mut parts = name.split('_');
    let age: u32 = parts.next()?.parse().ok()?;
    let gender: u8 = parts.next()?.trim_end_matches(".jpg").parse().ok()?;
    Some(Sample::new(
        Gender::from_label_index(gender)?,
        AgeBucket::from_years(age),
    ))
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct AccuracyTally {
    pub total: u64,
    pub correct_gender: u64,
    pub correct_age: u64,
    /// Images the classifier could not handle; excluded from `total`.
    pub skipped: u64,
}

impl AccuracyTally {
    pub fn record(&mut self, expected: Sample, predicted: Option<Sample>) {
        let Some(predicted) = predicted else {
            self.skipped += 1;
            return;
        };
        self.total += 1;
        if predicted.gender == expected.gender {
            self.correct_gender += 1;
        }
        if predicted.age_bucket == expected.age_bucket {
            self.correct_age += 1;
        }
    }

    pub fn gender_accuracy(&self) -> f64 {
        ratio(self.correct_gender, self.total)
    }

    pub fn age_accuracy(&self) -> f64 {
        ratio(self.correct_age, self.total)
    }
}

fn ratio(hits: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}
