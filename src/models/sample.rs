use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }

    /// Index convention used by labelled face datasets: 0 = male, 1 = female.
    pub fn from_label_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Gender::Male),
            1 => Some(Gender::Female),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AgeBucket {
    Kid,
    Teen,
    Adult,
    Elder,
    Unknown,
}

impl AgeBucket {
    /// Buckets that are persisted in report records, in record order.
    pub const COUNTED: [AgeBucket; 4] = [
        AgeBucket::Kid,
        AgeBucket::Teen,
        AgeBucket::Adult,
        AgeBucket::Elder,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBucket::Kid => "kid",
            AgeBucket::Teen => "teen",
            AgeBucket::Adult => "adult",
            AgeBucket::Elder => "elder",
            AgeBucket::Unknown => "unknown",
        }
    }

    /// Maps the age-range labels emitted by the age classifier onto buckets.
    pub fn from_model_label(label: &str) -> Self {
        match label.trim() {
            "(0-2)" | "(4-6)" | "(8-12)" => AgeBucket::Kid,
            "(15-20)" => AgeBucket::Teen,
            "(25-32)" | "(38-43)" | "(48-53)" => AgeBucket::Adult,
            "(60-100)" => AgeBucket::Elder,
            _ => AgeBucket::Unknown,
        }
    }

    pub fn from_years(age: u32) -> Self {
        match age {
            0..=12 => AgeBucket::Kid,
            13..=20 => AgeBucket::Teen,
            21..=53 => AgeBucket::Adult,
            _ => AgeBucket::Elder,
        }
    }
}

/// One classified person observation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Sample {
    pub gender: Gender,
    pub age_bucket: AgeBucket,
}

impl Sample {
    pub fn new(gender: Gender, age_bucket: AgeBucket) -> Self {
        Self { gender, age_bucket }
    }
}
