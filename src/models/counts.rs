use serde::{Deserialize, Serialize};

use super::sample::{AgeBucket, Gender, Sample};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct GenderCounts {
    pub male: u64,
    pub female: u64,
}

impl GenderCounts {
    pub fn get(&self, gender: Gender) -> u64 {
        match gender {
            Gender::Male => self.male,
            Gender::Female => self.female,
        }
    }

    pub fn sum(&self) -> u64 {
        self.male + self.female
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgeCounts {
    pub kid: u64,
    pub teen: u64,
    pub adult: u64,
    pub elder: u64,
}

impl AgeCounts {
    /// Count for a persisted bucket; `Unknown` is never stored and reads as zero.
    pub fn get(&self, bucket: AgeBucket) -> u64 {
        match bucket {
            AgeBucket::Kid => self.kid,
            AgeBucket::Teen => self.teen,
            AgeBucket::Adult => self.adult,
            AgeBucket::Elder => self.elder,
            AgeBucket::Unknown => 0,
        }
    }

    pub fn sum(&self) -> u64 {
        self.kid + self.teen + self.adult + self.elder
    }
}

/// Accumulated observations for one station over one report period.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub total: u64,
    pub gender: GenderCounts,
    pub age: AgeCounts,
}

impl CounterSnapshot {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// `total` equals both the gender sum and the (known) age sum.
    pub fn is_consistent(&self) -> bool {
        self.total == self.gender.sum() && self.total == self.age.sum()
    }

    pub fn merge(&mut self, other: &CounterSnapshot) {
        self.total += other.total;
        self.gender.male += other.gender.male;
        self.gender.female += other.gender.female;
        self.age.kid += other.age.kid;
        self.age.teen += other.age.teen;
        self.age.adult += other.age.adult;
        self.age.elder += other.age.elder;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recorded {
    Counted,
    /// The classifier could not bucket the age; the sample is left out so the
    /// snapshot totals stay consistent.
    UnknownAge,
}

/// Single-writer accumulator owned by one station loop.
#[derive(Debug, Default)]
pub struct CounterStore {
    current: CounterSnapshot,
}

impl CounterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, sample: Sample) -> Recorded {
        let counts = &mut self.current;
        match sample.age_bucket {
            AgeBucket::Kid => counts.age.kid += 1,
            AgeBucket::Teen => counts.age.teen += 1,
            AgeBucket::Adult => counts.age.adult += 1,
            AgeBucket::Elder => counts.age.elder += 1,
            AgeBucket::Unknown => return Recorded::UnknownAge,
        }
        match sample.gender {
            Gender::Male => counts.gender.male += 1,
            Gender::Female => counts.gender.female += 1,
        }
        counts.total += 1;
        Recorded::Counted
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        self.current
    }

    /// Returns the accumulated counts and leaves the store empty in one step.
    pub fn take(&mut self) -> CounterSnapshot {
        std::mem::take(&mut self.current)
    }

    /// Puts counts back after a flush that could not be persisted.
    pub fn restore(&mut self, snapshot: CounterSnapshot) {
        self.current.merge(&snapshot);
    }
}
