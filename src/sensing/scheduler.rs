use image::DynamicImage;
use serde::Serialize;
use tokio::time::{Duration, Instant};

use crate::models::{CounterStore, Recorded};
use crate::settings::StationSettings;

use super::oracle::{crop_face, Classifier, FaceLocator};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

pub const DEFAULT_DETECTION_INTERVAL: Duration = Duration::from_secs(5);
pub const DEFAULT_FACE_PADDING: u32 = 20;
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Inside the detection interval; the models were not called.
    Throttled,
    LocatorFailed,
    NoFaces,
    Sampled {
        counted: usize,
        unknown_age: usize,
        failed: usize,
    },
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SchedulerStats {
    pub frames: u64,
    pub attempts: u64,
    pub regions: u64,
    pub counted: u64,
    pub unknown_age: u64,
    pub failed_regions: u64,
}

/// Rate gate in front of the face and classification models.
pub struct SamplingScheduler<L, C> {
    locator: L,
    classifier: C,
    detection_interval: Duration,
    padding: u32,
    min_confidence: f32,
    last_detection: Option<Instant>,
    stats: SchedulerStats,
}

impl<L: FaceLocator, C: Classifier> SamplingScheduler<L, C> {
    pub fn new(locator: L, classifier: C) -> Self {
        Self {
            locator,
            classifier,
            detection_interval: DEFAULT_DETECTION_INTERVAL,
            padding: DEFAULT_FACE_PADDING,
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            last_detection: None,
            stats: SchedulerStats::default(),
        }
    }

    /// Scheduler tuned by the `station` section of the settings file.
    pub fn from_settings(locator: L, classifier: C, settings: &StationSettings) -> Self {
        Self::new(locator, classifier)
            .with_detection_interval(settings.detection_interval())
            .with_padding(settings.face_padding_px)
            .with_min_confidence(settings.face_confidence_threshold)
    }

    pub fn with_detection_interval(mut self, interval: Duration) -> Self {
        self.detection_interval = interval;
        self
    }

    pub fn with_padding(mut self, padding: u32) -> Self {
        self.padding = padding;
        self
    }

    pub fn with_min_confidence(mut self, min_confidence: f32) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn stats(&self) -> SchedulerStats {
        self.stats
    }

    pub fn is_due(&self, now: Instant) -> bool {
        self.last_detection
            .map(|last| now.saturating_duration_since(last) >= self.detection_interval)
            .unwrap_or(true)
    }

    /// Runs detection on `frame` if the interval has elapsed and records every
    /// classified face into `store`. The interval restarts after any attempt,
    /// failed or not, so a broken model cannot cause a tight retry loop.
    pub fn on_frame(
        &mut self,
        frame: &DynamicImage,
        now: Instant,
        store: &mut CounterStore,
    ) -> FrameOutcome {
        self.stats.frames += 1;
        if !self.is_due(now) {
            return FrameOutcome::Throttled;
        }

        self.stats.attempts += 1;
        let outcome = self.detect(frame, store);
        self.last_detection = Some(now);
        outcome
    }

    fn detect(&mut self, frame: &DynamicImage, store: &mut CounterStore) -> FrameOutcome {
        let regions = match self.locator.locate(frame) {
            Ok(regions) => regions,
            Err(err) => {
                log_warn!("face localization failed: {err:#}");
                return FrameOutcome::LocatorFailed;
            }
        };

        let regions: Vec<_> = regions
            .into_iter()
            .filter(|region| region.confidence > self.min_confidence)
            .collect();
        if regions.is_empty() {
            log_debug!("no face detected");
            return FrameOutcome::NoFaces;
        }

        let (mut counted, mut unknown_age, mut failed) = (0, 0, 0);
        for region in &regions {
            let Some(face) = crop_face(frame, region, self.padding) else {
                log_warn!("face region {region:?} lies outside the frame, skipping");
                failed += 1;
                continue;
            };

            match self.classifier.classify(&face) {
                Ok(sample) => match store.record(sample) {
                    Recorded::Counted => counted += 1,
                    Recorded::UnknownAge => {
                        log_debug!("sample {:?} has no age bucket, not counted", sample.gender);
                        unknown_age += 1;
                    }
                },
                Err(err) => {
                    log_warn!("classification failed for region {region:?}: {err:#}");
                    failed += 1;
                }
            }
        }

        self.stats.regions += regions.len() as u64;
        self.stats.counted += counted as u64;
        self.stats.unknown_age += unknown_age as u64;
        self.stats.failed_regions += failed as u64;

        log_debug!(
            "sampled {} faces: {counted} counted, {unknown_age} unknown age, {failed} failed",
            regions.len()
        );
        FrameOutcome::Sampled {
            counted,
            unknown_age,
            failed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AgeBucket, Gender, Sample};
    use crate::sensing::oracle::Region;
    use anyhow::{anyhow, Result};
    use std::cell::Cell;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    struct ScriptedLocator {
        script: Mutex<VecDeque<Result<Vec<Region>>>>,
        calls: Cell<usize>,
    }

    impl ScriptedLocator {
        fn new(script: Vec<Result<Vec<Region>>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                calls: Cell::new(0),
            }
        }
    }

    impl FaceLocator for ScriptedLocator {
        fn locate(&self, _frame: &DynamicImage) -> Result<Vec<Region>> {
            self.calls.set(self.calls.get() + 1);
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }
    }

    struct ScriptedClassifier {
        script: Mutex<VecDeque<Result<Sample>>>,
    }

    impl Classifier for ScriptedClassifier {
        fn classify(&self, _face: &DynamicImage) -> Result<Sample> {
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("script exhausted")))
        }
    }

    fn face(x: u32) -> Region {
        Region {
            x1: x,
            y1: 10,
            x2: x + 20,
            y2: 30,
            confidence: 0.95,
        }
    }

    fn scheduler(
        locator: Vec<Result<Vec<Region>>>,
        classifier: Vec<Result<Sample>>,
    ) -> SamplingScheduler<ScriptedLocator, ScriptedClassifier> {
        SamplingScheduler::new(
            ScriptedLocator::new(locator),
            ScriptedClassifier {
                script: Mutex::new(classifier.into()),
            },
        )
    }

    #[test]
    fn throttles_within_detection_interval() {
        let mut sched = scheduler(vec![Ok(vec![]), Ok(vec![]), Ok(vec![])], vec![]);
        let mut store = CounterStore::new();
        let frame = DynamicImage::new_rgb8(64, 64);
        let start = Instant::now();

        assert_eq!(sched.on_frame(&frame, start, &mut store), FrameOutcome::NoFaces);
        for secs in 1..5 {
            let now = start + Duration::from_secs(secs);
            assert_eq!(sched.on_frame(&frame, now, &mut store), FrameOutcome::Throttled);
        }
        let due = start + Duration::from_secs(5);
        assert_eq!(sched.on_frame(&frame, due, &mut store), FrameOutcome::NoFaces);

        assert_eq!(sched.locator.calls.get(), 2);
        assert_eq!(sched.stats().frames, 6);
        assert_eq!(sched.stats().attempts, 2);
    }

    #[test]
    fn station_settings_tune_interval_and_confidence() {
        let mut weak = face(0);
        weak.confidence = 0.6;
        let settings = StationSettings {
            detection_interval_secs: 2,
            face_confidence_threshold: 0.5,
            ..StationSettings::default()
        };
        let mut sched = SamplingScheduler::from_settings(
            ScriptedLocator::new(vec![Ok(vec![weak]), Ok(vec![])]),
            ScriptedClassifier {
                script: Mutex::new(vec![Ok(Sample::new(Gender::Male, AgeBucket::Kid))].into()),
            },
            &settings,
        );
        let mut store = CounterStore::new();
        let frame = DynamicImage::new_rgb8(64, 64);
        let start = Instant::now();

        assert_eq!(
            sched.on_frame(&frame, start, &mut store),
            FrameOutcome::Sampled {
                counted: 1,
                unknown_age: 0,
                failed: 0
            }
        );
        let later = start + Duration::from_secs(2);
        assert_eq!(sched.on_frame(&frame, later, &mut store), FrameOutcome::NoFaces);
        assert_eq!(store.snapshot().age.kid, 1);
    }

    #[test]
    fn failed_localization_still_restarts_interval() {
        let mut sched = scheduler(vec![Err(anyhow!("model crashed"))], vec![]);
        let mut store = CounterStore::new();
        let frame = DynamicImage::new_rgb8(64, 64);
        let start = Instant::now();

        assert_eq!(sched.on_frame(&frame, start, &mut store), FrameOutcome::LocatorFailed);
        let soon = start + Duration::from_secs(1);
        assert_eq!(sched.on_frame(&frame, soon, &mut store), FrameOutcome::Throttled);
        assert_eq!(sched.locator.calls.get(), 1);
    }

    #[test]
    fn classifier_failure_skips_only_that_region() {
        let mut sched = scheduler(
            vec![Ok(vec![face(0), face(20), face(40)])],
            vec![
                Ok(Sample::new(Gender::Male, AgeBucket::Adult)),
                Err(anyhow!("blob too small")),
                Ok(Sample::new(Gender::Female, AgeBucket::Kid)),
            ],
        );
        let mut store = CounterStore::new();
        let frame = DynamicImage::new_rgb8(64, 64);

        let outcome = sched.on_frame(&frame, Instant::now(), &mut store);

        assert_eq!(
            outcome,
            FrameOutcome::Sampled {
                counted: 2,
                unknown_age: 0,
                failed: 1
            }
        );
        let snap = store.snapshot();
        assert_eq!(snap.total, 2);
        assert_eq!(snap.gender.male, 1);
        assert_eq!(snap.age.kid, 1);
    }

    #[test]
    fn low_confidence_regions_are_ignored() {
        let mut weak = face(0);
        weak.confidence = 0.5;
        let mut sched = scheduler(vec![Ok(vec![weak])], vec![]);
        let mut store = CounterStore::new();
        let frame = DynamicImage::new_rgb8(64, 64);

        assert_eq!(
            sched.on_frame(&frame, Instant::now(), &mut store),
            FrameOutcome::NoFaces
        );
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn unknown_age_and_out_of_frame_regions_are_not_counted() {
        let outside = Region {
            x1: 500,
            y1: 500,
            x2: 520,
            y2: 520,
            confidence: 0.99,
        };
        let mut sched = scheduler(
            vec![Ok(vec![face(0), outside])],
            vec![Ok(Sample::new(Gender::Male, AgeBucket::Unknown))],
        );
        let mut store = CounterStore::new();
        let frame = DynamicImage::new_rgb8(64, 64);

        let outcome = sched.on_frame(&frame, Instant::now(), &mut store);

        assert_eq!(
            outcome,
            FrameOutcome::Sampled {
                counted: 0,
                unknown_age: 1,
                failed: 1
            }
        );
        assert!(store.snapshot().is_empty());
        assert_eq!(sched.stats().unknown_age, 1);
    }
}
