use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use image::DynamicImage;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::models::{CounterSnapshot, CounterStore};
use crate::report::ReportWriter;

use super::oracle::{Classifier, FaceLocator};
use super::scheduler::{FrameOutcome, SamplingScheduler, SchedulerStats};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

pub const DEFAULT_REPORT_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationEnd {
    /// The frame source closed; no more frames will arrive.
    CaptureEnded,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct StationSummary {
    pub end: StationEnd,
    pub reports: Vec<PathBuf>,
    pub stats: SchedulerStats,
    /// Counts gathered since the last flush. They are not written when the
    /// loop stops.
    pub unflushed: CounterSnapshot,
}

/// Drives one station: classifies incoming frames through the scheduler and
/// flushes the counters every `report_interval`, measured from loop start.
///
/// Ends when the frame channel closes or `cancel_token` fires. A report that
/// cannot be written stops the loop with an error.
pub async fn station_loop<L, C>(
    mut frames: mpsc::Receiver<DynamicImage>,
    mut scheduler: SamplingScheduler<L, C>,
    writer: ReportWriter,
    report_interval: Duration,
    cancel_token: CancellationToken,
) -> Result<StationSummary>
where
    L: FaceLocator,
    C: Classifier,
{
    if report_interval.is_zero() {
        bail!(
            "station {}: report interval must be greater than zero",
            writer.category()
        );
    }

    let mut store = CounterStore::new();
    let mut reports = Vec::new();

    let mut report_ticker =
        tokio::time::interval_at(Instant::now() + report_interval, report_interval);
    report_ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    log_info!("station {} sampling started", writer.category());

    let end = loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!("station {} shutting down", writer.category());
                break StationEnd::Cancelled;
            }
            _ = report_ticker.tick() => {
                let written = writer
                    .flush(&mut store, Local::now().naive_local())
                    .with_context(|| {
                        format!("station {} could not store its report", writer.category())
                    });
                match written {
                    Ok(report) => reports.push(report.path),
                    Err(err) => {
                        log_error!("{err:#}");
                        return Err(err);
                    }
                }
            }
            frame = frames.recv() => {
                let Some(frame) = frame else {
                    log_info!("station {} capture ended", writer.category());
                    break StationEnd::CaptureEnded;
                };
                let outcome = scheduler.on_frame(&frame, Instant::now(), &mut store);
                if outcome != FrameOutcome::Throttled {
                    log_debug!("station {} frame outcome {outcome:?}", writer.category());
                }
            }
        }
    };

    Ok(StationSummary {
        end,
        reports,
        stats: scheduler.stats(),
        unflushed: store.snapshot(),
    })
}
