use anyhow::{bail, Context, Result};
use image::DynamicImage;
use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::report::ReportWriter;
use crate::settings::Settings;

use super::loop_worker::{station_loop, StationSummary};
use super::oracle::{Classifier, FaceLocator};
use super::scheduler::SamplingScheduler;

/// Owns the background task of a single station.
pub struct StationController {
    handle: Option<JoinHandle<Result<StationSummary>>>,
    cancel_token: Option<CancellationToken>,
}

impl StationController {
    pub fn new() -> Self {
        Self {
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn start<L, C>(
        &mut self,
        frames: mpsc::Receiver<DynamicImage>,
        scheduler: SamplingScheduler<L, C>,
        writer: ReportWriter,
        report_interval: Duration,
    ) -> Result<()>
    where
        L: FaceLocator + Send + 'static,
        C: Classifier + Send + 'static,
    {
        if self.is_running() {
            bail!("station already active");
        }
        if self.handle.take().is_some() {
            // The previous loop already returned on its own; its summary is dropped.
            info!("Replacing finished station task");
        }
        if report_interval.is_zero() {
            bail!("report interval must be greater than zero");
        }

        info!("Starting station {}", writer.category());
        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(station_loop(
            frames,
            scheduler,
            writer,
            report_interval,
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        Ok(())
    }

    /// Starts a station configured by `settings`: the scheduler takes its
    /// interval, padding and confidence from `settings.station`, and reports
    /// go to `settings.station.category` under the configured data root.
    pub fn start_from_settings<L, C>(
        &mut self,
        frames: mpsc::Receiver<DynamicImage>,
        locator: L,
        classifier: C,
        settings: &Settings,
    ) -> Result<()>
    where
        L: FaceLocator + Send + 'static,
        C: Classifier + Send + 'static,
    {
        let station = &settings.station;
        let writer = ReportWriter::new(settings.layout(), station.category.as_str())?;
        let scheduler = SamplingScheduler::from_settings(locator, classifier, station);
        self.start(frames, scheduler, writer, station.report_interval())
    }

    /// Cancels the loop if it is still running and returns its summary.
    pub async fn stop(&mut self) -> Result<Option<StationSummary>> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        match self.handle.take() {
            Some(handle) => handle
                .await
                .context("station loop task failed to join")?
                .map(Some),
            None => Ok(None),
        }
    }
}

impl Default for StationController {
    fn default() -> Self {
        Self::new()
    }
}
