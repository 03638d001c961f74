//! Request dispatch between the selection controller and the clients.
//!
//! Requests are async but egui's `update()` is synchronous. Every request is
//! spawned in the background and its outcome comes back as a `Completion`
//! through a channel that the UI drains each frame.

use crate::config::AppConfig;
use crate::error::ClientError;
use crate::geo::{BoundaryGeometry, GeoFeatureClient, WellFeature};
use crate::state::{Generation, Stream};
use crate::timeseries::{OutlierAck, RegionCatalog, SeriesRequest, TimeSeriesClient, TimeSeriesResult};
use eframe::egui;
use std::future::Future;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Outcome of one dispatched request, tagged with what was asked for.
#[derive(Debug, Clone)]
pub enum Completion {
    Boundary {
        aquifer_id: String,
        generation: Generation,
        result: Result<Option<BoundaryGeometry>, ClientError>,
    },
    Wells {
        aquifer_id: String,
        generation: Generation,
        result: Result<Vec<WellFeature>, ClientError>,
    },
    TimeSeries {
        request: SeriesRequest,
        generation: Generation,
        result: Result<TimeSeriesResult, ClientError>,
    },
    Outlier {
        request: SeriesRequest,
        result: Result<OutlierAck, ClientError>,
    },
    Catalog {
        region_id: String,
        generation: Generation,
        result: Result<RegionCatalog, ClientError>,
    },
}

impl Completion {
    /// The generation-guarded stream this completion belongs to.
    pub fn stream(&self) -> Option<Stream> {
        match self {
            Completion::Boundary { .. } => Some(Stream::Boundary),
            Completion::Wells { .. } => Some(Stream::Wells),
            Completion::TimeSeries { .. } => Some(Stream::TimeSeries),
            Completion::Catalog { .. } => Some(Stream::Catalog),
            Completion::Outlier { .. } => None,
        }
    }

    pub fn label(&self) -> &'static str {
        self.stream().map(|s| s.label()).unwrap_or("outlier")
    }

    pub fn is_ok(&self) -> bool {
        match self {
            Completion::Boundary { result, .. } => result.is_ok(),
            Completion::Wells { result, .. } => result.is_ok(),
            Completion::TimeSeries { result, .. } => result.is_ok(),
            Completion::Outlier { result, .. } => result.is_ok(),
            Completion::Catalog { result, .. } => result.is_ok(),
        }
    }
}

/// Starts requests and hands back their completions.
///
/// Every call returns immediately; the outcome arrives later via `poll()`.
pub trait RequestDispatcher {
    fn fetch_boundary(&self, aquifer_id: String, generation: Generation);
    fn fetch_wells(&self, aquifer_id: String, generation: Generation);
    fn fetch_time_series(&self, request: SeriesRequest, generation: Generation);
    fn flag_outlier(&self, request: SeriesRequest);
    fn fetch_catalog(&self, region_id: String, generation: Generation);

    /// Non-blocking check for a finished request.
    fn poll(&self) -> Option<Completion>;
}

/// Channel-based dispatcher backed by the real clients.
pub struct RequestChannel {
    sender: Sender<Completion>,
    receiver: Receiver<Completion>,
    features: GeoFeatureClient,
    series: TimeSeriesClient,
    ctx: egui::Context,
}

impl RequestChannel {
    pub fn new(ctx: egui::Context, features: GeoFeatureClient, series: TimeSeriesClient) -> Self {
        let (sender, receiver) = channel();
        Self {
            sender,
            receiver,
            features,
            series,
            ctx,
        }
    }

    pub fn from_config(ctx: egui::Context, config: &AppConfig) -> Self {
        Self::new(
            ctx,
            GeoFeatureClient::from_config(config),
            TimeSeriesClient::from_config(config),
        )
    }

    /// Runs a request on the browser's event loop.
    #[cfg(target_arch = "wasm32")]
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Completion> + 'static,
    {
        let sender = self.sender.clone();
        let ctx = self.ctx.clone();

        wasm_bindgen_futures::spawn_local(async move {
            let started = web_time::Instant::now();
            let completion = task.await;
            log_completion(&completion, started);
            let _ = sender.send(completion);
            ctx.request_repaint();
        });
    }

    /// Runs a request on a worker thread.
    #[cfg(not(target_arch = "wasm32"))]
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = Completion> + Send + 'static,
    {
        let sender = self.sender.clone();
        let ctx = self.ctx.clone();

        std::thread::spawn(move || {
            let started = web_time::Instant::now();
            let completion = pollster::block_on(task);
            log_completion(&completion, started);
            let _ = sender.send(completion);
            ctx.request_repaint();
        });
    }
}

fn log_completion(completion: &Completion, started: web_time::Instant) {
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    if completion.is_ok() {
        log::info!("{} request finished in {:.0} ms", completion.label(), elapsed_ms);
    } else {
        log::warn!("{} request failed after {:.0} ms", completion.label(), elapsed_ms);
    }
}

impl RequestDispatcher for RequestChannel {
    fn fetch_boundary(&self, aquifer_id: String, generation: Generation) {
        log::debug!(
            "Dispatching boundary request for {} (generation {})",
            aquifer_id,
            generation.0
        );
        let client = self.features.clone();
        self.spawn(async move {
            let result = client.fetch_boundary(&aquifer_id).await;
            Completion::Boundary {
                aquifer_id,
                generation,
                result,
            }
        });
    }

    fn fetch_wells(&self, aquifer_id: String, generation: Generation) {
        log::debug!(
            "Dispatching wells request for {} (generation {})",
            aquifer_id,
            generation.0
        );
        let client = self.features.clone();
        self.spawn(async move {
            let result = client.fetch_wells(&aquifer_id).await;
            Completion::Wells {
                aquifer_id,
                generation,
                result,
            }
        });
    }

    fn fetch_time_series(&self, request: SeriesRequest, generation: Generation) {
        log::debug!(
            "Dispatching time series request for {} (generation {})",
            request.well_id,
            generation.0
        );
        let client = self.series.clone();
        self.spawn(async move {
            let result = client.fetch_time_series(&request).await;
            Completion::TimeSeries {
                request,
                generation,
                result,
            }
        });
    }

    fn flag_outlier(&self, request: SeriesRequest) {
        let client = self.series.clone();
        self.spawn(async move {
            let result = client.flag_outlier(&request).await;
            Completion::Outlier { request, result }
        });
    }

    fn fetch_catalog(&self, region_id: String, generation: Generation) {
        log::debug!(
            "Dispatching catalog request for {} (generation {})",
            region_id,
            generation.0
        );
        let client = self.series.clone();
        self.spawn(async move {
            let result = client.fetch_catalog(&region_id).await;
            Completion::Catalog {
                region_id,
                generation,
                result,
            }
        });
    }

    fn poll(&self) -> Option<Completion> {
        self.receiver.try_recv().ok()
    }
}
