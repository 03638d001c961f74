//! Well time series: backend client and chart presentation.

mod chart;
mod client;

pub use chart::{ChartPresenter, ChartSpec};
pub use client::{
    AquiferChoice, OutlierAck, RegionCatalog, SeriesRequest, TimeSeriesClient, TimeSeriesResult,
    Variable,
};
#[cfg(test)]
pub use client::WellInfo;
