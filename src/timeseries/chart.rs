//! Chart description and presenter for well time series.

use super::client::TimeSeriesResult;

/// One plotted series of `(timestamp_ms, value)` points.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub name: String,
    pub data: Vec<[f64; 2]>,
}

/// Everything needed to draw a time-series chart.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub x_axis_title: String,
    pub y_axis_title: String,
    pub series: ChartSeries,
}

impl ChartSpec {
    /// Builds a chart for a fetched series.
    ///
    /// The title is the well name directly followed by the variable name and
    /// `" values"`, with no separator between the two names.
    pub fn from_result(result: &TimeSeriesResult, variable_name: &str) -> Self {
        let mut data: Vec<[f64; 2]> = result
            .timeseries
            .iter()
            .map(|&(t, v)| [t, v])
            .collect();
        data.sort_by(|a, b| a[0].total_cmp(&b[0]));

        Self {
            title: format!("{}{} values", result.well_info.well_name, variable_name),
            x_axis_title: result.well_info.attr_dict.clone(),
            y_axis_title: variable_name.to_string(),
            series: ChartSeries {
                name: variable_name.to_string(),
                data,
            },
        }
    }

    /// Value range of the series, if it has any points.
    pub fn value_range(&self) -> Option<(f64, f64)> {
        self.series.data.iter().fold(None, |acc, p| match acc {
            None => Some((p[1], p[1])),
            Some((lo, hi)) => Some((lo.min(p[1]), hi.max(p[1]))),
        })
    }

    /// Time range of the series, if it has any points.
    pub fn time_range(&self) -> Option<(f64, f64)> {
        match (self.series.data.first(), self.series.data.last()) {
            (Some(first), Some(last)) => Some((first[0], last[0])),
            _ => None,
        }
    }
}

/// Holds the chart currently on display.
#[derive(Debug, Default)]
pub struct ChartPresenter {
    current: Option<ChartSpec>,
    open: bool,
    displays: usize,
}

impl ChartPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces whatever chart was shown and opens the chart window.
    pub fn display(&mut self, result: &TimeSeriesResult, variable_name: &str) {
        let spec = ChartSpec::from_result(result, variable_name);
        self.displays += 1;
        log::debug!(
            "Displaying chart #{} '{}' with {} points",
            self.displays,
            spec.title,
            spec.series.data.len()
        );
        self.current = Some(spec);
        self.open = true;
    }

    pub fn current(&self) -> Option<&ChartSpec> {
        self.current.as_ref()
    }

    pub fn is_open(&self) -> bool {
        self.open && self.current.is_some()
    }

    /// Hides the chart window; the chart stays until the next display.
    pub fn close(&mut self) {
        self.open = false;
    }

    /// Shows the last chart again.
    pub fn reopen(&mut self) {
        self.open = self.current.is_some();
    }

    /// Number of display calls so far.
    #[cfg(test)]
    pub fn display_count(&self) -> usize {
        self.displays
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::client::WellInfo;

    fn result(name: &str, points: Vec<(f64, f64)>) -> TimeSeriesResult {
        TimeSeriesResult {
            well_info: WellInfo {
                well_name: name.to_string(),
                attr_dict: "Basin X".to_string(),
            },
            timeseries: points,
        }
    }

    #[test]
    fn test_chart_title_and_axes() {
        let spec = ChartSpec::from_result(
            &result("Well A", vec![(0.0, 10.0), (1.0, 12.0)]),
            "Water Level",
        );

        assert_eq!(spec.title, "Well AWater Level values");
        assert_eq!(spec.x_axis_title, "Basin X");
        assert_eq!(spec.y_axis_title, "Water Level");
        assert_eq!(spec.series.data, vec![[0.0, 10.0], [1.0, 12.0]]);
        assert_eq!(spec.value_range(), Some((10.0, 12.0)));
    }

    #[test]
    fn test_series_is_time_ordered() {
        let spec = ChartSpec::from_result(
            &result("W", vec![(5.0, 1.0), (2.0, 3.0), (9.0, 2.0)]),
            "Depth",
        );
        assert_eq!(spec.time_range(), Some((2.0, 9.0)));
        assert_eq!(spec.series.data[0], [2.0, 3.0]);
    }

    #[test]
    fn test_display_replaces_previous_chart() {
        let mut presenter = ChartPresenter::new();
        assert!(!presenter.is_open());

        presenter.display(&result("Well A", vec![(0.0, 1.0), (1.0, 2.0)]), "Level");
        presenter.close();
        assert!(!presenter.is_open());
        presenter.reopen();
        assert!(presenter.is_open());

        presenter.display(&result("Well B", vec![(3.0, 4.0)]), "Level");
        let current = presenter.current().unwrap();
        assert_eq!(current.title, "Well BLevel values");
        assert_eq!(current.series.data, vec![[3.0, 4.0]]);
        assert!(presenter.is_open());
        assert_eq!(presenter.display_count(), 2);
    }

    #[test]
    fn test_empty_series_has_no_ranges() {
        let spec = ChartSpec::from_result(&result("W", Vec::new()), "Level");
        assert!(spec.value_range().is_none());
        assert!(spec.time_range().is_none());
    }
}
