//! Selection controller: the single owner of selection and layer state.
//!
//! User actions come in through the `on_*` methods, which validate, update the
//! selection and dispatch requests. Finished requests come back through
//! `apply()`, which only lets a response through when its generation is still
//! the current one for its stream.

use super::selection::{Generation, Selection, Stream, StreamGenerations};
use super::status::StatusMessage;
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::geo::{LayerStore, PopupBinder};
use crate::net::{Completion, RequestDispatcher};
use crate::timeseries::{AquiferChoice, ChartPresenter, OutlierAck, SeriesRequest, Variable};

/// Orchestrates selection changes, layer loads and chart fetches.
pub struct SelectionController<D: RequestDispatcher> {
    dispatcher: D,
    selection: Selection,
    generations: StreamGenerations,
    layers: LayerStore,
    binder: PopupBinder,
    chart: ChartPresenter,
    aquifers: Vec<AquiferChoice>,
    variables: Vec<Variable>,
    status: StatusMessage,
    boundary_loading: bool,
    wells_loading: bool,
    series_loading: bool,
    catalog_loading: bool,
    outliers_pending: usize,
    /// Well id and outcome of the most recent outlier request.
    last_outlier: Option<(String, Result<OutlierAck, ClientError>)>,
    /// Layer results of the current aquifer load, joined into the status line.
    boundary_note: Option<String>,
    wells_note: Option<String>,
}

impl<D: RequestDispatcher> SelectionController<D> {
    pub fn new(dispatcher: D, binder: PopupBinder) -> Self {
        Self {
            dispatcher,
            selection: Selection::default(),
            generations: StreamGenerations::default(),
            layers: LayerStore::new(),
            binder,
            chart: ChartPresenter::new(),
            aquifers: Vec::new(),
            variables: Vec::new(),
            status: StatusMessage::default(),
            boundary_loading: false,
            wells_loading: false,
            series_loading: false,
            catalog_loading: false,
            outliers_pending: 0,
            last_outlier: None,
            boundary_note: None,
            wells_note: None,
        }
    }

    /// Applies the startup selection: region catalog, variable, then aquifer.
    ///
    /// A configured variable only sets the selection. The variable list stays
    /// empty until a catalog arrives, so the picker remains free text.
    pub fn apply_config(&mut self, config: &AppConfig) {
        if let Some(region_id) = &config.region_id {
            self.load_catalog(region_id);
        }
        if let Some(variable_id) = &config.initial_variable {
            self.on_variable_changed(variable_id);
        }
        if let Some(aquifer_id) = &config.initial_aquifer {
            self.on_aquifer_changed(aquifer_id);
        }
    }

    /// Replaces the known variables.
    #[cfg(test)]
    pub fn set_variables(&mut self, variables: Vec<Variable>) {
        self.variables = variables;
    }

    /// Requests the aquifer and variable lists of a region.
    pub fn load_catalog(&mut self, region_id: &str) {
        let generation = self.generations.advance(Stream::Catalog);
        self.catalog_loading = true;
        log::info!("Loading catalog for region {}", region_id);
        self.dispatcher
            .fetch_catalog(region_id.to_string(), generation);
    }

    /// Switches to another aquifer.
    ///
    /// Both layers are cleared right away and every in-flight layer and
    /// time-series response becomes stale. The well focus is dropped since
    /// it belonged to the previous aquifer.
    pub fn on_aquifer_changed(&mut self, aquifer_id: &str) {
        let aquifer_id = aquifer_id.trim();
        let boundary_gen = self.generations.advance(Stream::Boundary);
        let wells_gen = self.generations.advance(Stream::Wells);
        self.generations.advance(Stream::TimeSeries);
        self.series_loading = false;

        self.selection.aquifer_id = aquifer_id.to_string();
        self.selection.well_id = None;
        self.boundary_note = None;
        self.wells_note = None;
        self.layers.clear_boundary();
        self.layers.clear_wells();

        if aquifer_id.is_empty() {
            self.boundary_loading = false;
            self.wells_loading = false;
            self.status = StatusMessage::info("Select an aquifer");
            return;
        }

        log::info!("Aquifer changed to {}", aquifer_id);
        self.boundary_loading = true;
        self.wells_loading = true;
        self.status = StatusMessage::info(format!("Loading aquifer {}...", aquifer_id));
        self.dispatcher
            .fetch_boundary(aquifer_id.to_string(), boundary_gen);
        self.dispatcher.fetch_wells(aquifer_id.to_string(), wells_gen);
    }

    /// Changes the variable used by subsequent well clicks.
    pub fn on_variable_changed(&mut self, variable_id: &str) {
        self.selection.variable_id = variable_id.trim().to_string();
        log::debug!("Variable changed to {}", self.selection.variable_id);
    }

    /// Requests the time series of a clicked well.
    ///
    /// Fails with `InvalidSelection` before touching any state when the
    /// aquifer, the variable or the well id is missing.
    pub fn on_well_clicked(&mut self, well_id: &str) -> Result<(), ClientError> {
        let well_id = well_id.trim();
        let checked = if !self.selection.has_aquifer() {
            Err(ClientError::InvalidSelection("aquifer"))
        } else if !self.selection.has_variable() {
            Err(ClientError::InvalidSelection("variable"))
        } else if well_id.is_empty() {
            Err(ClientError::InvalidSelection("well"))
        } else {
            Ok(())
        };
        if let Err(err) = checked {
            log::warn!("Ignoring well click: {}", err);
            self.status = StatusMessage::error(err.to_string());
            return Err(err);
        }

        self.selection.well_id = Some(well_id.to_string());
        let request = SeriesRequest {
            aquifer_id: self.selection.aquifer_id.clone(),
            variable_id: self.selection.variable_id.clone(),
            well_id: well_id.to_string(),
        };
        let generation = self.generations.advance(Stream::TimeSeries);
        self.series_loading = true;
        self.status = StatusMessage::info(format!("Loading time series for well {}...", well_id));
        log::info!("Fetching time series for well {}", well_id);
        self.dispatcher.fetch_time_series(request, generation);
        Ok(())
    }

    /// Asks the backend to toggle the outlier flag of the focused well.
    pub fn on_flag_outlier(&mut self) -> Result<(), ClientError> {
        let Some(well_id) = self.selection.well_id.clone() else {
            let err = ClientError::NoWellSelected;
            self.status = StatusMessage::error(err.to_string());
            return Err(err);
        };

        let request = SeriesRequest {
            aquifer_id: self.selection.aquifer_id.clone(),
            variable_id: self.selection.variable_id.clone(),
            well_id,
        };
        log::info!("Flagging well {} as outlier", request.well_id);
        self.outliers_pending += 1;
        self.dispatcher.flag_outlier(request);
        Ok(())
    }

    /// Applies one finished request. Returns false when it was stale.
    pub fn apply(&mut self, completion: Completion) -> bool {
        if let Some(stream) = completion.stream() {
            let generation = completion_generation(&completion);
            if !self.generations.is_current(stream, generation) {
                log::debug!(
                    "Dropping stale {} response (generation {}, current {})",
                    stream.label(),
                    generation.0,
                    self.generations.current(stream).0
                );
                return false;
            }
        }

        match completion {
            Completion::Boundary {
                aquifer_id, result, ..
            } => {
                self.boundary_loading = false;
                match result {
                    Ok(Some(geometry)) => self.layers.replace_boundary(&aquifer_id, geometry),
                    Ok(None) => {
                        self.layers.clear_boundary();
                        self.boundary_note = Some(format!("No boundary found for aquifer {}", aquifer_id));
                        self.refresh_layer_status();
                    }
                    Err(err) => self.report("Boundary", err),
                }
            }
            Completion::Wells {
                aquifer_id, result, ..
            } => {
                self.wells_loading = false;
                match result {
                    Ok(features) => {
                        self.layers
                            .replace_wells(&aquifer_id, &features, &self.binder);
                        self.wells_note = Some(format!(
                            "Loaded {} well(s) for aquifer {}",
                            features.len(),
                            aquifer_id
                        ));
                        self.refresh_layer_status();
                    }
                    Err(err) => self.report("Wells", err),
                }
            }
            Completion::TimeSeries {
                request, result, ..
            } => {
                self.series_loading = false;
                match result {
                    Ok(series) => {
                        let variable_name = self.variable_name(&request.variable_id);
                        self.chart.display(&series, &variable_name);
                        self.status = StatusMessage::success(format!(
                            "Showing {} point(s) for {}",
                            series.timeseries.len(),
                            series.well_info.well_name
                        ));
                    }
                    Err(err) => self.report("Time series", err),
                }
            }
            Completion::Outlier { request, result } => {
                self.outliers_pending = self.outliers_pending.saturating_sub(1);
                match &result {
                    Ok(ack) => {
                        let text = match ack.outlier {
                            Some(true) => format!("Well {} is now flagged as an outlier", request.well_id),
                            Some(false) => format!("Well {} is no longer flagged as an outlier", request.well_id),
                            None => format!("Outlier flag updated for well {}", request.well_id),
                        };
                        log::info!("{}", text);
                        self.status = StatusMessage::success(text);
                    }
                    Err(err) => self.report("Outlier flag", err.clone()),
                }
                self.last_outlier = Some((request.well_id, result));
            }
            Completion::Catalog {
                region_id, result, ..
            } => {
                self.catalog_loading = false;
                match result {
                    Ok(catalog) => {
                        log::info!(
                            "Region {} has {} aquifer(s) and {} variable(s)",
                            region_id,
                            catalog.aquifers.len(),
                            catalog.variables.len()
                        );
                        self.aquifers = catalog.aquifers;
                        self.variables = catalog.variables;
                        if !self.selection.has_variable() {
                            if let Some(first) = self.variables.first() {
                                self.selection.variable_id = first.id.clone();
                            }
                        }
                    }
                    Err(err) => self.report("Catalog", err),
                }
            }
        }
        true
    }

    /// Drains every finished request. Returns how many were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Some(completion) = self.dispatcher.poll() {
            if self.apply(completion) {
                applied += 1;
            }
        }
        applied
    }

    /// Shows what the current aquifer load produced so far. An error from
    /// either layer stays on screen.
    fn refresh_layer_status(&mut self) {
        if self.status.is_error() {
            return;
        }
        self.status = match (&self.boundary_note, &self.wells_note) {
            (None, Some(wells)) => StatusMessage::success(wells.clone()),
            (Some(boundary), Some(wells)) => StatusMessage::info(format!("{}; {}", boundary, wells)),
            (Some(boundary), None) => StatusMessage::info(boundary.clone()),
            (None, None) => return,
        };
    }

    fn report(&mut self, what: &str, err: ClientError) {
        log::error!("{} request failed: {}", what, err);
        self.status = StatusMessage::error(format!("{}: {}", what, err));
    }

    /// Display name of a variable, falling back to its id.
    pub fn variable_name(&self, variable_id: &str) -> String {
        self.variables
            .iter()
            .find(|v| v.id == variable_id)
            .map(|v| v.display_name.clone())
            .unwrap_or_else(|| variable_id.to_string())
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn layers(&self) -> &LayerStore {
        &self.layers
    }

    pub fn chart(&self) -> &ChartPresenter {
        &self.chart
    }

    pub fn chart_mut(&mut self) -> &mut ChartPresenter {
        &mut self.chart
    }

    pub fn aquifers(&self) -> &[AquiferChoice] {
        &self.aquifers
    }

    pub fn variables(&self) -> &[Variable] {
        &self.variables
    }

    pub fn status(&self) -> &StatusMessage {
        &self.status
    }

    /// Outcome of the most recent outlier request.
    #[cfg(test)]
    pub fn last_outlier(&self) -> Option<&Result<OutlierAck, ClientError>> {
        self.last_outlier.as_ref().map(|(_, result)| result)
    }

    /// Outlier state the backend last reported for the focused well.
    pub fn focused_outlier_flag(&self) -> Option<bool> {
        let (well_id, result) = self.last_outlier.as_ref()?;
        if self.selection.well_id.as_deref() != Some(well_id.as_str()) {
            return None;
        }
        result.as_ref().ok()?.outlier
    }

    #[cfg(test)]
    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    pub fn is_loading_layers(&self) -> bool {
        self.boundary_loading || self.wells_loading
    }

    pub fn is_loading_series(&self) -> bool {
        self.series_loading
    }

    pub fn is_busy(&self) -> bool {
        self.is_loading_layers()
            || self.series_loading
            || self.catalog_loading
            || self.outliers_pending > 0
    }
}

fn completion_generation(completion: &Completion) -> Generation {
    match completion {
        Completion::Boundary { generation, .. }
        | Completion::Wells { generation, .. }
        | Completion::TimeSeries { generation, .. }
        | Completion::Catalog { generation, .. } => *generation,
        Completion::Outlier { .. } => Generation(0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::{BoundaryGeometry, MapEvent, WellFeature};
    use crate::timeseries::{RegionCatalog, TimeSeriesResult, WellInfo};
    use geo_types::{Coord, LineString, MultiPolygon, Polygon};
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::sync::mpsc::Receiver;

    #[derive(Debug, Clone, PartialEq)]
    enum Dispatched {
        Boundary(String, Generation),
        Wells(String, Generation),
        TimeSeries(SeriesRequest, Generation),
        Outlier(SeriesRequest),
        Catalog(String, Generation),
    }

    /// Records requests; completions are queued by hand in any order.
    #[derive(Default)]
    struct RecordingDispatcher {
        sent: RefCell<Vec<Dispatched>>,
        ready: RefCell<VecDeque<Completion>>,
    }

    impl RecordingDispatcher {
        fn sent(&self) -> Vec<Dispatched> {
            self.sent.borrow().clone()
        }

        fn complete(&self, completion: Completion) {
            self.ready.borrow_mut().push_back(completion);
        }
    }

    impl RequestDispatcher for RecordingDispatcher {
        fn fetch_boundary(&self, aquifer_id: String, generation: Generation) {
            self.sent
                .borrow_mut()
                .push(Dispatched::Boundary(aquifer_id, generation));
        }

        fn fetch_wells(&self, aquifer_id: String, generation: Generation) {
            self.sent
                .borrow_mut()
                .push(Dispatched::Wells(aquifer_id, generation));
        }

        fn fetch_time_series(&self, request: SeriesRequest, generation: Generation) {
            self.sent
                .borrow_mut()
                .push(Dispatched::TimeSeries(request, generation));
        }

        fn flag_outlier(&self, request: SeriesRequest) {
            self.sent.borrow_mut().push(Dispatched::Outlier(request));
        }

        fn fetch_catalog(&self, region_id: String, generation: Generation) {
            self.sent
                .borrow_mut()
                .push(Dispatched::Catalog(region_id, generation));
        }

        fn poll(&self) -> Option<Completion> {
            self.ready.borrow_mut().pop_front()
        }
    }

    fn controller() -> (SelectionController<RecordingDispatcher>, Receiver<MapEvent>) {
        let (binder, events) = PopupBinder::channel();
        let mut controller = SelectionController::new(RecordingDispatcher::default(), binder);
        controller.set_variables(vec![Variable {
            id: "1".into(),
            display_name: "Water Level".into(),
        }]);
        (controller, events)
    }

    fn square(offset: f64) -> BoundaryGeometry {
        let ring = LineString::from(vec![
            (offset, offset),
            (offset + 1.0, offset),
            (offset + 1.0, offset + 1.0),
            (offset, offset),
        ]);
        BoundaryGeometry {
            polygons: MultiPolygon(vec![Polygon::new(ring, vec![])]),
        }
    }

    fn well(id: &str) -> WellFeature {
        WellFeature {
            id: id.to_string(),
            location: Coord { x: 0.5, y: 0.5 },
            attributes: vec![("depth".into(), "120ft".into())],
        }
    }

    fn series(name: &str) -> TimeSeriesResult {
        TimeSeriesResult {
            well_info: WellInfo {
                well_name: name.to_string(),
                attr_dict: "Basin X".to_string(),
            },
            timeseries: vec![(0.0, 10.0), (1.0, 12.0)],
        }
    }

    fn boundary_done(aquifer: &str, generation: Generation, offset: f64) -> Completion {
        Completion::Boundary {
            aquifer_id: aquifer.to_string(),
            generation,
            result: Ok(Some(square(offset))),
        }
    }

    fn wells_done(aquifer: &str, generation: Generation, ids: &[&str]) -> Completion {
        Completion::Wells {
            aquifer_id: aquifer.to_string(),
            generation,
            result: Ok(ids.iter().map(|id| well(id)).collect()),
        }
    }

    #[test]
    fn test_aquifer_change_fetches_both_layers() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");

        assert_eq!(
            c.dispatcher().sent(),
            vec![
                Dispatched::Boundary("24".into(), Generation(1)),
                Dispatched::Wells("24".into(), Generation(1)),
            ]
        );
        assert!(c.is_loading_layers());
    }

    #[test]
    fn test_stale_layer_responses_are_dropped() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("A");
        c.on_aquifer_changed("B");

        // B resolves first, then A's late responses arrive
        c.dispatcher().complete(boundary_done("B", Generation(2), 10.0));
        c.dispatcher().complete(wells_done("B", Generation(2), &["b1"]));
        c.dispatcher().complete(boundary_done("A", Generation(1), 0.0));
        c.dispatcher().complete(wells_done("A", Generation(1), &["a1", "a2"]));
        assert_eq!(c.pump(), 2);

        assert_eq!(c.layers().boundary().unwrap().aquifer_id, "B");
        assert_eq!(c.layers().wells().unwrap().aquifer_id, "B");
        assert_eq!(c.layers().markers().len(), 1);
        assert_eq!(c.layers().markers()[0].well_id, "b1");
        assert!(!c.is_loading_layers());
    }

    #[test]
    fn test_old_wells_never_mix_with_new_boundary() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("A");
        c.dispatcher().complete(wells_done("A", Generation(1), &["a1"]));
        c.pump();
        assert_eq!(c.layers().markers().len(), 1);

        c.on_aquifer_changed("B");
        assert!(c.layers().wells().is_none());

        c.dispatcher().complete(boundary_done("B", Generation(2), 5.0));
        c.pump();
        assert_eq!(c.layers().boundary().unwrap().aquifer_id, "B");
        assert!(c.layers().markers().is_empty());
    }

    #[test]
    fn test_layer_failure_leaves_other_layer_alone() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");
        c.dispatcher().complete(Completion::Boundary {
            aquifer_id: "24".into(),
            generation: Generation(1),
            result: Err(ClientError::NetworkFailure("HTTP 502 Bad Gateway".into())),
        });
        c.dispatcher().complete(wells_done("24", Generation(1), &["w1", "w2"]));
        c.pump();

        assert!(c.layers().boundary().is_none());
        assert_eq!(c.layers().markers().len(), 2);
        assert!(c.status().is_error());
    }

    #[test]
    fn test_empty_boundary_clears_layer() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("99");
        c.dispatcher().complete(Completion::Boundary {
            aquifer_id: "99".into(),
            generation: Generation(1),
            result: Ok(None),
        });
        c.pump();

        assert!(c.layers().boundary().is_none());
        assert!(c.status().text.contains("No boundary"));
    }

    #[test]
    fn test_empty_aquifer_clears_without_fetching() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("");
        assert!(c.dispatcher().sent().is_empty());
        assert!(!c.is_loading_layers());
    }

    #[test]
    fn test_well_click_without_variable_is_invalid() {
        let (binder, _events) = PopupBinder::channel();
        let mut c = SelectionController::new(RecordingDispatcher::default(), binder);
        c.on_aquifer_changed("24");
        let before = c.dispatcher().sent().len();

        let err = c.on_well_clicked("W42").unwrap_err();
        assert_eq!(err, ClientError::InvalidSelection("variable"));
        assert_eq!(c.dispatcher().sent().len(), before);
        assert_eq!(c.selection().well_id, None);
    }

    #[test]
    fn test_well_click_without_aquifer_is_invalid() {
        let (mut c, _events) = controller();
        c.on_variable_changed("1");

        let err = c.on_well_clicked("W42").unwrap_err();
        assert_eq!(err, ClientError::InvalidSelection("aquifer"));
        assert!(err.is_client_input());
        assert!(c.dispatcher().sent().is_empty());
    }

    #[test]
    fn test_well_click_fetches_and_displays_chart() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");
        c.on_variable_changed("1");
        c.on_well_clicked("W42").unwrap();

        let request = SeriesRequest {
            aquifer_id: "24".into(),
            variable_id: "1".into(),
            well_id: "W42".into(),
        };
        let series_calls: Vec<_> = c
            .dispatcher()
            .sent()
            .into_iter()
            .filter(|d| matches!(d, Dispatched::TimeSeries(..)))
            .collect();
        assert_eq!(series_calls, vec![Dispatched::TimeSeries(request.clone(), Generation(2))]);

        c.dispatcher().complete(Completion::TimeSeries {
            request,
            generation: Generation(2),
            result: Ok(series("Well A")),
        });
        c.pump();

        assert_eq!(c.chart().display_count(), 1);
        let chart = c.chart().current().unwrap();
        assert_eq!(chart.title, "Well AWater Level values");
        assert_eq!(chart.series.data, vec![[0.0, 10.0], [1.0, 12.0]]);
    }

    #[test]
    fn test_only_latest_well_click_is_charted() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");
        c.on_variable_changed("1");
        c.on_well_clicked("W1").unwrap();
        c.on_well_clicked("W2").unwrap();

        let request = |well: &str| SeriesRequest {
            aquifer_id: "24".into(),
            variable_id: "1".into(),
            well_id: well.into(),
        };
        c.dispatcher().complete(Completion::TimeSeries {
            request: request("W2"),
            generation: Generation(3),
            result: Ok(series("Second")),
        });
        c.dispatcher().complete(Completion::TimeSeries {
            request: request("W1"),
            generation: Generation(2),
            result: Ok(series("First")),
        });
        c.pump();

        assert_eq!(c.chart().display_count(), 1);
        assert_eq!(c.chart().current().unwrap().title, "SecondWater Level values");
    }

    #[test]
    fn test_time_series_failure_shows_no_chart() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");
        c.on_variable_changed("1");
        c.on_well_clicked("W42").unwrap();
        let selection = c.selection().clone();

        c.dispatcher().complete(Completion::TimeSeries {
            request: SeriesRequest {
                aquifer_id: "24".into(),
                variable_id: "1".into(),
                well_id: "W42".into(),
            },
            generation: Generation(2),
            result: Err(ClientError::ValidationFailure("Well id is faulty.".into())),
        });
        c.pump();

        assert!(c.chart().current().is_none());
        assert!(c.status().is_error());
        assert_eq!(c.selection(), &selection);
    }

    #[test]
    fn test_flag_outlier_requires_well() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");
        c.on_variable_changed("1");
        let before = c.dispatcher().sent().len();

        assert_eq!(c.on_flag_outlier(), Err(ClientError::NoWellSelected));
        assert_eq!(c.dispatcher().sent().len(), before);
    }

    #[test]
    fn test_flag_outlier_reports_new_state() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");
        c.on_variable_changed("1");
        c.on_well_clicked("W42").unwrap();
        c.on_flag_outlier().unwrap();

        let request = match c.dispatcher().sent().last() {
            Some(Dispatched::Outlier(request)) => request.clone(),
            other => panic!("unexpected dispatch {:?}", other),
        };
        assert_eq!(request.well_id, "W42");
        assert!(c.is_busy());

        let selection = c.selection().clone();
        c.dispatcher().complete(Completion::Outlier {
            request,
            result: Ok(OutlierAck {
                outlier: Some(true),
            }),
        });
        c.pump();

        assert!(matches!(c.last_outlier(), Some(Ok(_))));
        assert!(c.status().text.contains("flagged as an outlier"));
        assert_eq!(c.selection(), &selection);
    }

    #[test]
    fn test_aquifer_change_drops_well_focus_and_pending_series() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("A");
        c.on_variable_changed("1");
        c.on_well_clicked("W1").unwrap();
        c.on_aquifer_changed("B");

        assert_eq!(c.selection().well_id, None);
        c.dispatcher().complete(Completion::TimeSeries {
            request: SeriesRequest {
                aquifer_id: "A".into(),
                variable_id: "1".into(),
                well_id: "W1".into(),
            },
            generation: Generation(2),
            result: Ok(series("Late")),
        });
        assert_eq!(c.pump(), 0);
        assert!(c.chart().current().is_none());
    }

    #[test]
    fn test_marker_click_routes_to_controller() {
        let (mut c, events) = controller();
        c.on_aquifer_changed("24");
        c.on_variable_changed("1");
        c.dispatcher().complete(wells_done("24", Generation(1), &["W42"]));
        c.pump();

        c.layers().markers()[0].click();
        while let Ok(MapEvent::WellClicked(id)) = events.try_recv() {
            c.on_well_clicked(&id).unwrap();
        }
        assert_eq!(c.selection().well_id.as_deref(), Some("W42"));
    }

    #[test]
    fn test_catalog_replaces_lists_and_picks_variable() {
        let (binder, _events) = PopupBinder::channel();
        let mut c = SelectionController::new(RecordingDispatcher::default(), binder);
        c.load_catalog("3");
        c.load_catalog("4");

        let catalog = |name: &str| RegionCatalog {
            aquifers: vec![AquiferChoice {
                id: "24".into(),
                name: name.into(),
            }],
            variables: vec![Variable {
                id: "1".into(),
                display_name: "Water Level, ft".into(),
            }],
        };
        c.dispatcher().complete(Completion::Catalog {
            region_id: "3".into(),
            generation: Generation(1),
            result: Ok(catalog("Stale")),
        });
        c.dispatcher().complete(Completion::Catalog {
            region_id: "4".into(),
            generation: Generation(2),
            result: Ok(catalog("Basin X")),
        });
        c.pump();

        assert_eq!(c.aquifers()[0].name, "Basin X");
        assert_eq!(c.selection().variable_id, "1");
        assert_eq!(c.variable_name("1"), "Water Level, ft");
        assert_eq!(c.variable_name("9"), "9");
    }

    #[test]
    fn test_flag_outlier_failure_keeps_selection() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");
        c.on_variable_changed("1");
        c.dispatcher().complete(boundary_done("24", Generation(1), 0.0));
        c.dispatcher().complete(wells_done("24", Generation(1), &["W42"]));
        c.pump();
        c.on_well_clicked("W42").unwrap();
        c.on_flag_outlier().unwrap();
        let selection = c.selection().clone();

        c.dispatcher().complete(Completion::Outlier {
            request: SeriesRequest {
                aquifer_id: "24".into(),
                variable_id: "1".into(),
                well_id: "W42".into(),
            },
            result: Err(ClientError::NetworkFailure("HTTP 500 Internal Server Error".into())),
        });
        assert_eq!(c.pump(), 1);

        assert_eq!(c.selection(), &selection);
        assert_eq!(c.layers().boundary().unwrap().aquifer_id, "24");
        assert_eq!(c.layers().markers().len(), 1);
        assert!(matches!(
            c.last_outlier(),
            Some(Err(ClientError::NetworkFailure(_)))
        ));
        assert_eq!(c.focused_outlier_flag(), None);
        assert!(c.status().is_error());
    }

    #[test]
    fn test_outlier_flag_follows_focused_well() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");
        c.on_variable_changed("1");
        c.on_well_clicked("W1").unwrap();
        c.on_flag_outlier().unwrap();
        c.dispatcher().complete(Completion::Outlier {
            request: SeriesRequest {
                aquifer_id: "24".into(),
                variable_id: "1".into(),
                well_id: "W1".into(),
            },
            result: Ok(OutlierAck {
                outlier: Some(true),
            }),
        });
        c.pump();
        assert_eq!(c.focused_outlier_flag(), Some(true));

        c.on_well_clicked("W2").unwrap();
        assert_eq!(c.focused_outlier_flag(), None);
    }

    #[test]
    fn test_layer_failure_keeps_displayed_chart() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("24");
        c.on_variable_changed("1");
        c.on_well_clicked("W42").unwrap();
        c.dispatcher().complete(Completion::TimeSeries {
            request: SeriesRequest {
                aquifer_id: "24".into(),
                variable_id: "1".into(),
                well_id: "W42".into(),
            },
            generation: Generation(2),
            result: Ok(series("Well A")),
        });
        c.pump();
        let shown = c.chart().current().cloned();
        assert!(shown.is_some());

        c.dispatcher().complete(Completion::Boundary {
            aquifer_id: "24".into(),
            generation: Generation(1),
            result: Err(ClientError::NetworkFailure("connection reset".into())),
        });
        c.dispatcher().complete(Completion::Wells {
            aquifer_id: "24".into(),
            generation: Generation(1),
            result: Err(ClientError::ParseFailure("expected value at line 1".into())),
        });
        assert_eq!(c.pump(), 2);

        assert_eq!(c.chart().current().cloned(), shown);
        assert!(c.chart().is_open());
        assert_eq!(c.chart().display_count(), 1);
        assert!(c.status().is_error());
    }

    #[test]
    fn test_missing_boundary_note_survives_wells_load() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("99");
        c.dispatcher().complete(Completion::Boundary {
            aquifer_id: "99".into(),
            generation: Generation(1),
            result: Ok(None),
        });
        c.dispatcher().complete(wells_done("99", Generation(1), &["w1", "w2"]));
        c.pump();

        assert!(c.status().text.contains("No boundary found for aquifer 99"));
        assert!(c.status().text.contains("Loaded 2 well(s)"));
        assert!(!c.status().is_error());
    }

    #[test]
    fn test_missing_boundary_after_wells_keeps_well_count() {
        let (mut c, _events) = controller();
        c.on_aquifer_changed("99");
        c.dispatcher().complete(wells_done("99", Generation(1), &["w1"]));
        c.dispatcher().complete(Completion::Boundary {
            aquifer_id: "99".into(),
            generation: Generation(1),
            result: Ok(None),
        });
        c.pump();

        assert!(c.status().text.contains("No boundary found for aquifer 99"));
        assert!(c.status().text.contains("Loaded 1 well(s)"));
    }

    #[test]
    fn test_configured_variable_keeps_free_text_picker() {
        let (binder, _events) = PopupBinder::channel();
        let mut c = SelectionController::new(RecordingDispatcher::default(), binder);
        let config = AppConfig {
            initial_variable: Some("7".into()),
            initial_aquifer: Some("24".into()),
            ..AppConfig::default()
        };
        c.apply_config(&config);

        assert!(c.variables().is_empty());
        assert_eq!(c.selection().variable_id, "7");
        assert_eq!(c.selection().aquifer_id, "24");
        assert_eq!(c.variable_name("7"), "7");

        // Still editable to any other id
        c.on_variable_changed("8");
        assert_eq!(c.selection().variable_id, "8");
    }

    #[test]
    fn test_configured_region_loads_catalog_first() {
        let (binder, _events) = PopupBinder::channel();
        let mut c = SelectionController::new(RecordingDispatcher::default(), binder);
        let config = AppConfig {
            region_id: Some("3".into()),
            initial_aquifer: Some("24".into()),
            ..AppConfig::default()
        };
        c.apply_config(&config);

        assert_eq!(
            c.dispatcher().sent(),
            vec![
                Dispatched::Catalog("3".into(), Generation(1)),
                Dispatched::Boundary("24".into(), Generation(1)),
                Dispatched::Wells("24".into(), Generation(1)),
            ]
        );
    }
}
