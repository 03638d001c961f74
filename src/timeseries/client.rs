//! Backend client for well time series, outlier flags and region catalogs.
//!
//! Every endpoint answers with either `{"success": ..., <payload>}` or
//! `{"error": "<message>"}`. The envelope is checked first and only then is
//! the payload decoded, so each call yields a tagged `Result`.

use crate::config::AppConfig;
use crate::error::ClientError;
use crate::net::http::{self, HttpRequest};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Identifies one well/variable series within an aquifer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesRequest {
    pub aquifer_id: String,
    pub variable_id: String,
    pub well_id: String,
}

impl SeriesRequest {
    /// Form fields as the backend expects them.
    pub fn form_fields(&self) -> Vec<(String, String)> {
        vec![
            ("aquifer_id".to_string(), self.aquifer_id.clone()),
            ("variable_id".to_string(), self.variable_id.clone()),
            ("well_id".to_string(), self.well_id.clone()),
        ]
    }
}

/// Descriptive information about a well.
#[derive(Debug, Clone, PartialEq)]
pub struct WellInfo {
    pub well_name: String,
    /// Attribute summary, used verbatim as axis text.
    pub attr_dict: String,
}

/// A fetched series: well information plus `(timestamp_ms, value)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeSeriesResult {
    pub well_info: WellInfo,
    pub timeseries: Vec<(f64, f64)>,
}

/// Acknowledgement of an outlier flag request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutlierAck {
    /// The well's outlier state after the request, when reported.
    pub outlier: Option<bool>,
}

/// An aquifer choice in a region catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AquiferChoice {
    pub id: String,
    pub name: String,
}

/// A measured variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    pub id: String,
    pub display_name: String,
}

/// Aquifers and variables available in a region.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegionCatalog {
    pub aquifers: Vec<AquiferChoice>,
    pub variables: Vec<Variable>,
}

#[derive(Deserialize)]
struct RawWellInfo {
    well_name: String,
    #[serde(default)]
    attr_dict: Value,
}

#[derive(Deserialize)]
struct RawSeries {
    well_info: RawWellInfo,
    timeseries: Vec<(f64, f64)>,
}

#[derive(Deserialize)]
struct RawOutlier {
    #[serde(default)]
    outlier: Option<bool>,
}

#[derive(Deserialize)]
struct RawCatalog {
    #[serde(default)]
    aquifers_list: Vec<(String, Value)>,
    #[serde(default)]
    variables_list: Vec<(String, Value)>,
}

/// Renders an id that may arrive as a number or a string.
fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Checks the success/error envelope and decodes the payload.
fn decode_envelope<T: DeserializeOwned>(body: &str) -> Result<T, ClientError> {
    let value: Value = serde_json::from_str(body)?;
    let Some(object) = value.as_object() else {
        return Err(ClientError::ParseFailure(
            "response is not a JSON object".to_string(),
        ));
    };

    if let Some(error) = object.get("error") {
        return Err(ClientError::ValidationFailure(id_text(error)));
    }
    if !object.contains_key("success") {
        return Err(ClientError::ParseFailure(
            "response has neither success nor error".to_string(),
        ));
    }

    Ok(serde_json::from_value(value)?)
}

/// Parses a time-series response.
pub fn parse_time_series(body: &str) -> Result<TimeSeriesResult, ClientError> {
    let raw: RawSeries = decode_envelope(body)?;
    let attr_dict = match raw.well_info.attr_dict {
        Value::Null => String::new(),
        other => id_text(&other),
    };

    Ok(TimeSeriesResult {
        well_info: WellInfo {
            well_name: raw.well_info.well_name,
            attr_dict,
        },
        timeseries: raw.timeseries,
    })
}

/// Parses an outlier flag response.
pub fn parse_outlier(body: &str) -> Result<OutlierAck, ClientError> {
    let raw: RawOutlier = decode_envelope(body)?;
    Ok(OutlierAck {
        outlier: raw.outlier,
    })
}

/// Parses a region catalog response.
pub fn parse_catalog(body: &str) -> Result<RegionCatalog, ClientError> {
    let raw: RawCatalog = decode_envelope(body)?;
    Ok(RegionCatalog {
        aquifers: raw
            .aquifers_list
            .into_iter()
            .map(|(name, id)| AquiferChoice {
                id: id_text(&id),
                name,
            })
            .collect(),
        variables: raw
            .variables_list
            .into_iter()
            .map(|(display_name, id)| Variable {
                id: id_text(&id),
                display_name,
            })
            .collect(),
    })
}

/// Client for the backend controllers. Performs no retries.
#[derive(Debug, Clone)]
pub struct TimeSeriesClient {
    api_url: String,
    csrf_token: Option<String>,
    timeout: Duration,
}

impl TimeSeriesClient {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            csrf_token: None,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let mut client = Self::new(config.api_url.clone());
        client.csrf_token = config.csrf_token.clone();
        client.timeout = config.request_timeout();
        client
    }

    /// URL of a backend controller, e.g. `get-timeseries`.
    pub fn endpoint(&self, name: &str) -> String {
        format!("{}/{}/", self.api_url.trim_end_matches('/'), name)
    }

    fn form_request(&self, name: &str, form: Vec<(String, String)>) -> HttpRequest {
        let request = HttpRequest::post_form(self.endpoint(name), form).with_timeout(self.timeout);
        match &self.csrf_token {
            Some(token) => request.with_header("X-CSRFToken", token),
            None => request,
        }
    }

    /// Fetches the series of one well and variable.
    pub async fn fetch_time_series(
        &self,
        request: &SeriesRequest,
    ) -> Result<TimeSeriesResult, ClientError> {
        let body = http::send(&self.form_request("get-timeseries", request.form_fields())).await?;
        parse_time_series(&body)
    }

    /// Toggles the outlier flag of a well.
    pub async fn flag_outlier(&self, request: &SeriesRequest) -> Result<OutlierAck, ClientError> {
        let body = http::send(&self.form_request("set-outlier", request.form_fields())).await?;
        parse_outlier(&body)
    }

    /// Fetches the aquifers and variables of a region.
    pub async fn fetch_catalog(&self, region_id: &str) -> Result<RegionCatalog, ClientError> {
        let form = vec![("id".to_string(), region_id.to_string())];
        let body = http::send(&self.form_request("get-aquifers", form)).await?;
        parse_catalog(&body)
    }
}
