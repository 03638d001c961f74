//! WFS feature queries for aquifer boundaries and wells.
//!
//! The client is stateless: it builds a `GetFeature` URL, sends it, and
//! parses the GeoJSON answer. Tagging responses with request generations is
//! the caller's job.

use super::feature::{
    attributes_of, feature_id, features_of, point_of, polygons_of, BoundaryGeometry, WellFeature,
};
use crate::config::AppConfig;
use crate::error::ClientError;
use crate::net::http::{self, encode_pairs, HttpRequest};
use std::time::Duration;

/// Callback name GeoServer wraps JSONP output in.
const JSONP_CALLBACK: &str = "getJson";

/// Feature types published by the feature server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    Aquifer,
    Well,
}

impl FeatureType {
    fn layer_name(&self) -> &'static str {
        match self {
            FeatureType::Aquifer => "aquifer",
            FeatureType::Well => "well",
        }
    }
}

/// Server-side filter applied to a query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeatureFilter {
    /// Match a single feature id, e.g. `aquifer.24`.
    FeatureId(String),
    /// Match features whose attribute equals a value (CQL).
    AttributeEquals { attribute: String, value: String },
}

impl FeatureFilter {
    fn param(&self) -> (&'static str, String) {
        match self {
            FeatureFilter::FeatureId(id) => ("featureID", id.clone()),
            FeatureFilter::AttributeEquals { attribute, value } => {
                ("cql_filter", format!("{}={}", attribute, cql_literal(value)))
            }
        }
    }
}

/// Numeric ids go through unquoted, anything else as a quoted CQL string.
fn cql_literal(value: &str) -> String {
    if is_cql_number(value) {
        value.to_string()
    } else {
        format!("'{}'", value.replace('\'', "''"))
    }
}

/// Optional sign, digits, at most one dot. Words like `inf` or `NaN`
/// are not CQL numbers.
fn is_cql_number(value: &str) -> bool {
    let digits = value.strip_prefix(['-', '+']).unwrap_or(value);
    let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
    !(whole.is_empty() && fraction.is_empty())
        && whole.chars().all(|c| c.is_ascii_digit())
        && fraction.chars().all(|c| c.is_ascii_digit())
}

/// A `GetFeature` request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeatureQuery {
    pub feature_type: FeatureType,
    pub filter: FeatureFilter,
}

impl FeatureQuery {
    /// The boundary of exactly one aquifer.
    pub fn boundary(aquifer_id: &str) -> Self {
        Self {
            feature_type: FeatureType::Aquifer,
            filter: FeatureFilter::FeatureId(format!("aquifer.{}", aquifer_id)),
        }
    }

    /// All wells whose `aquifer_id` attribute equals the given id.
    pub fn wells(aquifer_id: &str) -> Self {
        Self {
            feature_type: FeatureType::Well,
            filter: FeatureFilter::AttributeEquals {
                attribute: "aquifer_id".to_string(),
                value: aquifer_id.to_string(),
            },
        }
    }
}

/// Protocol settings shared by every query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WfsSettings {
    pub workspace: String,
    pub output_format: String,
    pub srs_name: String,
}

impl WfsSettings {
    fn is_jsonp(&self) -> bool {
        self.output_format == "text/javascript"
    }
}

/// Client for the WFS feature service.
#[derive(Debug, Clone)]
pub struct GeoFeatureClient {
    base_url: String,
    settings: WfsSettings,
    timeout: Duration,
}

impl GeoFeatureClient {
    pub fn new(base_url: impl Into<String>, settings: WfsSettings) -> Self {
        Self {
            base_url: base_url.into(),
            settings,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        let settings = WfsSettings {
            workspace: config.workspace.clone(),
            output_format: config.output_format.clone(),
            srs_name: config.srs_name.clone(),
        };
        let mut client = Self::new(config.geoserver_url.clone(), settings);
        client.timeout = config.request_timeout();
        client
    }

    /// Full request URL for a query.
    pub fn query_url(&self, query: &FeatureQuery) -> String {
        let type_name = format!(
            "{}:{}",
            self.settings.workspace,
            query.feature_type.layer_name()
        );
        let (filter_key, filter_value) = query.filter.param();

        let mut params: Vec<(&str, &str)> = vec![
            ("service", "WFS"),
            ("version", "2.0.0"),
            ("request", "GetFeature"),
            ("typeName", type_name.as_str()),
            ("outputFormat", self.settings.output_format.as_str()),
        ];
        let format_options = format!("callback:{}", JSONP_CALLBACK);
        if self.settings.is_jsonp() {
            params.push(("format_options", format_options.as_str()));
        }
        params.push(("srsName", self.settings.srs_name.as_str()));
        params.push((filter_key, filter_value.as_str()));

        let separator = if self.base_url.contains('?') { '&' } else { '?' };
        format!("{}{}{}", self.base_url, separator, encode_pairs(params))
    }

    async fn query(&self, query: &FeatureQuery) -> Result<String, ClientError> {
        let request = HttpRequest::get(self.query_url(query)).with_timeout(self.timeout);
        log::debug!("WFS {}", request.url);
        http::send(&request).await
    }

    /// Fetches the boundary of one aquifer; `None` when the server has none.
    pub async fn fetch_boundary(
        &self,
        aquifer_id: &str,
    ) -> Result<Option<BoundaryGeometry>, ClientError> {
        let body = self.query(&FeatureQuery::boundary(aquifer_id)).await?;
        parse_boundary(&body)
    }

    /// Fetches every well of an aquifer.
    pub async fn fetch_wells(&self, aquifer_id: &str) -> Result<Vec<WellFeature>, ClientError> {
        let body = self.query(&FeatureQuery::wells(aquifer_id)).await?;
        parse_wells(&body)
    }
}

/// Removes a `callback(...)` JSONP wrapper if present.
pub fn strip_jsonp(body: &str) -> &str {
    let trimmed = body.trim();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        return trimmed;
    }
    match (trimmed.find('('), trimmed.rfind(')')) {
        (Some(open), Some(close)) if open < close => &trimmed[open + 1..close],
        _ => trimmed,
    }
}

/// Parses a boundary response. An empty collection yields `None`.
pub fn parse_boundary(body: &str) -> Result<Option<BoundaryGeometry>, ClientError> {
    let features = features_of(strip_jsonp(body)).map_err(ClientError::parse)?;

    let geometry = BoundaryGeometry {
        polygons: features
            .iter()
            .filter_map(|f| f.geometry.as_ref())
            .flat_map(polygons_of)
            .collect(),
    };

    if geometry.is_empty() {
        if !features.is_empty() {
            log::warn!(
                "Boundary response had {} feature(s) but no polygon geometry",
                features.len()
            );
        }
        return Ok(None);
    }

    Ok(Some(geometry))
}

/// Parses a wells response into point features.
///
/// Features without an id or a point geometry cannot be placed or clicked
/// and are skipped.
pub fn parse_wells(body: &str) -> Result<Vec<WellFeature>, ClientError> {
    let features = features_of(strip_jsonp(body)).map_err(ClientError::parse)?;
    let total = features.len();

    let wells: Vec<WellFeature> = features
        .iter()
        .filter_map(|feature| {
            let id = feature_id(feature)?;
            let location = feature.geometry.as_ref().and_then(point_of)?;
            Some(WellFeature {
                id,
                location,
                attributes: attributes_of(feature),
            })
        })
        .collect();

    if wells.len() < total {
        log::warn!(
            "Skipped {} well feature(s) without id or point geometry",
            total - wells.len()
        );
    }

    Ok(wells)
}
