//! Endpoint and session configuration.
//!
//! On the web the configuration comes from the page URL query string so a
//! link can point the workbench at a given GeoServer/backend pair and
//! preselect an aquifer. Native builds read an optional JSON file named by
//! `GWLM_CONFIG` and then `GWLM_*` environment variables.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Runtime configuration for the workbench.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// WFS endpoint of the feature server.
    pub geoserver_url: String,
    /// Base URL of the backend controllers (time series, outliers, catalog).
    pub api_url: String,
    /// WFS namespace the aquifer and well layers are published under.
    pub workspace: String,
    /// WFS output format; `text/javascript` switches to JSONP.
    pub output_format: String,
    /// Spatial reference requested for returned geometries.
    pub srs_name: String,
    /// Region whose aquifer/variable catalog is loaded at startup.
    pub region_id: Option<String>,
    /// Aquifer selected at startup.
    pub initial_aquifer: Option<String>,
    /// Variable selected at startup.
    pub initial_variable: Option<String>,
    /// Token sent as `X-CSRFToken` on form posts.
    pub csrf_token: Option<String>,
    /// Request timeout for the native transport.
    pub request_timeout_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            geoserver_url: "http://127.0.0.1:8181/geoserver/wfs".to_string(),
            api_url: "http://127.0.0.1:8000/apps/gwlm".to_string(),
            workspace: "gwlm".to_string(),
            output_format: "application/json".to_string(),
            srs_name: "EPSG:4326".to_string(),
            region_id: None,
            initial_aquifer: None,
            initial_variable: None,
            csrf_token: None,
            request_timeout_secs: 30,
        }
    }
}

impl AppConfig {
    /// Loads configuration from the page URL.
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let mut config = Self::default();

        let Some(window) = web_sys::window() else {
            return config;
        };
        if let Ok(search) = window.location().search() {
            config.apply_query(&search);
        }
        if config.csrf_token.is_none() {
            config.csrf_token = csrf_from_cookie(&window);
        }

        config
    }

    /// Loads configuration from `GWLM_CONFIG` and the `GWLM_*` environment.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        let mut config = match std::env::var("GWLM_CONFIG") {
            Ok(path) => match std::fs::read_to_string(&path) {
                Ok(text) => match serde_json::from_str(&text) {
                    Ok(config) => {
                        log::info!("Loaded configuration from {}", path);
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}", path, e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}", path, e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        };

        config.apply_env(|key| std::env::var(key).ok());
        config
    }

    /// Applies `key=value` pairs from a URL query string (leading `?` optional).
    ///
    /// Unknown keys are ignored and values are percent-decoded.
    #[cfg(any(target_arch = "wasm32", test))]
    pub fn apply_query(&mut self, query: &str) {
        let query = query.trim_start_matches('?');
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            let mut kv = pair.splitn(2, '=');
            let key = kv.next().unwrap_or("");
            let raw = kv.next().unwrap_or("").replace('+', " ");
            let value = match urlencoding::decode(&raw) {
                Ok(v) => v.into_owned(),
                Err(e) => {
                    log::warn!("Ignoring undecodable query value for {}: {}", key, e);
                    continue;
                }
            };
            self.set(key, value);
        }
    }

    /// Applies `GWLM_*` variables via the given lookup.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        const KEYS: &[(&str, &str)] = &[
            ("GWLM_GEOSERVER_URL", "geoserver"),
            ("GWLM_API_URL", "api"),
            ("GWLM_WORKSPACE", "workspace"),
            ("GWLM_OUTPUT_FORMAT", "format"),
            ("GWLM_SRS_NAME", "srs"),
            ("GWLM_REGION", "region"),
            ("GWLM_AQUIFER", "aquifer"),
            ("GWLM_VARIABLE", "variable"),
            ("GWLM_CSRF_TOKEN", "csrf"),
            ("GWLM_TIMEOUT_SECS", "timeout"),
        ];

        for (var, key) in KEYS {
            if let Some(value) = lookup(var) {
                self.set(key, value);
            }
        }
    }

    fn set(&mut self, key: &str, value: String) {
        let optional = |v: String| if v.trim().is_empty() { None } else { Some(v) };
        match key {
            "geoserver" => self.geoserver_url = value,
            "api" => self.api_url = value,
            "workspace" => self.workspace = value,
            "format" => self.output_format = value,
            "srs" => self.srs_name = value,
            "region" => self.region_id = optional(value),
            "aquifer" => self.initial_aquifer = optional(value),
            "variable" => self.initial_variable = optional(value),
            "csrf" => self.csrf_token = optional(value),
            "timeout" => match value.parse() {
                Ok(secs) => self.request_timeout_secs = secs,
                Err(e) => log::warn!("Invalid timeout {:?}: {}", value, e),
            },
            _ => {}
        }
    }

    /// Transport timeout as a `Duration`.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Reads Django's `csrftoken` cookie from the hosting page.
#[cfg(target_arch = "wasm32")]
fn csrf_from_cookie(window: &web_sys::Window) -> Option<String> {
    use wasm_bindgen::JsCast;

    let document = window.document()?.dyn_into::<web_sys::HtmlDocument>().ok()?;
    let cookies = document.cookie().ok()?;
    cookies
        .split(';')
        .filter_map(|c| c.trim().split_once('='))
        .find(|(name, _)| *name == "csrftoken")
        .map(|(_, value)| value.to_string())
}
