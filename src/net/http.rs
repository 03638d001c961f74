//! Minimal HTTP transport used by the feature and backend clients.
//!
//! The browser build goes through `fetch`; native builds use a blocking
//! `ureq` agent, which is fine because native requests always run on a
//! worker thread (see `RequestChannel`).

use crate::error::ClientError;
use std::time::Duration;

/// HTTP method used by the clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
        }
    }
}

/// A request ready to be sent.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    /// Form fields, sent url-encoded in the body of a POST.
    pub form: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            form: Vec::new(),
            headers: Vec::new(),
            timeout: Duration::from_secs(30),
        }
    }

    /// A form POST marked as an AJAX request (Django's `is_ajax()` check).
    pub fn post_form(url: impl Into<String>, form: Vec<(String, String)>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            form,
            headers: vec![("X-Requested-With".to_string(), "XMLHttpRequest".to_string())],
            timeout: Duration::from_secs(30),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The url-encoded form body.
    pub fn encoded_form(&self) -> String {
        encode_pairs(self.form.iter().map(|(k, v)| (k.as_str(), v.as_str())))
    }
}

/// Encodes `key=value` pairs joined by `&`.
pub fn encode_pairs<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    pairs
        .into_iter()
        .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Sends a request and returns the response body as text.
#[cfg(target_arch = "wasm32")]
pub async fn send(request: &HttpRequest) -> Result<String, ClientError> {
    use wasm_bindgen::{JsCast, JsValue};
    use wasm_bindgen_futures::JsFuture;

    let js_err = |e: JsValue| ClientError::NetworkFailure(format!("{:?}", e));

    let init = web_sys::RequestInit::new();
    init.set_method(request.method.as_str());
    init.set_mode(web_sys::RequestMode::Cors);

    let headers = web_sys::Headers::new().map_err(js_err)?;
    for (name, value) in &request.headers {
        headers.set(name, value).map_err(js_err)?;
    }
    if request.method == Method::Post {
        headers
            .set("Content-Type", "application/x-www-form-urlencoded")
            .map_err(js_err)?;
        init.set_body(&JsValue::from_str(&request.encoded_form()));
    }
    init.set_headers(&headers);

    let fetch_request =
        web_sys::Request::new_with_str_and_init(&request.url, &init).map_err(js_err)?;
    let window = web_sys::window()
        .ok_or_else(|| ClientError::NetworkFailure("no window available".to_string()))?;

    let response = JsFuture::from(window.fetch_with_request(&fetch_request))
        .await
        .map_err(js_err)?;
    let response: web_sys::Response = response.dyn_into().map_err(js_err)?;

    if !response.ok() {
        return Err(ClientError::NetworkFailure(format!(
            "HTTP {} {}",
            response.status(),
            response.status_text()
        )));
    }

    let text = JsFuture::from(response.text().map_err(js_err)?)
        .await
        .map_err(js_err)?;
    text.as_string()
        .ok_or_else(|| ClientError::ParseFailure("response body is not text".to_string()))
}

/// Sends a request and returns the response body as text.
///
/// Blocks the calling thread; only call from a worker.
#[cfg(not(target_arch = "wasm32"))]
pub async fn send(request: &HttpRequest) -> Result<String, ClientError> {
    let agent = ureq::AgentBuilder::new().timeout(request.timeout).build();
    let mut call = agent.request(request.method.as_str(), &request.url);
    for (name, value) in &request.headers {
        call = call.set(name, value);
    }

    let response = match request.method {
        Method::Get => call.call(),
        Method::Post => call
            .set("Content-Type", "application/x-www-form-urlencoded")
            .send_string(&request.encoded_form()),
    };

    let response = response.map_err(|e| match e {
        ureq::Error::Status(code, response) => {
            ClientError::NetworkFailure(format!("HTTP {} {}", code, response.status_text()))
        }
        ureq::Error::Transport(transport) => ClientError::NetworkFailure(transport.to_string()),
    })?;

    response
        .into_string()
        .map_err(|e| ClientError::NetworkFailure(e.to_string()))
}
