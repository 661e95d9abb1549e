use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::driver::driver::{AutomationDriver, Bounds, ElementRef, PerfSample, Selector};
use crate::error::DriverError;

/// Response envelope returned by the on-device automation server.
#[derive(Debug, Deserialize)]
pub struct DriverResponse {
    pub ok: bool,
    #[serde(default)]
    pub error: Option<String>,
    /// Machine-readable error kind: "not_found" or "not_launchable"
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Driver backed by an HTTP/JSON automation server running next to the
/// device (one POST per command, `{ "ok": bool, "data": ... }` back).
pub struct HttpDriver {
    endpoint: String,
    client: reqwest::blocking::Client,
}

impl HttpDriver {
    pub fn new(endpoint: &str, timeout_ms: u64) -> Result<Self, DriverError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_millis(timeout_ms))
            .build()?;
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            client,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn url(&self, command: &str) -> String {
        format!("{}/{}", self.endpoint, command)
    }

    /// Send a command and return the raw envelope.
    fn send(&self, command: &str, body: &Value) -> Result<DriverResponse, DriverError> {
        let response = self.client.post(self.url(command)).json(body).send()?;
        let text = response.text()?;
        serde_json::from_str(&text).map_err(|e| DriverError::Json {
            context: format!("{} response", command),
            source: e,
        })
    }

    /// Send a command and map `ok == false` onto a typed error.
    fn send_ok(&self, command: &str, body: &Value) -> Result<DriverResponse, DriverError> {
        let response = self.send(command, body)?;
        if response.ok {
            return Ok(response);
        }
        let error = response.error.unwrap_or_else(|| "Unknown error".into());
        Err(match response.kind.as_deref() {
            Some("not_found") => DriverError::NotFound(error),
            Some("not_launchable") => DriverError::NotLaunchable(error),
            _ => DriverError::Protocol {
                command: command.into(),
                error,
            },
        })
    }

    /// Send a command and decode its `data` payload.
    fn query<T: DeserializeOwned>(&self, command: &str, body: &Value) -> Result<T, DriverError> {
        let response = self.send_ok(command, body)?;
        let data = response.data.unwrap_or(Value::Null);
        serde_json::from_value(data).map_err(|e| DriverError::Json {
            context: format!("{} data", command),
            source: e,
        })
    }

    /// Best-effort variant of `query`: any failure reads as absence.
    fn query_opt<T: DeserializeOwned>(&self, command: &str, body: &Value) -> Option<T> {
        match self.query::<Option<T>>(command, body) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(command, error = %e, "best-effort query failed");
                None
            }
        }
    }
}

impl AutomationDriver for HttpDriver {
    fn foreground_package(&mut self) -> Result<String, DriverError> {
        self.query("foreground_package", &json!({}))
    }

    fn foreground_screen_name(&mut self) -> Option<String> {
        self.query_opt("foreground_screen_name", &json!({}))
    }

    fn snapshot_root(&mut self) -> Result<Option<ElementRef>, DriverError> {
        self.query("snapshot_root", &json!({}))
    }

    fn class_name(&mut self, node: &ElementRef) -> Option<String> {
        self.query_opt("class_name", &json!({ "element": node }))
    }

    fn children(&mut self, node: &ElementRef) -> Vec<ElementRef> {
        self.query_opt("children", &json!({ "element": node }))
            .unwrap_or_default()
    }

    fn enumerate_clickable(&mut self, root: &ElementRef) -> Vec<ElementRef> {
        self.query_opt("enumerate_clickable", &json!({ "element": root }))
            .unwrap_or_default()
    }

    fn find_elements(&mut self, selector: &Selector) -> Vec<ElementRef> {
        self.query_opt("find_elements", &json!({ "selector": selector }))
            .unwrap_or_default()
    }

    fn exists(&mut self, element: &ElementRef) -> bool {
        self.query_opt("exists", &json!({ "element": element }))
            .unwrap_or(false)
    }

    fn text(&mut self, element: &ElementRef) -> Option<String> {
        self.query_opt("text", &json!({ "element": element }))
    }

    fn description(&mut self, element: &ElementRef) -> Option<String> {
        self.query_opt("description", &json!({ "element": element }))
    }

    fn bounds(&mut self, element: &ElementRef) -> Option<Bounds> {
        self.query_opt("bounds", &json!({ "element": element }))
    }

    fn activate(&mut self, element: &ElementRef) -> Result<(), DriverError> {
        self.send_ok("click", &json!({ "element": element }))?;
        Ok(())
    }

    fn input_text(&mut self, element: &ElementRef, text: &str) -> Result<(), DriverError> {
        self.send_ok("set_text", &json!({ "element": element, "text": text }))?;
        Ok(())
    }

    fn press_back(&mut self) -> Result<(), DriverError> {
        self.send_ok("press_back", &json!({}))?;
        Ok(())
    }

    fn launch_app(&mut self, package: &str) -> Result<(), DriverError> {
        self.send_ok("launch", &json!({ "package": package, "clear_task": true }))?;
        Ok(())
    }

    fn wait_for_foreground(&mut self, package: &str, timeout_ms: u64) -> bool {
        self.query_opt(
            "wait_for_foreground",
            &json!({ "package": package, "timeout_ms": timeout_ms }),
        )
        .unwrap_or(false)
    }

    fn wait_for_idle(&mut self, timeout_ms: u64) {
        if let Err(e) = self.send_ok("wait_for_idle", &json!({ "timeout_ms": timeout_ms })) {
            tracing::debug!(error = %e, "wait_for_idle failed");
        }
    }

    fn take_screenshot(&mut self, path: &Path) -> Result<(), DriverError> {
        let response = self
            .client
            .post(self.url("screenshot"))
            .json(&json!({ "format": "png" }))
            .send()?
            .error_for_status()?;
        let bytes = response.bytes()?;
        std::fs::write(path, &bytes)?;
        Ok(())
    }

    fn sample_performance(&mut self, package: &str) -> Option<PerfSample> {
        self.query_opt("performance", &json!({ "package": package }))
    }
}
