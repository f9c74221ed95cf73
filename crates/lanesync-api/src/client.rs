// Printer API HTTP client
//
// Wraps `reqwest::Client` with URL construction and `{"result": ...}`
// envelope unwrapping. Every method returns the unwrapped payload; the
// envelope never reaches the caller.

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, trace};
use url::Url;

use crate::error::Error;
use crate::models::RpcEnvelope;
use crate::transport::TransportConfig;

/// Key the status endpoint files the filament-changer section under.
/// The trailing colon is part of the wire format.
const AFC_STATUS_KEY: &str = "status:";
const AFC_OBJECT: &str = "AFC";

/// Raw HTTP client for the printer's request/response API.
#[derive(Debug, Clone)]
pub struct PrinterClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PrinterClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the API root, e.g. `http://printer.local:7125`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client around a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The API base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    // ── Endpoints ────────────────────────────────────────────────────

    /// Fetch the full filament-changer snapshot.
    ///
    /// Returns the mapping of `"system"` plus one entry per unit.
    pub async fn afc_status(&self) -> Result<Map<String, Value>, Error> {
        let result = self.post("printer/afc/status", &json!({})).await?;

        let section = result
            .get(AFC_STATUS_KEY)
            .or_else(|| result.get("status"))
            .and_then(|status| status.get(AFC_OBJECT));

        match section {
            Some(Value::Object(map)) => Ok(map.clone()),
            Some(other) => Err(Error::UnexpectedShape(format!(
                "AFC status is {}, expected an object",
                type_name(other)
            ))),
            None => Err(Error::UnexpectedShape(
                "AFC status section missing from response".into(),
            )),
        }
    }

    /// List every object the printer exposes.
    ///
    /// Accepts both a flat list and a mapping (whose keys are used).
    pub async fn list_objects(&self) -> Result<Vec<String>, Error> {
        let result = self.get("printer/objects/list").await?;
        match result.get("objects") {
            Some(Value::Array(items)) => Ok(items
                .iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()),
            Some(Value::Object(map)) => Ok(map.keys().cloned().collect()),
            Some(other) => Err(Error::UnexpectedShape(format!(
                "objects is {}, expected a list",
                type_name(other)
            ))),
            None => Ok(Vec::new()),
        }
    }

    /// Query one object's status, optionally restricted to `fields`.
    ///
    /// Returns `None` when the printer reports nothing usable for it.
    pub async fn query_object(
        &self,
        name: &str,
        fields: &[&str],
    ) -> Result<Option<Map<String, Value>>, Error> {
        let mut objects = Map::new();
        objects.insert(name.to_owned(), json!(fields));
        let payload = json!({ "objects": objects });
        let result = self.post("printer/objects/query", &payload).await?;
        Ok(result
            .get("status")
            .and_then(|status| status.get(name))
            .and_then(Value::as_object)
            .cloned())
    }

    /// Query several objects in one round trip (all fields).
    pub async fn query_objects(&self, names: &[String]) -> Result<Map<String, Value>, Error> {
        if names.is_empty() {
            return Ok(Map::new());
        }
        let mut url = self.url("printer/objects/query")?;
        url.set_query(Some(&names.join("&")));

        let result = Self::send(self.http.get(url)).await?;
        match result.get("status") {
            Some(Value::Object(map)) => Ok(map.clone()),
            _ => Ok(Map::new()),
        }
    }

    /// Run a single-line directive on the printer.
    pub async fn run_gcode(&self, script: &str) -> Result<(), Error> {
        debug!(script, "sending directive");
        self.post("printer/gcode/script", &json!({ "script": script }))
            .await?;
        Ok(())
    }

    // ── Request helpers ──────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    async fn get(&self, path: &str) -> Result<Value, Error> {
        let url = self.url(path)?;
        trace!(%url, "GET");
        Self::send(self.http.get(url)).await
    }

    async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, Error> {
        let url = self.url(path)?;
        trace!(%url, "POST");
        Self::send(self.http.post(url).json(body)).await
    }

    /// Send a request and unwrap the `{"result": ...}` envelope.
    async fn send(request: reqwest::RequestBuilder) -> Result<Value, Error> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.text().await?;

        let envelope: RpcEnvelope = match serde_json::from_str(&body) {
            Ok(env) => env,
            Err(e) if status.is_success() => {
                return Err(Error::Deserialization {
                    message: e.to_string(),
                    body,
                });
            }
            Err(_) => {
                return Err(Error::Rpc {
                    code: i64::from(status.as_u16()),
                    message: body,
                });
            }
        };

        if let Some(err) = envelope.error {
            return Err(Error::Rpc {
                code: err.code.unwrap_or_else(|| i64::from(status.as_u16())),
                message: err.message.unwrap_or_else(|| status.to_string()),
            });
        }

        if !status.is_success() {
            return Err(Error::Rpc {
                code: i64::from(status.as_u16()),
                message: status.to_string(),
            });
        }

        envelope
            .result
            .ok_or_else(|| Error::UnexpectedShape("response has no result".into()))
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
