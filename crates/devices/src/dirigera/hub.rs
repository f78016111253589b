use std::time::Duration;

use reclight_core::DeviceError;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

pub const TOKEN_VAR: &str = "DIRIGERA_TOKEN";
pub const IP_ADDRESS_VAR: &str = "DIRIGERA_IP_ADDRESS";

const API_PORT: u16 = 8443;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Error)]
pub enum HubError {
    #[error("please set the environment variables {TOKEN_VAR} and {IP_ADDRESS_VAR}")]
    MissingEnv,
    #[error("hub request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("hub answered {status} for {path}: {body}")]
    Status {
        path: String,
        status: u16,
        body: String,
    },
    #[error("no Dirigera {kind} named '{name}' (available: {available:?})")]
    NotFound {
        kind: String,
        name: String,
        available: Vec<String>,
    },
}

impl From<HubError> for DeviceError {
    fn from(e: HubError) -> Self {
        match e {
            HubError::MissingEnv => DeviceError::Config(e.to_string()),
            HubError::NotFound { .. } => DeviceError::NotFound(e.to_string()),
            other => DeviceError::command("dirigera hub", other),
        }
    }
}

/// Where the hub lives and how to authenticate against it.
#[derive(Clone, PartialEq, Eq)]
pub struct HubConfig {
    pub ip_address: String,
    pub token: String,
}

impl HubConfig {
    pub fn new(ip_address: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            ip_address: ip_address.into(),
            token: token.into(),
        }
    }

    /// Read `DIRIGERA_TOKEN` and `DIRIGERA_IP_ADDRESS`.
    pub fn from_env() -> Result<Self, HubError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, HubError> {
        let token = lookup(TOKEN_VAR).filter(|v| !v.trim().is_empty());
        let ip_address = lookup(IP_ADDRESS_VAR).filter(|v| !v.trim().is_empty());
        match (ip_address, token) {
            (Some(ip_address), Some(token)) => Ok(Self::new(ip_address.trim(), token.trim())),
            _ => Err(HubError::MissingEnv),
        }
    }

    pub fn base_url(&self) -> String {
        format!("https://{}:{}/v1", self.ip_address, API_PORT)
    }
}

// Keep the token out of logs.
impl std::fmt::Debug for HubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HubConfig")
            .field("ip_address", &self.ip_address)
            .field("token", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubDevice {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub attributes: HubAttributes,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HubAttributes {
    #[serde(default)]
    pub custom_name: String,
    pub is_on: Option<bool>,
    pub light_level: Option<u8>,
}

/// Pick the device of `kind` called `name`.
pub fn select(devices: &[HubDevice], kind: &str, name: &str) -> Result<HubDevice, HubError> {
    let of_kind = devices.iter().filter(|device| device.kind == kind);

    of_kind
        .clone()
        .find(|device| device.attributes.custom_name == name)
        .cloned()
        .ok_or_else(|| HubError::NotFound {
            kind: kind.to_string(),
            name: name.to_string(),
            available: of_kind
                .map(|device| device.attributes.custom_name.clone())
                .collect(),
        })
}

/// Request body for a single attribute change.
pub fn attributes_body(attributes: Value) -> Value {
    json!([{ "attributes": attributes }])
}

/// Thin client for the Dirigera REST API.
#[derive(Clone)]
pub struct Hub {
    client: reqwest::Client,
    base_url: String,
    token: String,
}

impl Hub {
    pub fn connect(config: HubConfig) -> Result<Self, HubError> {
        log::info!("Connecting to Dirigera hub at {}", config.ip_address);

        // The hub serves a self-signed certificate. Connections are not
        // pooled: lookups and device commands run on different runtimes.
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(0)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url(),
            token: config.token,
        })
    }

    pub async fn list_devices(&self) -> Result<Vec<HubDevice>, HubError> {
        let path = "/devices";
        let response = self
            .client
            .get(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .send()
            .await?;
        let response = Self::check(path, response).await?;
        Ok(response.json().await?)
    }

    /// Change attributes of one device.
    pub async fn patch(&self, id: &str, attributes: Value) -> Result<(), HubError> {
        let path = format!("/devices/{}", id);
        log::debug!("PATCH {} {}", path, attributes);
        let response = self
            .client
            .patch(format!("{}{}", self.base_url, path))
            .bearer_auth(&self.token)
            .json(&attributes_body(attributes))
            .send()
            .await?;
        Self::check(&path, response).await?;
        Ok(())
    }

    async fn check(path: &str, response: reqwest::Response) -> Result<reqwest::Response, HubError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(HubError::Status {
            path: path.to_string(),
            status: status.as_u16(),
            body,
        })
    }
}
