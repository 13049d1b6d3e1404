use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
struct DefaultGwResponse {
    default_gw_interface: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceStatus {
    pub name: String,
    pub priority: u32,
    pub health: String, // "UP", "DOWN" or "UNKNOWN"
    #[serde(default)]
    pub last_checked_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct IfStatusResponse {
    interfaces: Vec<InterfaceStatus>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ForceGatewayRequest<'a> {
    if_name: &'a str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForceGatewayResponse {
    pub accepted: bool,
    #[serde(default)]
    pub error: Option<String>,
}

pub struct FailoverClient {
    client: Client,
    base_url: String,
}

impl FailoverClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Interface currently carrying the default route, `None` while unset.
    pub async fn default_gw(&self) -> Result<Option<String>, Box<dyn std::error::Error>> {
        let resp: DefaultGwResponse = self.get("/api/v1/default_gw").await?;
        if resp.default_gw_interface.is_empty() {
            Ok(None)
        } else {
            Ok(Some(resp.default_gw_interface))
        }
    }

    /// Health of every managed interface, highest priority first.
    pub async fn if_status(&self) -> Result<Vec<InterfaceStatus>, Box<dyn std::error::Error>> {
        let resp: IfStatusResponse = self.get("/api/v1/if_status").await?;
        Ok(resp.interfaces)
    }

    /// Ask the daemon to make `if_name` the default gateway.
    ///
    /// A rejected override is returned as `accepted: false`, not as an error.
    pub async fn force_gateway(&self, if_name: &str) -> Result<ForceGatewayResponse, Box<dyn std::error::Error>> {
        let resp = self
            .client
            .post(format!("{}/api/v1/force_gateway", self.base_url))
            .json(&ForceGatewayRequest { if_name })
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(format!("Daemon returned error status {}: {}", status, text).into());
        }
        Ok(serde_json::from_str(&text)?)
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, Box<dyn std::error::Error>> {
        let resp = self.client.get(format!("{}{}", self.base_url, path)).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(format!("Daemon returned error status {}: {}", status, text).into());
        }
        Ok(serde_json::from_str(&text)?)
    }
}
