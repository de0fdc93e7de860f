// # Porkbun Registrar
//
// This crate provides a Porkbun registrar implementation for the DDNS system.
//
// ## Behavior
//
// - One HTTP request per trait call
// - Full error propagation to the engine (the engine owns retries)
// - HTTP timeout configured (30 seconds)
// - A and AAAA records only
// - Keys are sent in the JSON body and never logged
//
// ### Trust Level: Untrusted (Registrar)
//
// Registrars only perform API calls against their own endpoint and parse the
// responses. They never retry, cache or decide what needs changing.
//
// ## API Reference
//
// Every endpoint is a POST with `{"apikey": ..., "secretapikey": ...}` in the
// body and answers with `{"status": "SUCCESS" | "ERROR", "message": ...}`.
//
// - Ping: `/ping`
// - List records: `/dns/retrieveByNameType/:root/:type/:subdomain`
// - Create record: `/dns/create/:root` (`name`, `type`, `content`)
// - Edit record: `/dns/edit/:root/:id` (`name`, `type`, `content`)

use async_trait::async_trait;
use ddns_core::config::RegistrarConfig;
use ddns_core::domain::DomainName;
use ddns_core::traits::{ActiveRecord, RecordType, Registrar};
use ddns_core::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Registrar name used in logs and errors
const REGISTRAR_NAME: &str = "porkbun";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Status value of successful responses
const STATUS_SUCCESS: &str = "SUCCESS";

/// Porkbun registrar
///
/// # Trust Level: Untrusted
///
/// Stateless and single-shot. All coordination (retries, duplicate handling,
/// scheduling) is owned by `ReconcileEngine`.
///
/// # Security
///
/// The Debug implementation intentionally does NOT expose the keys.
pub struct PorkbunRegistrar {
    /// Public API key
    /// ⚠️ NEVER log this value
    api_key: String,

    /// Secret API key
    /// ⚠️ NEVER log this value
    secret_key: String,

    /// API base URL without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,
}

// Custom Debug implementation that hides the keys
impl std::fmt::Debug for PorkbunRegistrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PorkbunRegistrar")
            .field("api_key", &"<REDACTED>")
            .field("secret_key", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    apikey: &'a str,
    secretapikey: &'a str,
}

#[derive(Serialize)]
struct RecordRequest<'a> {
    #[serde(flatten)]
    credentials: Credentials<'a>,
    name: &'a str,
    #[serde(rename = "type")]
    record_type: RecordType,
    content: String,
}

/// Fields shared by every response
#[derive(Deserialize)]
struct Envelope<T> {
    status: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(flatten)]
    body: T,
}

#[derive(Deserialize)]
struct Empty {}

#[derive(Deserialize)]
struct PingBody {
    #[serde(rename = "yourIp", default)]
    your_ip: Option<String>,
}

#[derive(Deserialize)]
struct RetrieveBody {
    #[serde(default)]
    records: Vec<WireRecord>,
}

#[derive(Deserialize)]
struct WireRecord {
    id: String,
    content: String,
}

impl PorkbunRegistrar {
    /// Create a new Porkbun registrar
    ///
    /// Fails with a configuration error when a key is empty.
    pub fn new(config: &RegistrarConfig) -> Result<Self> {
        config.validate()?;

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            api_key: config.api_key.clone(),
            secret_key: config.secret_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }

    /// Verify the keys against the API
    ///
    /// Returns the caller's address as seen by Porkbun, if reported.
    ///
    /// # API Call
    ///
    /// ```http
    /// POST /ping
    /// {"apikey": "...", "secretapikey": "..."}
    /// ```
    pub async fn ping(&self) -> Result<Option<IpAddr>> {
        let body: PingBody = self.post("ping", &self.credentials()).await?;
        Ok(body.your_ip.and_then(|ip| ip.parse().ok()))
    }

    fn credentials(&self) -> Credentials<'_> {
        Credentials {
            apikey: &self.api_key,
            secretapikey: &self.secret_key,
        }
    }

    fn record_request<'a>(
        &'a self,
        name: &'a DomainName,
        record_type: RecordType,
        address: IpAddr,
    ) -> RecordRequest<'a> {
        RecordRequest {
            credentials: self.credentials(),
            name: name.subdomain(),
            record_type,
            content: address.to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// POST `body` to `path` and decode a successful response
    async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to {} failed: {}", REGISTRAR_NAME, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            let detail = serde_json::from_str::<Envelope<Empty>>(&text)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or(text);

            return Err(match status.as_u16() {
                401 | 403 => Error::registrar(
                    REGISTRAR_NAME,
                    format!("Authentication failed ({}): {}", status, detail),
                ),
                429 => Error::registrar(
                    REGISTRAR_NAME,
                    format!("Rate limit exceeded ({}): {}", status, detail),
                ),
                500..=599 => Error::registrar(
                    REGISTRAR_NAME,
                    format!("Server error ({}): {}", status, detail),
                ),
                _ => Error::registrar(REGISTRAR_NAME, format!("{}: {}", status, detail)),
            });
        }

        let envelope: Envelope<T> = serde_json::from_str(&text)?;
        if envelope.status != STATUS_SUCCESS {
            return Err(Error::registrar(
                REGISTRAR_NAME,
                envelope
                    .message
                    .unwrap_or_else(|| format!("status {}", envelope.status)),
            ));
        }

        Ok(envelope.body)
    }
}

#[async_trait]
impl Registrar for PorkbunRegistrar {
    /// # API Call
    ///
    /// ```http
    /// POST /dns/retrieveByNameType/example.com/A/home
    /// ```
    async fn list_active(
        &self,
        name: &DomainName,
        record_type: RecordType,
    ) -> Result<Vec<ActiveRecord>> {
        tracing::debug!("Retrieving active {}-Records for {}", record_type, name);

        let path = format!(
            "dns/retrieveByNameType/{}/{}/{}",
            name.root_domain(),
            record_type,
            name.subdomain()
        );
        let body: RetrieveBody = self.post(&path, &self.credentials()).await?;

        Ok(body
            .records
            .into_iter()
            .map(|record| ActiveRecord::new(record.id, record.content))
            .collect())
    }

    /// # API Call
    ///
    /// ```http
    /// POST /dns/create/example.com
    /// {"name": "home", "type": "A", "content": "203.0.113.7", ...}
    /// ```
    async fn create(&self, name: &DomainName, record_type: RecordType, address: IpAddr) -> Result<()> {
        let path = format!("dns/create/{}", name.root_domain());
        let request = self.record_request(name, record_type, address);
        let _: Empty = self.post(&path, &request).await?;
        Ok(())
    }

    /// # API Call
    ///
    /// ```http
    /// POST /dns/edit/example.com/106926659
    /// {"name": "home", "type": "A", "content": "203.0.113.7", ...}
    /// ```
    async fn edit(
        &self,
        record_id: &str,
        name: &DomainName,
        record_type: RecordType,
        address: IpAddr,
    ) -> Result<()> {
        let path = format!("dns/edit/{}/{}", name.root_domain(), record_id);
        let request = self.record_request(name, record_type, address);
        let _: Empty = self.post(&path, &request).await?;
        Ok(())
    }

    fn registrar_name(&self) -> &'static str {
        REGISTRAR_NAME
    }
}
