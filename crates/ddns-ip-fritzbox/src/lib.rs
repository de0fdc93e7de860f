// # FRITZ!Box Address Source
//
// This crate asks an AVM FRITZ!Box for its WAN addresses and the IPv6
// prefix it received, using the TR-064 `WANIPConnection:1` service.
//
// ## Protocol
//
// Every query is one SOAP POST to the control URL:
//
// ```http
// POST /igdupnp/control/WANIPConn1
// Content-Type: text/xml; charset="utf-8"
// SOAPACTION: urn:schemas-upnp-org:service:WANIPConnection:1#GetExternalIPAddress
// ```
//
// | Action                            | Response element          |
// |-----------------------------------|---------------------------|
// | `GetExternalIPAddress`            | `NewExternalIPAddress`    |
// | `X_AVM_DE_GetExternalIPv6Address` | `NewExternalIPv6Address`  |
// | `X_AVM_DE_GetIPv6Prefix`          | `NewIPv6Prefix`           |
//
// The IGD service needs no authentication.
//
// ### Trust Level: Untrusted (Address Source)
//
// One request per call, no caching and no retries.

use async_trait::async_trait;
use ddns_core::config::RouterConfig;
use ddns_core::traits::{AddressFamily, AddressSource};
use ddns_core::{Error, Result};
use regex::Regex;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv6Addr};
use std::sync::LazyLock;
use std::time::Duration;

/// UPnP service the actions belong to
const SERVICE_URN: &str = "urn:schemas-upnp-org:service:WANIPConnection:1";

/// HTTP timeout for router requests
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// TR-064 actions used by this source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    ExternalIpv4,
    ExternalIpv6,
    Ipv6Prefix,
}

impl Action {
    fn for_family(family: AddressFamily) -> Self {
        match family {
            AddressFamily::V4 => Action::ExternalIpv4,
            AddressFamily::V6 => Action::ExternalIpv6,
        }
    }

    fn name(self) -> &'static str {
        match self {
            Action::ExternalIpv4 => "GetExternalIPAddress",
            Action::ExternalIpv6 => "X_AVM_DE_GetExternalIPv6Address",
            Action::Ipv6Prefix => "X_AVM_DE_GetIPv6Prefix",
        }
    }

    fn response_element(self) -> &'static str {
        match self {
            Action::ExternalIpv4 => "NewExternalIPAddress",
            Action::ExternalIpv6 => "NewExternalIPv6Address",
            Action::Ipv6Prefix => "NewIPv6Prefix",
        }
    }

    fn soap_action(self) -> String {
        format!("{}#{}", SERVICE_URN, self.name())
    }

    fn envelope(self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<s:Envelope xmlns:s="http://schemas.xmlsoap.org/soap/envelope/" "#,
                r#"s:encodingStyle="http://schemas.xmlsoap.org/soap/encoding/">"#,
                r#"<s:Body><u:{action} xmlns:u="{urn}"/></s:Body>"#,
                r#"</s:Envelope>"#
            ),
            action = self.name(),
            urn = SERVICE_URN
        )
    }
}

/// Elements read from router responses, compiled once
const KNOWN_ELEMENTS: [&str; 5] = [
    "NewExternalIPAddress",
    "NewExternalIPv6Address",
    "NewIPv6Prefix",
    "errorDescription",
    "faultstring",
];

static ELEMENT_PATTERNS: LazyLock<HashMap<&'static str, Regex>> = LazyLock::new(|| {
    KNOWN_ELEMENTS
        .iter()
        .filter_map(|name| element_pattern(name).ok().map(|re| (*name, re)))
        .collect()
});

static CDATA_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[.*?\]\]>").ok());

fn element_pattern(element: &str) -> Result<Regex> {
    let pattern = format!(
        r"<(?:[A-Za-z0-9_]+:)?{name}(?:\s[^>]*)?>((?s:<!\[CDATA\[.*?\]\]>|[^<])*)</(?:[A-Za-z0-9_]+:)?{name}>|<(?:[A-Za-z0-9_]+:)?{name}(?:\s[^>]*)?/>",
        name = regex::escape(element)
    );
    Regex::new(&pattern)
        .map_err(|e| Error::address_source(format!("Invalid element name {}: {}", element, e)))
}

/// Text content of the first `element` in `xml`, namespace prefix ignored
///
/// Returns `Ok(None)` when the element is absent. Empty elements yield
/// `Some("")`. CDATA sections are taken verbatim and the predefined XML
/// entities are decoded everywhere else.
pub fn extract_element(xml: &str, element: &str) -> Result<Option<String>> {
    let compiled;
    let re = match ELEMENT_PATTERNS.get(element) {
        Some(re) => re,
        None => {
            compiled = element_pattern(element)?;
            &compiled
        }
    };

    Ok(re.captures(xml).map(|caps| {
        caps.get(1)
            .map(|value| decode_text(value.as_str()))
            .unwrap_or_default()
    }))
}

fn decode_text(raw: &str) -> String {
    let Some(cdata) = CDATA_PATTERN.as_ref() else {
        return unescape(raw).trim().to_string();
    };

    let mut text = String::with_capacity(raw.len());
    let mut last = 0;
    for section in cdata.find_iter(raw) {
        text.push_str(&unescape(&raw[last..section.start()]));
        text.push_str(&raw[section.start() + "<![CDATA[".len()..section.end() - "]]>".len()]);
        last = section.end();
    }
    text.push_str(&unescape(&raw[last..]));

    text.trim().to_string()
}

fn unescape(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// FRITZ!Box TR-064 address source
#[derive(Debug)]
pub struct FritzBoxSource {
    /// Control URL of the `WANIPConnection:1` service
    control_url: String,

    /// HTTP client for SOAP requests
    client: reqwest::Client,
}

impl FritzBoxSource {
    /// Create a new FRITZ!Box source
    pub fn new(config: &RouterConfig) -> Result<Self> {
        if config.control_url.is_empty() {
            return Err(Error::config("Router control URL cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            control_url: config.control_url.clone(),
            client,
        })
    }

    /// Invoke `action` and return the text of its response element
    async fn soap_call(&self, action: Action) -> Result<String> {
        tracing::debug!("Calling TR-064 action {} at {}", action.name(), self.control_url);

        let response = self
            .client
            .post(&self.control_url)
            .header("Content-Type", r#"text/xml; charset="utf-8""#)
            .header("SOAPACTION", action.soap_action())
            .body(action.envelope())
            .send()
            .await
            .map_err(|e| Error::address_source(format!("Router request failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::address_source(format!("Failed to read router response: {}", e)))?;

        if !status.is_success() {
            let detail = extract_element(&body, "errorDescription")?
                .or(extract_element(&body, "faultstring")?)
                .unwrap_or_else(|| "no fault details".to_string());
            return Err(Error::address_source(format!(
                "{} failed with {}: {}",
                action.name(),
                status,
                detail
            )));
        }

        extract_element(&body, action.response_element())?.ok_or_else(|| {
            Error::address_source(format!(
                "Router response lacks {}",
                action.response_element()
            ))
        })
    }
}

#[async_trait]
impl AddressSource for FritzBoxSource {
    async fn current_address(&self, family: AddressFamily) -> Result<IpAddr> {
        let text = self.soap_call(Action::for_family(family)).await?;

        if text.is_empty() {
            return Err(Error::address_source(format!(
                "Router reports no {} address (is the WAN connection up?)",
                family
            )));
        }

        let addr: IpAddr = text.parse().map_err(|_| {
            Error::address_source(format!("Router returned an invalid address: {}", text))
        })?;

        if !family.matches(&addr) {
            return Err(Error::address_source(format!(
                "Expected an {} address from the router, got {}",
                family, addr
            )));
        }

        Ok(addr)
    }

    async fn current_prefix(&self) -> Result<Ipv6Addr> {
        let text = self.soap_call(Action::Ipv6Prefix).await?;

        if text.is_empty() {
            return Err(Error::address_source("Router reports no IPv6 prefix"));
        }

        ddns_core::combine::parse_ipv6(&text)
            .map_err(|e| Error::address_source(format!("Router returned an invalid prefix: {}", e)))
    }

    fn source_name(&self) -> &'static str {
        "fritzbox"
    }
}
