//! Gateway — one async call per device endpoint.
//!
//! The gateway only judges transport: a 2xx reply with a readable body is
//! `Ok`, whatever the envelope inside says.  Business verdicts belong to the
//! caller.  There are no retries here.

use reqwest::{Client, Url};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, trace};

use duck_proto::{Endpoint, Method};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("{endpoint}: request failed: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("{endpoint}: HTTP {status}{}", detail_suffix(.detail))]
    Status {
        endpoint: &'static str,
        status: u16,
        detail: Option<String>,
    },
    #[error("{endpoint}: unreadable reply: {reason}")]
    Body {
        endpoint: &'static str,
        reason: String,
    },
    #[error("{endpoint}: missing path argument `{param}`")]
    MissingArg {
        endpoint: &'static str,
        param: &'static str,
    },
    #[error("invalid device URL `{0}`")]
    BaseUrl(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

/// Values for an endpoint's `{param}` segments plus any query pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PathArgs {
    path: Vec<(&'static str, String)>,
    query: Vec<(&'static str, String)>,
}

impl PathArgs {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn with(mut self, param: &'static str, value: impl ToString) -> Self {
        self.path.push((param, value.to_string()));
        self
    }

    pub fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    fn lookup(&self, param: &str) -> Option<&str> {
        self.path
            .iter()
            .find(|(k, _)| *k == param)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone)]
pub struct Gateway {
    client: Client,
    base: Url,
}

impl Gateway {
    pub fn new(base_url: &str) -> Result<Self, GatewayError> {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(client: Client, base_url: &str) -> Result<Self, GatewayError> {
        let base = Url::parse(base_url.trim())
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| GatewayError::BaseUrl(base_url.to_string()))?;
        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Fill `endpoint`'s path template and append it to the base URL.  Each
    /// template argument is percent-encoded as a single path segment.
    pub fn url_for(&self, endpoint: &Endpoint, args: &PathArgs) -> Result<Url, GatewayError> {
        let mut url = self.base.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| GatewayError::BaseUrl(self.base.to_string()))?;
            segments.pop_if_empty();
            for seg in endpoint.path.split('/').filter(|s| !s.is_empty()) {
                match seg.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
                    Some(param) => {
                        let value = args.lookup(param).ok_or(GatewayError::MissingArg {
                            endpoint: endpoint.name,
                            param: static_param(endpoint, param),
                        })?;
                        segments.push(value);
                    }
                    None => {
                        segments.push(seg);
                    }
                }
            }
        }
        if !args.query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (k, v) in &args.query {
                pairs.append_pair(k, v);
            }
        }
        Ok(url)
    }

    pub async fn call(
        &self,
        endpoint: &Endpoint,
        args: &PathArgs,
        payload: Option<&Value>,
    ) -> Result<Value, GatewayError> {
        let url = self.url_for(endpoint, args)?;
        debug!("{} {}", endpoint.method, url);

        let mut request = match endpoint.method {
            Method::Get => self.client.get(url),
            Method::Post => self.client.post(url),
            Method::Put => self.client.put(url),
            Method::Delete => self.client.delete(url),
        };
        request = request.header("Accept", "application/json");
        if let Some(body) = payload {
            request = request.json(body);
        }

        let response = request.send().await.map_err(|source| GatewayError::Transport {
            endpoint: endpoint.name,
            source,
        })?;
        let status = response.status();
        let text = response.text().await.map_err(|source| GatewayError::Transport {
            endpoint: endpoint.name,
            source,
        })?;
        trace!("{} -> {} ({} bytes)", endpoint.name, status, text.len());

        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: endpoint.name,
                status: status.as_u16(),
                detail: error_detail(&text),
            });
        }

        parse_body(&text).map_err(|reason| GatewayError::Body {
            endpoint: endpoint.name,
            reason,
        })
    }
}

/// The template's own `&'static str` for `param`, so errors borrow nothing.
fn static_param(endpoint: &Endpoint, param: &str) -> &'static str {
    endpoint.params().find(|p| *p == param).unwrap_or("?")
}

fn parse_body(text: &str) -> Result<Value, String> {
    if text.trim().is_empty() {
        return Err("empty body".to_string());
    }
    serde_json::from_str(text).map_err(|e| e.to_string())
}

/// `error` or `message` from a JSON error body, else a short raw excerpt.
fn error_detail(text: &str) -> Option<String> {
    if let Ok(body) = serde_json::from_str::<Value>(text) {
        for key in ["error", "message"] {
            if let Some(s) = body.get(key).and_then(Value::as_str) {
                if !s.trim().is_empty() {
                    return Some(s.trim().to_string());
                }
            }
        }
    }
    let raw = text.trim();
    if raw.is_empty() {
        None
    } else {
        Some(raw.chars().take(120).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duck_proto::endpoints;

    fn gateway() -> Gateway {
        Gateway::new("http://duck.local:3000").unwrap()
    }

    #[test]
    fn test_url_for_plain_path() {
        let url = gateway()
            .url_for(&endpoints::FACTS, &PathArgs::none())
            .unwrap();
        assert_eq!(url.as_str(), "http://duck.local:3000/api/memory/profile");
    }

    #[test]
    fn test_url_for_encodes_template_segment() {
        let url = gateway()
            .url_for(&endpoints::DELETE_FACT, &PathArgs::none().with("key", "sister 1/name"))
            .unwrap();
        assert_eq!(
            url.as_str(),
            "http://duck.local:3000/api/memory/profile/sister%201%2Fname"
        );
    }

    #[test]
    fn test_url_for_keeps_base_prefix_and_query() {
        let gw = Gateway::new("http://duck.local/panel/").unwrap();
        let url = gw
            .url_for(&endpoints::LOGS, &PathArgs::none().query("lines", 50))
            .unwrap();
        assert_eq!(url.as_str(), "http://duck.local/panel/logs?lines=50");
    }

    #[test]
    fn test_missing_arg() {
        let err = gateway()
            .url_for(&endpoints::DELETE_CONTACT, &PathArgs::none())
            .unwrap_err();
        assert!(matches!(err, GatewayError::MissingArg { param: "id", .. }));
    }

    #[test]
    fn test_bad_base_url() {
        assert!(matches!(
            Gateway::new("not a url"),
            Err(GatewayError::BaseUrl(_))
        ));
    }

    #[test]
    fn test_parse_body_and_detail() {
        assert_eq!(parse_body("  ").unwrap_err(), "empty body");
        assert_eq!(parse_body("null").unwrap(), Value::Null);
        assert!(parse_body("<html>").is_err());
        assert_eq!(
            error_detail(r#"{"success": false, "error": "Ingen tekst"}"#).as_deref(),
            Some("Ingen tekst")
        );
        assert_eq!(error_detail("Bad Gateway").as_deref(), Some("Bad Gateway"));
        assert_eq!(error_detail(""), None);
    }

    #[test]
    fn test_status_error_display() {
        let err = GatewayError::Status {
            endpoint: "ask_ai",
            status: 500,
            detail: Some("OpenAI API error: 429".into()),
        };
        assert_eq!(err.to_string(), "ask_ai: HTTP 500: OpenAI API error: 429");
    }
}
