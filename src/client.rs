use anyhow::{Context, Result};
use reqwest::blocking::Client;
use serde_json::Value;
use std::time::Instant;
use tracing::{error, info};
use url::Url;

use crate::config::Credentials;
use crate::queries::QuerySpec;

/// Runs a query and hands back the decoded response, or `None` when the call
/// itself failed.
pub trait QueryExecutor {
    fn execute(&self, query: &QuerySpec) -> Option<Value>;
}

/// Blocking client for the Cloudflare GraphQL Analytics endpoint.
pub struct GraphqlClient {
    http: Client,
    endpoint: Url,
    credentials: Credentials,
}

impl GraphqlClient {
    pub fn new(endpoint: Url, credentials: Credentials) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            endpoint,
            credentials,
        })
    }
}

impl QueryExecutor for GraphqlClient {
    fn execute(&self, query: &QuerySpec) -> Option<Value> {
        let start_time = Instant::now();
        info!(action = "start", component = "graphql_query", query = query.name, endpoint = %self.endpoint, "Sending query");

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("X-Auth-Email", &self.credentials.auth_email)
            .header("X-Auth-Key", &self.credentials.auth_key)
            .json(&query.body())
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.json::<Value>());

        match response {
            Ok(value) => {
                info!(
                    action = "complete",
                    component = "graphql_query",
                    query = query.name,
                    duration_ms = start_time.elapsed().as_millis(),
                    "Query returned"
                );
                Some(value)
            }
            Err(e) => {
                error!(
                    action = "complete",
                    component = "graphql_query",
                    query = query.name,
                    status = ?e.status(),
                    error = %e,
                    "Error querying GraphQL API"
                );
                None
            }
        }
    }
}

/// How a single query ended up.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutcome {
    /// The full response; its `data` branch is present and non-null.
    Data(Value),
    /// The `errors` payload reported by the API.
    ApiErrors(Value),
    Failed,
}

impl QueryOutcome {
    pub fn from_response(response: Option<Value>) -> Self {
        let Some(response) = response else {
            return Self::Failed;
        };

        if response.get("data").is_some_and(|data| !data.is_null()) {
            return Self::Data(response);
        }

        match response.get("errors") {
            Some(errors) if !errors.is_null() => Self::ApiErrors(errors.clone()),
            _ => Self::Failed,
        }
    }

    pub fn data(&self) -> Option<&Value> {
        match self {
            Self::Data(response) => Some(response),
            _ => None,
        }
    }

    /// The `errors` payload that came back alongside usable `data`.
    pub fn partial_errors(&self) -> Option<&Value> {
        self.data()?
            .get("errors")
            .filter(|errors| !errors.is_null())
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Data(_))
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Data(_) => "ok",
            Self::ApiErrors(_) => "api error",
            Self::Failed => "failed",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries;
    use crate::window::QueryWindow;
    use chrono::NaiveDate;
    use serde_json::json;
    use std::io::{Read, Write};
    use std::net::TcpListener;
    use std::sync::mpsc;
    use std::thread;

    fn credentials() -> Credentials {
        Credentials {
            auth_email: "ops@example.com".to_string(),
            auth_key: "key-123".to_string(),
            zone_id: "zone-abc".to_string(),
        }
    }

    fn daily_query() -> QuerySpec {
        let window = QueryWindow::ending_on(NaiveDate::from_ymd_opt(2024, 6, 2).unwrap());
        queries::daily_summary("zone-abc", &window)
    }

    /// Serve one canned HTTP response and report the raw request received.
    fn serve_once(status_line: &'static str, body: &'static str) -> (Url, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = Url::parse(&format!("http://{}/graphql", listener.local_addr().unwrap())).unwrap();
        let (tx, rx) = mpsc::channel();

        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = stream.read(&mut buf).unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                let text = String::from_utf8_lossy(&request).to_string();
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let content_length = text[..header_end]
                        .lines()
                        .find_map(|line| {
                            let (name, value) = line.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if request.len() >= header_end + 4 + content_length {
                        break;
                    }
                }
            }

            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            tx.send(String::from_utf8_lossy(&request).to_string()).unwrap();
        });

        (url, rx)
    }

    #[test]
    fn successful_call_returns_decoded_body() {
        let (url, requests) = serve_once("HTTP/1.1 200 OK", r#"{"data":{"viewer":{"zones":[]}}}"#);
        let client = GraphqlClient::new(url, credentials()).unwrap();

        let response = client.execute(&daily_query()).unwrap();
        assert_eq!(response, json!({"data": {"viewer": {"zones": []}}}));

        let request = requests.recv().unwrap().to_lowercase();
        assert!(request.starts_with("post /graphql"));
        assert!(request.contains("x-auth-email: ops@example.com"));
        assert!(request.contains("x-auth-key: key-123"));
        assert!(request.contains("content-type: application/json"));
        assert!(request.contains("\"zonetag\":\"zone-abc\""));
    }

    #[test]
    fn non_success_status_yields_none() {
        let (url, _requests) = serve_once("HTTP/1.1 500 Internal Server Error", r#"{"errors":[]}"#);
        let client = GraphqlClient::new(url, credentials()).unwrap();
        assert!(client.execute(&daily_query()).is_none());
    }

    #[test]
    fn connection_failure_yields_none() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let url = Url::parse(&format!("http://{addr}/graphql")).unwrap();
        let client = GraphqlClient::new(url, credentials()).unwrap();
        assert!(client.execute(&daily_query()).is_none());
    }

    #[test]
    fn outcome_classification() {
        assert_eq!(QueryOutcome::from_response(None), QueryOutcome::Failed);

        let ok = QueryOutcome::from_response(Some(json!({"data": {"viewer": {}}})));
        assert!(ok.is_success());
        assert!(ok.data().is_some());

        let errors = json!([{"message": "zone not authorized"}]);
        let api = QueryOutcome::from_response(Some(json!({"data": null, "errors": errors})));
        assert_eq!(api, QueryOutcome::ApiErrors(errors));
        assert_eq!(api.label(), "api error");

        assert_eq!(QueryOutcome::from_response(Some(json!({}))), QueryOutcome::Failed);
    }

    #[test]
    fn errors_alongside_data_are_kept_as_partial() {
        let errors = json!([{"message": "partial"}]);
        let outcome = QueryOutcome::from_response(Some(
            json!({"data": {"viewer": {"zones": []}}, "errors": errors}),
        ));
        assert!(outcome.is_success());
        assert_eq!(outcome.partial_errors(), Some(&errors));

        let clean = QueryOutcome::from_response(Some(json!({"data": {}, "errors": null})));
        assert!(clean.partial_errors().is_none());
        assert!(QueryOutcome::Failed.partial_errors().is_none());
    }
}
