//! Klaviyo events API client

use eyre::Result;
use log::warn;
use std::fmt;
use std::time::Duration;
use ureq::Agent;

use crate::config::ApiConfig;
use crate::error::SubmissionError;
use crate::event::EventPayload;
use crate::submit::{Ack, EventSink};

const JSON_API: &str = "application/vnd.api+json";

/// Sends events to `POST /api/events/`
pub struct KlaviyoClient {
    agent: Agent,
    endpoint: String,
    revision: String,
    api_key: String,
}

impl fmt::Debug for KlaviyoClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KlaviyoClient")
            .field("endpoint", &self.endpoint)
            .field("revision", &self.revision)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl KlaviyoClient {
    pub fn new(api: &ApiConfig, api_key: impl Into<String>) -> Self {
        // Non-2xx responses come back as responses so the error body can be reported
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(api.timeout_secs)))
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            endpoint: api.events_url(),
            revision: api.revision.clone(),
            api_key: api_key.into(),
        }
    }

    /// Build a client with the key from the environment. A missing key is fatal.
    pub fn from_env(api: &ApiConfig) -> Result<Self> {
        match api.api_key() {
            Some(key) => Ok(Self::new(api, key)),
            None => eyre::bail!("Please set the {} environment variable.", api.key_env),
        }
    }
}

impl EventSink for KlaviyoClient {
    fn name(&self) -> &str {
        "klaviyo"
    }

    fn create_event(&self, payload: &EventPayload) -> Result<Ack, SubmissionError> {
        let body = serde_json::to_string(payload)?;

        let mut response = self
            .agent
            .post(self.endpoint.as_str())
            .header("Authorization", format!("Klaviyo-API-Key {}", self.api_key))
            .header("revision", self.revision.as_str())
            .header("accept", JSON_API)
            .header("content-type", JSON_API)
            .send(body.as_bytes())?;

        let status = response.status();
        let text = match response.body_mut().read_to_string() {
            Ok(text) => text,
            Err(e) => {
                warn!("Failed to read events API response body (HTTP {}): {}", status.as_u16(), e);
                String::new()
            }
        };

        if status.is_success() {
            Ok(Ack::accepted(status.as_u16(), text))
        } else {
            Err(SubmissionError::Rejected {
                status: status.as_u16(),
                body: text,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::submit::tests::minimal_record;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};

    /// Answer one request on a local port with `response`. The handle yields
    /// the request head (request line and headers).
    fn serve_once(response: String) -> (ApiConfig, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let api = ApiConfig {
            base_url: format!("http://{}", listener.local_addr().unwrap()),
            timeout_secs: 5,
            ..ApiConfig::default()
        };

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                if let Some((name, value)) = line.split_once(':')
                    && name.eq_ignore_ascii_case("content-length")
                {
                    content_length = value.trim().parse().unwrap();
                }
                head.push_str(&line);
            }
            let mut body = vec![0; content_length];
            reader.read_exact(&mut body).unwrap();
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            head
        });

        (api, handle)
    }

    fn has_header(head: &str, name: &str, value: &str) -> bool {
        head.lines().any(|line| {
            line.split_once(':')
                .is_some_and(|(n, v)| n.eq_ignore_ascii_case(name) && v.trim() == value)
        })
    }

    #[test]
    fn test_accepted_event_returns_ack() {
        let (api, server) = serve_once("HTTP/1.1 202 Accepted\r\ncontent-length: 0\r\nconnection: close\r\n\r\n".to_string());
        let client = KlaviyoClient::new(&api, "pk_test");
        let record = minimal_record(EventKind::PlacedOrder, "a@b.com");

        let ack = client.create_event(&EventPayload::from(&record)).unwrap();
        assert_eq!(ack.status, 202);
        assert!(!ack.dry_run);

        let head = server.join().unwrap();
        assert!(head.starts_with("POST /api/events/ HTTP/1.1"), "{}", head);
        assert!(has_header(&head, "authorization", "Klaviyo-API-Key pk_test"), "{}", head);
        assert!(has_header(&head, "revision", &api.revision), "{}", head);
        assert!(has_header(&head, "accept", JSON_API), "{}", head);
        assert!(has_header(&head, "content-type", JSON_API), "{}", head);
    }

    #[test]
    fn test_error_status_is_rejected_with_body() {
        let body = r#"{"errors":[{"detail":"bad"}]}"#;
        let (api, server) = serve_once(format!(
            "HTTP/1.1 400 Bad Request\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
            body.len(),
            body
        ));
        let client = KlaviyoClient::new(&api, "pk_test");
        let record = minimal_record(EventKind::CreatedReservation, "a@b.com");

        let err = client.create_event(&EventPayload::from(&record)).unwrap_err();
        match err {
            SubmissionError::Rejected { status, body: text } => {
                assert_eq!(status, 400);
                assert_eq!(text, body);
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_truncated_error_body_keeps_status() {
        let (api, server) = serve_once(
            "HTTP/1.1 503 Service Unavailable\r\ncontent-length: 64\r\nconnection: close\r\n\r\n{\"err".to_string(),
        );
        let client = KlaviyoClient::new(&api, "pk_test");
        let record = minimal_record(EventKind::PlacedOrder, "a@b.com");

        let err = client.create_event(&EventPayload::from(&record)).unwrap_err();
        assert!(matches!(err, SubmissionError::Rejected { status: 503, .. }), "{:?}", err);
        server.join().unwrap();
    }

    #[test]
    fn test_client_endpoint_from_config() {
        let api = ApiConfig {
            base_url: "http://localhost:9999".to_string(),
            ..ApiConfig::default()
        };
        let client = KlaviyoClient::new(&api, "pk_test");
        assert_eq!(client.endpoint, "http://localhost:9999/api/events/");
    }

    #[test]
    fn test_debug_redacts_key() {
        let client = KlaviyoClient::new(&ApiConfig::default(), "pk_secret_value");
        let debug = format!("{:?}", client);
        assert!(!debug.contains("pk_secret_value"));
        assert!(debug.contains("redacted"));
    }

    #[test]
    fn test_from_env_requires_key() {
        let api = ApiConfig {
            key_env: "KLAVIYO_EVENTS_CLIENT_TEST_MISSING".to_string(),
            ..ApiConfig::default()
        };
        let err = KlaviyoClient::from_env(&api).unwrap_err();
        assert!(err.to_string().contains("KLAVIYO_EVENTS_CLIENT_TEST_MISSING"));
    }

    #[test]
    fn test_unreachable_host_is_transport_error() {
        // Port 9 (discard) on localhost is expected to refuse connections
        let api = ApiConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 2,
            ..ApiConfig::default()
        };
        let client = KlaviyoClient::new(&api, "pk_test");
        let record = minimal_record(EventKind::PlacedOrder, "a@b.com");
        let err = client.create_event(&EventPayload::from(&record)).unwrap_err();
        assert!(matches!(err, SubmissionError::Transport(_)));
    }
}
