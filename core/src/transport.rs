//! The seam between the adapter and the network.
//!
//! # Design
//! The adapter never opens sockets. It hands a fully built `HttpRequest` to a
//! `Transport` and gets back the status, headers and complete body text. A
//! transport must not turn 4xx/5xx statuses into errors; only failures to
//! complete the round-trip are reported as [`Error::Connection`].

use async_trait::async_trait;

use crate::error::Error;
use crate::http::{HttpRequest, HttpResponse};

/// Executes one HTTP request.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error>;
}

#[cfg(feature = "ureq")]
pub use self::blocking::UreqTransport;

#[cfg(feature = "ureq")]
mod blocking {
    use super::*;
    use crate::http::HttpMethod;

    /// Transport backed by a `ureq` agent.
    ///
    /// `ureq` is synchronous, so each request runs on tokio's blocking pool.
    /// Must be used from within a tokio runtime.
    #[derive(Debug, Clone)]
    pub struct UreqTransport {
        agent: ureq::Agent,
    }

    impl UreqTransport {
        pub fn new() -> Self {
            // Status interpretation belongs to the envelope validator.
            let agent = ureq::Agent::config_builder()
                .http_status_as_error(false)
                .build()
                .new_agent();
            Self { agent }
        }

        pub fn with_agent(agent: ureq::Agent) -> Self {
            Self { agent }
        }
    }

    impl Default for UreqTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl Transport for UreqTransport {
        async fn send(&self, request: HttpRequest) -> Result<HttpResponse, Error> {
            let agent = self.agent.clone();
            tokio::task::spawn_blocking(move || execute(&agent, request))
                .await
                .map_err(|e| Error::Connection(e.to_string()))?
        }
    }

    fn execute(agent: &ureq::Agent, req: HttpRequest) -> Result<HttpResponse, Error> {
        let result = match req.method {
            HttpMethod::Get => with_headers(agent.get(&req.url), &req.headers).call(),
            HttpMethod::Delete => with_headers(agent.delete(&req.url), &req.headers).call(),
            HttpMethod::Post => {
                let builder = with_headers(agent.post(&req.url), &req.headers);
                match req.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
            HttpMethod::Patch => {
                let builder = with_headers(agent.patch(&req.url), &req.headers);
                match req.body {
                    Some(body) => builder.send(body.as_bytes()),
                    None => builder.send_empty(),
                }
            }
        };
        let mut response = result.map_err(|e| Error::Connection(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        // The whole body is read regardless of size. Bytes that are not UTF-8
        // are replaced so the validator can still report the raw text.
        let bytes = response
            .body_mut()
            .with_config()
            .limit(u64::MAX)
            .read_to_vec()
            .map_err(|e| Error::Connection(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }

    fn with_headers<B>(
        mut builder: ureq::RequestBuilder<B>,
        headers: &[(String, String)],
    ) -> ureq::RequestBuilder<B> {
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        builder
    }
}
