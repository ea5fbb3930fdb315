#![forbid(unsafe_code)]

//! Blocking HTTP access behind a small trait so the pipeline can run against
//! canned pages in tests.

use std::io::Read;

use tracing::debug;

use crate::error::FetchError;

/// Status and raw body of a completed GET. Non-success statuses are returned
/// here rather than as errors; callers decide whether they care.
#[derive(Debug, Clone)]
pub struct Response {
    pub status: u16,
    pub body: Vec<u8>,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait Fetch {
    fn get(&self, url: &str) -> Result<Response, FetchError>;
}

/// Production fetcher backed by a single `ureq` agent. No timeouts are set, so
/// a stalled server stalls the run.
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl UreqFetcher {
    pub fn new(user_agent: &str) -> Self {
        let agent = ureq::AgentBuilder::new().user_agent(user_agent).build();
        Self { agent }
    }
}

impl Fetch for UreqFetcher {
    fn get(&self, url: &str) -> Result<Response, FetchError> {
        debug!(%url, "GET");
        let response = match self.agent.get(url).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(_, response)) => response,
            Err(ureq::Error::Transport(transport)) => {
                return Err(FetchError::Transport {
                    url: url.to_string(),
                    source: Box::new(transport),
                });
            }
        };

        let status = response.status();
        let mut body = Vec::new();
        response
            .into_reader()
            .read_to_end(&mut body)
            .map_err(|source| FetchError::Body {
                url: url.to_string(),
                source,
            })?;
        Ok(Response { status, body })
    }
}

/// Fetches an HTML page, treating any non-2xx status as a failure.
pub fn fetch_text(fetcher: &dyn Fetch, url: &str) -> Result<String, FetchError> {
    let response = fetcher.get(url)?;
    if !response.is_success() {
        return Err(FetchError::Status {
            url: url.to_string(),
            status: response.status,
        });
    }
    Ok(String::from_utf8_lossy(&response.body).into_owned())
}
