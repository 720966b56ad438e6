//! Application-level readiness polling
//!
//! A best-effort wait: the poller reports how it ended but never fails the
//! launch. `Exhausted` means the attempt budget ran out without a positive
//! answer; the application may still come up later.

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;
use tokio::time::sleep;

/// Result of a single probe request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// The server answered with this status code
    Status(u16),
    /// No HTTP answer (refused, unreachable, timed out)
    ConnectionFailed(String),
}

/// Issues HEAD requests against the application URL
#[async_trait]
pub trait HttpProbe: Send + Sync {
    async fn head(&self, url: &str) -> ProbeOutcome;
}

/// [`HttpProbe`] backed by a `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestProbe {
    client: reqwest::Client,
}

impl ReqwestProbe {
    /// `timeout` bounds each request, connection included. Redirects are
    /// reported as-is rather than followed.
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpProbe for ReqwestProbe {
    async fn head(&self, url: &str) -> ProbeOutcome {
        match self.client.head(url).send().await {
            Ok(response) => ProbeOutcome::Status(response.status().as_u16()),
            Err(e) => ProbeOutcome::ConnectionFailed(e.to_string()),
        }
    }
}

/// How the readiness wait ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpReadiness {
    Ready { attempts: u32 },
    Exhausted { attempts: u32 },
}

impl HttpReadiness {
    pub fn is_ready(&self) -> bool {
        matches!(self, HttpReadiness::Ready { .. })
    }

    pub fn attempts(&self) -> u32 {
        match self {
            HttpReadiness::Ready { attempts } | HttpReadiness::Exhausted { attempts } => *attempts,
        }
    }
}

/// 2xx or 3xx, or 401/403 from a server that is up but wants credentials
pub fn is_ready_status(status: u16) -> bool {
    (200..400).contains(&status) || status == 401 || status == 403
}

/// Poll `url` until it answers with a ready status
///
/// Each attempt sleeps `poll_interval` and then sends one HEAD request, so
/// the wait lasts at most `max_attempts * poll_interval` plus request time.
pub async fn wait_for_http(
    probe: &dyn HttpProbe,
    url: &str,
    max_attempts: u32,
    poll_interval: Duration,
) -> HttpReadiness {
    for attempt in 1..=max_attempts {
        sleep(poll_interval).await;

        match probe.head(url).await {
            ProbeOutcome::Status(status) if is_ready_status(status) => {
                tracing::info!("{} is ready (HTTP {})", url, status);
                return HttpReadiness::Ready { attempts: attempt };
            }
            ProbeOutcome::Status(status) => {
                tracing::debug!("{} answered HTTP {}; not ready yet", url, status);
            }
            ProbeOutcome::ConnectionFailed(reason) => {
                tracing::debug!("{} not reachable yet: {}", url, reason);
            }
        }
    }

    tracing::warn!("{} not ready after {} attempts", url, max_attempts);
    HttpReadiness::Exhausted {
        attempts: max_attempts,
    }
}
