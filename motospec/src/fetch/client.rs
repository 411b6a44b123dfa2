//! Worker-owned fetch session.
//!
//! A [`FetchClient`] runs as its own task. Requests are handed over on a
//! channel and answered on a per-request oneshot, so the owning worker can
//! signal "no more requests" ([`FetchClient::close`]) and later wait for the
//! session to release everything ([`FetchClient::join`]).

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::protocols::Fetcher;
use super::request::FetchRequest;
use super::retry::RetryPolicy;
use crate::cancellation::CancellationToken;
use crate::errors::ScrapeError;

type Reply = oneshot::Sender<Result<String, ScrapeError>>;

struct Envelope {
    request: FetchRequest,
    reply: Reply,
}

/// Counters reported by a fetch session when it shuts down.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClientStats {
    /// Requests accepted.
    pub requests: usize,
    /// Transport attempts made, retries included.
    pub attempts: usize,
    /// Requests answered with an error.
    pub failures: usize,
    /// Requests dropped unanswered because of cancellation.
    pub abandoned: usize,
}

/// A private fetch session with its own retry loop.
pub struct FetchClient {
    name: String,
    requests: Option<mpsc::Sender<Envelope>>,
    task: Option<JoinHandle<ClientStats>>,
}

impl FetchClient {
    /// Starts a session on the current tokio runtime.
    pub fn spawn(
        name: impl Into<String>,
        fetcher: Arc<dyn Fetcher>,
        policy: RetryPolicy,
        cancel: CancellationToken,
    ) -> Self {
        let name = name.into();
        let (tx, rx) = mpsc::channel(1);
        let task = tokio::spawn(run_session(name.clone(), fetcher, policy, cancel, rx));
        Self {
            name,
            requests: Some(tx),
            task: Some(task),
        }
    }

    /// Sends `request` to the session and waits for its answer.
    pub async fn fetch(&self, request: FetchRequest) -> Result<String, ScrapeError> {
        let url = request.url.clone();
        let Some(requests) = &self.requests else {
            return Err(ScrapeError::transport(url, "fetch client closed"));
        };

        let (reply, answer) = oneshot::channel();
        if requests.send(Envelope { request, reply }).await.is_err() {
            return Err(ScrapeError::transport(url, "fetch client stopped"));
        }
        answer
            .await
            .unwrap_or_else(|_| Err(ScrapeError::transport(url, "request abandoned by fetch client")))
    }

    /// Signals that no more requests will be sent.
    pub fn close(&mut self) {
        if self.requests.take().is_some() {
            debug!(client = %self.name, "fetch client closed for new requests");
        }
    }

    /// Closes the session and waits until it has released its resources.
    pub async fn join(&mut self) -> ClientStats {
        self.close();
        let Some(task) = self.task.take() else {
            return ClientStats::default();
        };
        match task.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!(client = %self.name, "fetch client task failed: {}", e);
                ClientStats::default()
            }
        }
    }
}

impl std::fmt::Debug for FetchClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FetchClient")
            .field("name", &self.name)
            .field("open", &self.requests.is_some())
            .field("running", &self.task.is_some())
            .finish()
    }
}

async fn run_session(
    name: String,
    fetcher: Arc<dyn Fetcher>,
    policy: RetryPolicy,
    cancel: CancellationToken,
    mut requests: mpsc::Receiver<Envelope>,
) -> ClientStats {
    let mut stats = ClientStats::default();

    loop {
        let envelope = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            next = requests.recv() => match next {
                Some(envelope) => envelope,
                None => break,
            },
        };
        stats.requests += 1;

        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            result = attempt_with_retry(fetcher.as_ref(), &policy, &envelope.request, &mut stats) => Some(result),
        };

        match outcome {
            Some(result) => {
                if result.is_err() {
                    stats.failures += 1;
                }
                let _ = envelope.reply.send(result);
            }
            None => {
                // Dropping the reply wakes the waiting worker.
                stats.abandoned += 1;
                debug!(client = %name, request = %envelope.request, "abandoning in-flight request");
                break;
            }
        }
    }

    requests.close();
    while requests.try_recv().is_ok() {
        stats.abandoned += 1;
    }
    debug!(client = %name, ?stats, "fetch client finished");
    stats
}

async fn attempt_with_retry(
    fetcher: &dyn Fetcher,
    policy: &RetryPolicy,
    request: &FetchRequest,
    stats: &mut ClientStats,
) -> Result<String, ScrapeError> {
    let mut attempt = 0;
    loop {
        attempt += 1;
        stats.attempts += 1;
        match fetcher.fetch(request).await {
            Ok(body) => return Ok(body),
            Err(err) if policy.should_retry(attempt, &err) => {
                let delay = policy.delay_for(attempt - 1);
                debug!(request = %request, attempt, ?delay, "retrying after {}", err);
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err.with_attempts(attempt)),
        }
    }
}
