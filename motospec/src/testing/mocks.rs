//! Scripted fetchers and stages for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use crate::core::Item;
use crate::errors::ScrapeError;
use crate::fetch::{FetchRequest, Fetcher};
use crate::pipeline::WorkerHandle;
use crate::stages::Stage;

type Response = Result<String, ScrapeError>;

/// A fetcher answering from an in-memory URL table.
///
/// Each URL maps to a queue of responses: they are served in order and the
/// last one repeats. Unknown URLs answer with a 404 transport error.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    pages: Mutex<HashMap<String, VecDeque<Response>>>,
    delay: Option<Duration>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Creates an empty fetcher.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Serves `body` for `url`.
    #[must_use]
    pub fn with_page(self, url: impl Into<String>, body: impl Into<String>) -> Self {
        self.with_sequence(url, vec![Ok(body.into())])
    }

    /// Fails every request for `url` with `error`.
    #[must_use]
    pub fn with_error(self, url: impl Into<String>, error: ScrapeError) -> Self {
        self.with_sequence(url, vec![Err(error)])
    }

    /// Serves `responses` for `url` in order, repeating the last.
    #[must_use]
    pub fn with_sequence(mut self, url: impl Into<String>, responses: Vec<Response>) -> Self {
        self.pages.get_mut().insert(url.into(), responses.into());
        self
    }

    /// Waits `delay` before every answer.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Every requested URL, in arrival order.
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }

    /// How many times `url` was requested.
    #[must_use]
    pub fn request_count(&self, url: &str) -> usize {
        self.requests.lock().iter().filter(|u| *u == url).count()
    }

    fn next_response(&self, url: &str) -> Response {
        let mut pages = self.pages.lock();
        match pages.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue
                .pop_front()
                .unwrap_or_else(|| Err(ScrapeError::status(url, 404))),
            Some(queue) => queue
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ScrapeError::status(url, 404))),
            None => Err(ScrapeError::status(url, 404)),
        }
    }
}

#[async_trait]
impl Fetcher for StaticFetcher {
    async fn fetch(&self, request: &FetchRequest) -> Result<String, ScrapeError> {
        self.requests.lock().push(request.url.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.next_response(&request.url)
    }
}

/// A stage that records its input and forwards it.
///
/// By default every item is emitted unchanged. With a fan-out of `n > 1`
/// a URL item `u` becomes `u/0` .. `u/{n-1}`. Items whose URL contains the
/// failure marker are reported as processing errors instead.
#[derive(Debug)]
pub struct RecordingStage {
    name: String,
    fan_out: usize,
    fail_marker: Option<String>,
    delay: Option<Duration>,
    seen: Mutex<Vec<Item>>,
}

impl RecordingStage {
    /// Creates a pass-through stage.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fan_out: 1,
            fail_marker: None,
            delay: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Emits `n` derived items per input.
    #[must_use]
    pub fn with_fan_out(mut self, n: usize) -> Self {
        self.fan_out = n;
        self
    }

    /// Reports an error for items whose URL contains `marker`.
    #[must_use]
    pub fn failing_on(mut self, marker: impl Into<String>) -> Self {
        self.fail_marker = Some(marker.into());
        self
    }

    /// Sleeps before handling each item.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Items received, in order.
    #[must_use]
    pub fn seen(&self) -> Vec<Item> {
        self.seen.lock().clone()
    }

    /// Number of items received.
    #[must_use]
    pub fn seen_count(&self) -> usize {
        self.seen.lock().len()
    }
}

#[async_trait]
impl Stage for RecordingStage {
    fn name(&self) -> &str {
        &self.name
    }

    async fn process(&self, handle: &WorkerHandle, item: Item) {
        self.seen.lock().push(item.clone());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let url = item.url().unwrap_or_default().to_string();
        if let Some(marker) = &self.fail_marker {
            if url.contains(marker.as_str()) {
                handle
                    .report(ScrapeError::processing(&self.name, format!("{url} rejected")))
                    .await;
                return;
            }
        }

        if self.fan_out == 1 {
            let _ = handle.emit(item).await;
            return;
        }
        for i in 0..self.fan_out {
            if handle.emit(Item::Url(format!("{url}/{i}"))).await.is_err() {
                return;
            }
        }
    }
}
