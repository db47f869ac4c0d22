//! Scripted [`Fetcher`] for unit tests.

use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use crate::fetcher::{FetchError, FetchResponse, Fetcher};

struct Route {
    matcher: Box<dyn Fn(&str) -> bool + Send + Sync>,
    responses: Vec<FetchResponse>,
    served: usize,
}

/// Answers requests from per-route response scripts. Each route replays its
/// responses in order and then repeats the last one. Unmatched URLs fail
/// with a transport error.
pub(crate) struct ScriptedFetcher {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self {
            routes: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    /// Every fetch blocks until [`release`](Self::release) is called.
    pub(crate) fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::new()
        }
    }

    pub(crate) fn release(&self) {
        if let Some(gate) = &self.gate {
            gate.add_permits(1);
        }
    }

    /// Route matching the exact URL.
    pub(crate) fn respond(&self, url: &str, responses: Vec<FetchResponse>) {
        let url = url.to_string();
        self.respond_when(move |candidate| candidate == url, responses);
    }

    /// Route matching any URL for which `matcher` returns true. Routes are
    /// tried in registration order.
    pub(crate) fn respond_when(
        &self,
        matcher: impl Fn(&str) -> bool + Send + Sync + 'static,
        responses: Vec<FetchResponse>,
    ) {
        self.routes.lock().unwrap().push(Route {
            matcher: Box::new(matcher),
            responses,
            served: 0,
        });
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub(crate) fn calls_to(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == url).count()
    }

    pub(crate) fn calls_matching(&self, needle: &str) -> usize {
        self.calls().iter().filter(|c| c.contains(needle)).count()
    }

    pub(crate) fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    fn next_response(&self, url: &str) -> Option<FetchResponse> {
        let mut routes = self.routes.lock().unwrap();
        let route = routes.iter_mut().find(|r| (r.matcher)(url))?;
        let index = route.served.min(route.responses.len().checked_sub(1)?);
        route.served += 1;
        Some(route.responses[index].clone())
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| FetchError::Transport(e.to_string()))?
                .forget();
        }

        self.next_response(url)
            .ok_or_else(|| FetchError::Transport(format!("no scripted route for {}", url)))
    }
}
