//! Scripted [`Fetcher`] for strategy and lifecycle tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use waystation_core::header::{self, HeaderMap, HeaderValue};
use waystation_core::{Request, Response, StatusCode};

use crate::fetch::{FetchError, Fetcher};

#[derive(Clone)]
enum Outcome {
    Respond(Response),
    Fail,
    TimeOut,
    Hang,
}

/// Answers per target; unknown targets fail like an unreachable network.
pub(crate) struct ScriptedFetcher {
    script: Mutex<HashMap<String, Outcome>>,
    calls: AtomicUsize,
}

impl ScriptedFetcher {
    pub(crate) fn new() -> Self {
        Self { script: Mutex::new(HashMap::new()), calls: AtomicUsize::new(0) }
    }

    fn set(&self, target: &str, outcome: Outcome) {
        let key = Request::get(target).unwrap().target().to_string();
        self.script.lock().unwrap().insert(key, outcome);
    }

    pub(crate) fn respond(self, target: &str, response: Response) -> Self {
        self.set(target, Outcome::Respond(response));
        self
    }

    pub(crate) fn fail(self, target: &str) -> Self {
        self.set(target, Outcome::Fail);
        self
    }

    /// Fail as a transport timeout.
    pub(crate) fn time_out(self, target: &str) -> Self {
        self.set(target, Outcome::TimeOut);
        self
    }

    pub(crate) fn hang(self, target: &str) -> Self {
        self.set(target, Outcome::Hang);
        self
    }

    /// Change the script after the fetcher has been shared.
    pub(crate) fn go_offline(&self, target: &str) {
        self.set(target, Outcome::Fail);
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Fetcher for ScriptedFetcher {
    async fn fetch(&self, request: &Request) -> Result<Response, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.script.lock().unwrap().get(request.target()).cloned();

        match outcome {
            Some(Outcome::Respond(response)) => Ok(response),
            Some(Outcome::TimeOut) => Err(FetchError::Timeout(20000)),
            Some(Outcome::Hang) => std::future::pending().await,
            Some(Outcome::Fail) | None => Err(FetchError::Transport("connection refused".into())),
        }
    }
}

/// 200 text/plain response.
pub(crate) fn ok(body: &str) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/plain"));
    Response::new(StatusCode::OK, headers, body.to_string())
}

/// Empty response with the given status.
pub(crate) fn status(code: u16) -> Response {
    Response::new(StatusCode::from_u16(code).unwrap(), HeaderMap::new(), "")
}
