//! Scripted provider HTTP for tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::domain::foundation::BillingError;
use crate::domain::signature::OrderedParams;
use crate::ports::{HttpMethod, ProviderHttp, ProviderRequest, ProviderResponse};

/// A request the provider received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: HttpMethod,
    pub url: String,
    pub form: OrderedParams,
    pub basic_auth_user: Option<String>,
}

/// Answers requests from per-URL scripts, in order.
///
/// A script matches when the request URL ends with its suffix. Unmatched
/// requests fail as upstream errors.
#[derive(Default)]
pub struct ScriptedProviderHttp {
    inner: Arc<Mutex<ScriptState>>,
}

#[derive(Default)]
struct ScriptState {
    scripts: Vec<(String, VecDeque<Result<ProviderResponse, BillingError>>)>,
    requests: Vec<RecordedRequest>,
}

impl ScriptedProviderHttp {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a `200` reply for URLs ending in `suffix`.
    pub fn reply(self, suffix: &str, body: &str) -> Self {
        self.push(suffix, Ok(ProviderResponse::new(200, body)));
        self
    }

    /// Queues a transport failure for URLs ending in `suffix`.
    pub fn fail(self, suffix: &str, error: BillingError) -> Self {
        self.push(suffix, Err(error));
        self
    }

    fn push(&self, suffix: &str, outcome: Result<ProviderResponse, BillingError>) {
        let mut state = self.inner.lock().unwrap();
        match state.scripts.iter_mut().find(|(s, _)| s == suffix) {
            Some((_, queue)) => queue.push_back(outcome),
            None => state
                .scripts
                .push((suffix.to_string(), VecDeque::from([outcome]))),
        }
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.inner.lock().unwrap().requests.clone()
    }

    pub fn requests_to(&self, suffix: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.ends_with(suffix))
            .collect()
    }
}

#[async_trait]
impl ProviderHttp for ScriptedProviderHttp {
    async fn send(&self, request: ProviderRequest) -> Result<ProviderResponse, BillingError> {
        let mut state = self.inner.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            form: request.form.clone(),
            basic_auth_user: request.basic_auth.as_ref().map(|a| a.username.clone()),
        });

        let queue = state
            .scripts
            .iter_mut()
            .find(|(suffix, _)| request.url.ends_with(suffix.as_str()))
            .map(|(_, queue)| queue);
        match queue.and_then(|q| q.pop_front()) {
            Some(outcome) => outcome,
            None => Err(BillingError::provider(format!(
                "no scripted reply for {} {}",
                request.method, request.url
            ))),
        }
    }
}
