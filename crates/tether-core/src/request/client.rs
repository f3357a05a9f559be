//! The request lifecycle manager.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::transport::{HttpTransport, ReqwestTransport};
use super::types::{Headers, HttpMethod, HttpRequest, HttpResponse, RequestOptions, RequestOutcome, set_header};
use crate::config::ApiConfig;
use crate::error::{TetherError, TetherResult, UnifiedError};
use crate::reactive::ReactiveCell;

/// Issues requests with a bounded wait and reduces them to [`RequestOutcome`]s.
///
/// `loading` is true while at least one request is in flight. `error` holds
/// the message of the last failure and is cleared whenever a request starts.
/// Nothing is ever returned as an `Err`: transport failures, timeouts, aborts,
/// unsuccessful statuses and undecodable bodies all become
/// [`RequestOutcome::Failure`].
pub struct ApiClient {
    config: ApiConfig,
    transport: Arc<dyn HttpTransport>,
    loading: ReactiveCell<bool>,
    error: ReactiveCell<Option<String>>,
    in_flight: Arc<AtomicUsize>,
    abort: Mutex<CancellationToken>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("config", &self.config)
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .field("error", &self.error.get())
            .finish()
    }
}

impl ApiClient {
    /// Client using the `reqwest` transport.
    pub fn new(config: ApiConfig) -> TetherResult<Self> {
        Ok(Self::with_transport(config, Arc::new(ReqwestTransport::new()?)))
    }

    pub fn with_transport(config: ApiConfig, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            transport,
            loading: ReactiveCell::new(false),
            error: ReactiveCell::new(None),
            in_flight: Arc::new(AtomicUsize::new(0)),
            abort: Mutex::new(CancellationToken::new()),
        }
    }

    pub fn config(&self) -> &ApiConfig {
        &self.config
    }

    pub fn loading(&self) -> &ReactiveCell<bool> {
        &self.loading
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn error(&self) -> &ReactiveCell<Option<String>> {
        &self.error
    }

    pub fn last_error(&self) -> Option<String> {
        self.error.get()
    }

    /// Number of requests currently awaiting an outcome.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Fail every in-flight request. Requests started afterwards are unaffected.
    pub fn abort_all(&self) {
        let mut token = self.abort.lock();
        token.cancel();
        *token = CancellationToken::new();
        debug!("aborted in-flight requests");
    }

    /// Headers for one request: JSON content type, then the client's, then
    /// the request's own.
    fn resolve_headers(&self, overrides: &Headers) -> Headers {
        let mut headers = Headers::new();
        set_header(&mut headers, "Content-Type", "application/json");
        for (name, value) in self.config.headers.iter().chain(overrides.iter()) {
            set_header(&mut headers, name, value);
        }
        headers
    }

    /// Issue one request against `base_url + url`.
    pub async fn request<T: DeserializeOwned>(&self, url: &str, options: RequestOptions) -> RequestOutcome<T> {
        let _guard = InFlight::enter(&self.in_flight, &self.loading);
        self.error.set(None);

        let timeout = options.timeout.unwrap_or_else(|| self.config.timeout());
        let request = HttpRequest {
            method: options.method,
            url: format!("{}{}", self.config.base_url, url),
            headers: self.resolve_headers(&options.headers),
            body: options.body,
        };
        let method = request.method;
        let full_url = request.url.clone();
        let abort = self.abort.lock().clone();

        debug!(%method, url = %full_url, timeout_ms = timeout.as_millis() as u64, "request started");
        let result = tokio::select! {
            _ = abort.cancelled() => Err(TetherError::Cancelled),
            sent = tokio::time::timeout(timeout, self.transport.send(request)) => match sent {
                Err(_) => Err(TetherError::timeout(timeout.as_millis() as u64)),
                Ok(Err(e)) => Err(e.into()),
                Ok(Ok(response)) => decode_response(response),
            },
        };

        match result {
            Ok((data, status)) => {
                debug!(%method, url = %full_url, status, "request succeeded");
                RequestOutcome::Success { data, status }
            }
            Err(error) => {
                let status = match &error {
                    TetherError::Network { status_code, .. } => *status_code,
                    _ => None,
                };
                let message = failure_message(&error);
                warn!(%method, url = %full_url, error = %message, "request failed");
                self.error.set(Some(message.clone()));
                RequestOutcome::Failure { message, status }
            }
        }
    }

    pub async fn get<T: DeserializeOwned>(&self, url: &str) -> RequestOutcome<T> {
        self.request(url, RequestOptions::new(HttpMethod::Get)).await
    }

    pub async fn post<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> RequestOutcome<T> {
        self.send_with_body(HttpMethod::Post, url, body).await
    }

    pub async fn put<B: Serialize, T: DeserializeOwned>(&self, url: &str, body: &B) -> RequestOutcome<T> {
        self.send_with_body(HttpMethod::Put, url, body).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, url: &str) -> RequestOutcome<T> {
        self.request(url, RequestOptions::new(HttpMethod::Delete)).await
    }

    async fn send_with_body<B: Serialize, T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        url: &str,
        body: &B,
    ) -> RequestOutcome<T> {
        let encoded = match serde_json::to_string(body) {
            Ok(encoded) => encoded,
            Err(e) => {
                let message = format!("Failed to encode request body: {}", e);
                self.error.set(Some(message.clone()));
                return RequestOutcome::Failure { message, status: None };
            }
        };
        self.request(url, RequestOptions::new(method).body(encoded)).await
    }
}

/// Counts a request as in flight until dropped.
struct InFlight<'a> {
    count: &'a AtomicUsize,
    loading: &'a ReactiveCell<bool>,
}

impl<'a> InFlight<'a> {
    fn enter(count: &'a AtomicUsize, loading: &'a ReactiveCell<bool>) -> Self {
        count.fetch_add(1, Ordering::SeqCst);
        loading.set(true);
        Self { count, loading }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if self.count.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.loading.set(false);
        }
    }
}

fn decode_response<T: DeserializeOwned>(response: HttpResponse) -> TetherResult<(T, u16)> {
    if !response.is_success() {
        return Err(TetherError::http_status(
            response.status,
            format!("HTTP {}: {}", response.status, response.status_text),
        ));
    }
    let data = if response.body.trim().is_empty() {
        serde_json::from_value(Value::Null)
    } else {
        serde_json::from_str(&response.body)
    }
    .map_err(|e| TetherError::json(format!("Failed to decode response body: {}", e)))?;
    Ok((data, response.status))
}

fn failure_message(error: &TetherError) -> String {
    match error {
        TetherError::Timeout { .. } => error.to_string(),
        TetherError::Cancelled => "Request aborted".to_string(),
        other => other.message().to_string(),
    }
}
