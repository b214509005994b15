//! Request dispatcher: one reader, concurrent handlers, one writer.
//!
//! ```text
//!   input ──► FrameReader ──► decode ──► spawn(handle) ──► mpsc ──► write_frames ──► output
//!                 ▲                          │ (bounded by a semaphore)
//!                 └── stops on cancel ◄──────┘
//! ```
//!
//! | Step | Behaviour |
//! |------|-----------|
//! | read | frames are decoded in arrival order; reading pauses while `max_in_flight` handlers run |
//! | dispatch | each request runs in its own task with a child of the root cancellation token |
//! | respond | responses go through a single writer, so framing stays intact; order across ids is not guaranteed |
//! | shutdown | on cancel: stop reading, answer buffered requests with "server shutting down", wait up to `shutdown_timeout`, then abort stragglers and close the output |
//!
//! A request id is answered at most once. A request reusing an id that is
//! in flight, or one of the last [`ANSWERED_ID_CAPACITY`] answered ids, is
//! dropped without a response.

use std::collections::{HashMap, HashSet, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use futures::FutureExt;
use serde_json::{Value, json};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use super::error::{DispatchError, TransportError};
use super::protocol::{
    Incoming, InitializeResult, JsonRpcResponse, PROTOCOL_VERSION, RequestId, ServerInfo,
    ToolCallParams, parse_frame,
};
use super::transport::{DEFAULT_MAX_FRAME_BYTES, Frame, FrameReader, write_frames};
use crate::metrics::BrokerMetrics;
use crate::tools::ToolRegistry;

/// Methods handled natively; anything else is reported as `other` in metrics.
const KNOWN_METHODS: &[&str] = &["initialize", "ping", "tools/list", "tools/call", "shutdown"];

/// How many answered ids a session remembers for duplicate detection.
pub const ANSWERED_ID_CAPACITY: usize = 4096;

#[derive(Debug, Clone)]
pub struct DispatcherConfig {
    /// Reported as `serverInfo.name`
    pub server_name: String,
    pub server_version: String,
    /// Upper bound on concurrently running handlers
    pub max_in_flight: usize,
    pub max_frame_bytes: usize,
    /// How long shutdown waits for in-flight handlers
    pub shutdown_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            server_name: "linodemcp".to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
            max_in_flight: 32,
            max_frame_bytes: DEFAULT_MAX_FRAME_BYTES,
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    metrics: Arc<BrokerMetrics>,
    config: DispatcherConfig,
}

impl Dispatcher {
    pub fn new(registry: Arc<ToolRegistry>, metrics: Arc<BrokerMetrics>, config: DispatcherConfig) -> Self {
        Self {
            registry,
            metrics,
            config,
        }
    }

    /// Serve on the process's standard input and output.
    pub async fn serve_stdio(&self, cancel: CancellationToken) -> Result<(), TransportError> {
        self.serve(tokio::io::stdin(), tokio::io::stdout(), cancel).await
    }

    /// Serve until the input ends or `cancel` fires. A client `shutdown`
    /// request cancels `cancel` itself.
    pub async fn serve<R, W>(&self, reader: R, writer: W, cancel: CancellationToken) -> Result<(), TransportError>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let max_in_flight = self.config.max_in_flight.max(1);
        let (tx, rx) = mpsc::channel(max_in_flight * 2);
        let writer_task = tokio::spawn(write_frames(writer, rx));

        let session = Arc::new(Session {
            registry: Arc::clone(&self.registry),
            metrics: Arc::clone(&self.metrics),
            server_info: ServerInfo {
                name: self.config.server_name.clone(),
                version: self.config.server_version.clone(),
            },
            responses: tx,
            ids: Mutex::new(IdLedger::default()),
            shutdown: cancel.clone(),
            abort: CancellationToken::new(),
        });
        let tracker = TaskTracker::new();
        let permits = Arc::new(Semaphore::new(max_in_flight));
        let mut frames = FrameReader::new(BufReader::new(reader), self.config.max_frame_bytes);

        info!(
            server = %self.config.server_name,
            tools = self.registry.count(),
            max_in_flight,
            "Dispatcher started"
        );

        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                frame = frames.read_frame() => frame,
            };
            let frame = match frame {
                Ok(Some(frame)) => frame,
                Ok(None) => {
                    info!("Input closed");
                    break;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to read from input");
                    break;
                }
            };

            match session.decode(frame).await {
                None => {}
                Some(Incoming::Notification { method, params }) => session.notify(&method, params),
                Some(Incoming::Request { id, method, params }) => {
                    let Some(request_cancel) = session.claim(&id) else {
                        continue;
                    };
                    let permit = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            session.reject_shutting_down(id).await;
                            break;
                        }
                        permit = Arc::clone(&permits).acquire_owned() => match permit {
                            Ok(permit) => permit,
                            Err(_) => break,
                        },
                    };
                    let session = Arc::clone(&session);
                    tracker.spawn(async move {
                        let _permit = permit;
                        session.handle(id, method, params, request_cancel).await;
                    });
                }
            }
        }

        if cancel.is_cancelled() {
            while let Some(frame) = frames.take_buffered() {
                if let Some(Incoming::Request { id, .. }) = session.decode(frame).await
                    && session.claim(&id).is_some()
                {
                    session.reject_shutting_down(id).await;
                }
            }
        }

        self.drain(&tracker, &cancel, &session.abort).await;
        drop(session);

        let joined = if cancel.is_cancelled() {
            match tokio::time::timeout(self.config.shutdown_timeout, writer_task).await {
                Ok(joined) => joined,
                Err(_) => {
                    warn!("Timed out flushing responses");
                    return Err(TransportError::WriterTask(
                        "timed out flushing responses".to_string(),
                    ));
                }
            }
        } else {
            writer_task.await
        };

        info!("Dispatcher stopped");
        joined.map_err(|e| TransportError::WriterTask(e.to_string()))?
    }

    async fn drain(&self, tracker: &TaskTracker, cancel: &CancellationToken, abort: &CancellationToken) {
        tracker.close();
        tokio::select! {
            _ = tracker.wait() => return,
            _ = cancel.cancelled() => {}
        }

        let pending = tracker.len();
        if pending > 0 {
            debug!(pending, "Waiting for in-flight handlers");
        }
        if tokio::time::timeout(self.config.shutdown_timeout, tracker.wait())
            .await
            .is_err()
        {
            warn!(
                pending = tracker.len(),
                timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                "Handlers did not finish before the shutdown timeout, aborting"
            );
            abort.cancel();
            tracker.wait().await;
        }
    }
}

/// Request ids seen by one session. In-flight ids carry their cancel
/// token; answered ids are remembered oldest-first up to
/// [`ANSWERED_ID_CAPACITY`].
#[derive(Default)]
struct IdLedger {
    in_flight: HashMap<RequestId, CancellationToken>,
    answered: HashSet<RequestId>,
    answered_order: VecDeque<RequestId>,
}

impl IdLedger {
    fn is_known(&self, id: &RequestId) -> bool {
        self.in_flight.contains_key(id) || self.answered.contains(id)
    }

    fn retire(&mut self, id: &RequestId) {
        self.in_flight.remove(id);
        if self.answered.insert(id.clone()) {
            self.answered_order.push_back(id.clone());
        }
        while self.answered_order.len() > ANSWERED_ID_CAPACITY {
            if let Some(oldest) = self.answered_order.pop_front() {
                self.answered.remove(&oldest);
            }
        }
    }
}

/// State shared by the reader loop and every request task of one `serve`.
struct Session {
    registry: Arc<ToolRegistry>,
    metrics: Arc<BrokerMetrics>,
    server_info: ServerInfo,
    responses: mpsc::Sender<JsonRpcResponse>,
    ids: Mutex<IdLedger>,
    shutdown: CancellationToken,
    /// Fired when the drain deadline passes
    abort: CancellationToken,
}

impl Session {
    /// Turn a frame into a request, or answer it with an error.
    async fn decode(&self, frame: Frame) -> Option<Incoming> {
        let line = match frame {
            Frame::Line(line) => line,
            Frame::Oversized { len } => {
                warn!(bytes = len, "Discarded oversized frame");
                self.metrics.rpc_request("other", "invalid_request");
                let error = DispatchError::RequestInvalid(format!("frame of {} bytes exceeds the limit", len));
                self.send(JsonRpcResponse::failure(None, &error)).await;
                return None;
            }
        };

        if line.iter().all(u8::is_ascii_whitespace) {
            return None;
        }

        match parse_frame(&line) {
            Ok(incoming) => Some(incoming),
            Err(frame_error) => {
                if let Some(id) = &frame_error.id
                    && !self.retire_unseen(id)
                {
                    warn!(id = %id, "Invalid frame reuses a known id, dropping");
                    return None;
                }
                debug!(error = %frame_error.error, "Rejected frame");
                self.metrics.rpc_request("other", frame_error.error.outcome());
                self.send(JsonRpcResponse::failure(frame_error.id, &frame_error.error))
                    .await;
                None
            }
        }
    }

    fn notify(&self, method: &str, params: Option<Value>) {
        match method {
            "notifications/initialized" => debug!("Client initialized"),
            "notifications/cancelled" => {
                let target = params
                    .as_ref()
                    .and_then(|p| p.get("requestId"))
                    .and_then(RequestId::from_value);
                if let Some(id) = target {
                    let token = self.ids().in_flight.get(&id).cloned();
                    if let Some(token) = token {
                        debug!(id = %id, "Client cancelled request");
                        token.cancel();
                    }
                }
            }
            other => debug!(method = %other, "Ignoring notification"),
        }
    }

    fn ids(&self) -> std::sync::MutexGuard<'_, IdLedger> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register `id` as in flight; `None` if it is in flight or was answered.
    fn claim(&self, id: &RequestId) -> Option<CancellationToken> {
        let mut ids = self.ids();
        if ids.is_known(id) {
            warn!(id = %id, "Duplicate request id, dropping");
            return None;
        }
        let token = self.shutdown.child_token();
        ids.in_flight.insert(id.clone(), token.clone());
        Some(token)
    }

    /// Move a claimed id to the answered set.
    fn release(&self, id: &RequestId) {
        self.ids().retire(id);
    }

    /// Mark an unclaimed id answered; `false` if it was already known.
    fn retire_unseen(&self, id: &RequestId) -> bool {
        let mut ids = self.ids();
        if ids.is_known(id) {
            return false;
        }
        ids.retire(id);
        true
    }

    /// Answer a claimed id with "server shutting down".
    async fn reject_shutting_down(&self, id: RequestId) {
        let error = DispatchError::ShuttingDown;
        self.metrics.rpc_request("other", error.outcome());
        self.send(JsonRpcResponse::failure(Some(id.clone()), &error)).await;
        self.release(&id);
    }

    async fn handle(&self, id: RequestId, method: String, params: Option<Value>, cancel: CancellationToken) {
        let _in_flight = self.metrics.track_in_flight();
        let started = Instant::now();

        let routed = AssertUnwindSafe(self.route(&method, params, cancel)).catch_unwind();
        let outcome = tokio::select! {
            biased;
            result = routed => result.unwrap_or_else(|panic| {
                let reason = panic_message(panic.as_ref());
                error!(method = %method, id = %id, "Handler panicked: {}", reason);
                Err(DispatchError::handler_failed(format!("handler panicked: {}", reason)))
            }),
            _ = self.abort.cancelled() => Err(DispatchError::Cancelled),
        };

        let label = metric_method(&method);
        let elapsed_ms = started.elapsed().as_millis() as u64;
        let response = match outcome {
            Ok(result) => {
                self.metrics.rpc_request(label, "ok");
                debug!(method = %method, id = %id, elapsed_ms, "Request completed");
                JsonRpcResponse::success(id.clone(), result)
            }
            Err(e) => {
                self.metrics.rpc_request(label, e.outcome());
                if matches!(e, DispatchError::HandlerFailed(_)) {
                    warn!(method = %method, id = %id, error = %e, "Request failed");
                } else {
                    debug!(method = %method, id = %id, error = %e, "Request rejected");
                }
                JsonRpcResponse::failure(Some(id.clone()), &e)
            }
        };

        self.send(response).await;
        self.release(&id);
    }

    async fn route(&self, method: &str, params: Option<Value>, cancel: CancellationToken) -> Result<Value, DispatchError> {
        match method {
            "initialize" => self.initialize(params),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.registry.enumerate() })),
            "tools/call" => self.call_tool(params, cancel).await,
            "shutdown" => {
                info!("Shutdown requested by client");
                self.shutdown.cancel();
                Ok(json!({}))
            }
            other => Err(DispatchError::RequestMethodUnknown(other.to_string())),
        }
    }

    fn initialize(&self, params: Option<Value>) -> Result<Value, DispatchError> {
        let client = params
            .as_ref()
            .and_then(|p| p.get("clientInfo"))
            .and_then(|c| c.get("name"))
            .and_then(Value::as_str)
            .unwrap_or("unknown");
        let requested = params
            .as_ref()
            .and_then(|p| p.get("protocolVersion"))
            .and_then(Value::as_str)
            .unwrap_or("unspecified");
        info!(client = %client, requested_version = %requested, "Client connected");

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION,
            capabilities: json!({ "tools": { "listChanged": false } }),
            server_info: self.server_info.clone(),
        };
        serde_json::to_value(result).map_err(|e| DispatchError::handler_failed(e.to_string()))
    }

    async fn call_tool(&self, params: Option<Value>, cancel: CancellationToken) -> Result<Value, DispatchError> {
        let params: ToolCallParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| DispatchError::RequestParamsInvalid(format!("tools/call: {}", e)))?;

        let handler = self
            .registry
            .lookup(&params.name)
            .map_err(|_| DispatchError::ToolUnknown(params.name.clone()))?;
        let arguments = params.arguments.unwrap_or_else(|| json!({}));

        let started = Instant::now();
        let result = handler.execute(cancel, arguments).await;
        let elapsed = started.elapsed().as_secs_f64();

        match result {
            Ok(output) => {
                let outcome = if output.is_error() { "tool_error" } else { "ok" };
                self.metrics.tool_call(&params.name, outcome, elapsed);
                serde_json::to_value(&output).map_err(|e| DispatchError::handler_failed(e.to_string()))
            }
            Err(e) => {
                self.metrics.tool_call(&params.name, e.outcome(), elapsed);
                Err(e.into())
            }
        }
    }

    async fn send(&self, response: JsonRpcResponse) {
        tokio::select! {
            biased;
            sent = self.responses.send(response) => {
                if sent.is_err() {
                    debug!("Response writer is gone, dropping response");
                }
            }
            _ = self.abort.cancelled() => debug!("Dropping response after abort"),
        }
    }
}

fn metric_method(method: &str) -> &str {
    if KNOWN_METHODS.contains(&method) {
        method
    } else {
        "other"
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
