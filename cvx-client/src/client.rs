//! Command/response client for CV-series vision controllers
//!
//! [`CvxClient`] owns the single TCP connection to the controller and the
//! state that correlates replies with commands:
//!
//! - **connection slot**: at most one live stream; the write half lives
//!   here, the read half in the spawned receive task
//! - **pending token**: the single in-flight command; admission is a
//!   test-and-set on this slot, so concurrent callers get `CommandBusy`
//!   instead of queueing
//! - **correlated response**: the reply fields the router published for
//!   the pending command, consumed exactly once by the correlator
//! - **ledger**: last observed classification per command token
//!
//! The client is a cheap handle (`Clone` shares the same connection) and
//! is safe to call from any number of tasks. No method returns an error:
//! busy, timeout, and lost-connection are ordinary outcomes reported in
//! the [`Response`] classification.

use crate::events::{ClientEvent, EVENT_CHANNEL_CAPACITY};
use crate::options::{AdmissionPolicy, ClientOptions};
use crate::reader;
use cvx_core::{
    COMMAND_TERMINATOR, CvxError, CvxResult, ERROR_TOKEN, ErrorCode, FIELD_SEPARATOR, Response,
};
use cvx_transport::{TcpSettings, TcpTransport};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, MutexGuard};
use std::time::{Duration, Instant};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::OwnedWriteHalf;
use tokio::sync::{Mutex as AsyncMutex, Notify, broadcast, watch};

/// Lock a std mutex, recovering the data if a panicking holder poisoned
/// it. Every slot behind these mutexes is updated by plain assignment, so
/// the data is valid either way.
fn lock<T>(mutex: &StdMutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// One live connection: write half plus the stop signal for its receive
/// task.
struct ConnSlot {
    writer: OwnedWriteHalf,
    stop: watch::Sender<bool>,
}

/// State shared between client handles, the receive task, and the router.
pub(crate) struct Inner {
    options: StdMutex<ClientOptions>,
    /// Connection slot; `None` while disconnected.
    conn: AsyncMutex<Option<ConnSlot>>,
    connected: AtomicBool,
    /// Single-attempt critical section for connecting. A caller that
    /// finds it set gets no connection instead of queueing.
    connect_busy: AtomicBool,
    /// Monotonic connection counter; a receive task only tears down the
    /// slot when its generation is still the current one.
    generation: AtomicU64,
    /// Token of the in-flight command; the admission slot.
    pending: StdMutex<Option<String>>,
    /// Reply fields the router correlated with the pending command.
    response: StdMutex<Option<Vec<String>>>,
    /// Signaled by the router when it stores a correlated response.
    pub(crate) response_notify: Notify,
    ledger: StdMutex<HashMap<String, ErrorCode>>,
    events: broadcast::Sender<ClientEvent>,
}

impl Inner {
    pub(crate) fn lock_pending(&self) -> MutexGuard<'_, Option<String>> {
        lock(&self.pending)
    }

    pub(crate) fn lock_response(&self) -> MutexGuard<'_, Option<Vec<String>>> {
        lock(&self.response)
    }

    /// Publish an event; delivery is best-effort and a missing or lagging
    /// subscriber never affects the caller.
    pub(crate) fn emit(&self, event: ClientEvent) {
        let _ = self.events.send(event);
    }

    /// Claim the admission slot for `command` if it is free.
    fn try_claim(&self, command: &str) -> bool {
        let mut pending = lock(&self.pending);
        if pending.is_none() {
            *pending = Some(command.to_string());
            true
        } else {
            false
        }
    }

    fn record(&self, command: &str, code: ErrorCode) {
        lock(&self.ledger).insert(command.to_string(), code);
    }

    /// Clear the connection slot after the receive task ends.
    ///
    /// Skipped when a newer connection already owns the slot, so a
    /// lingering task from a replaced connection cannot tear down its
    /// successor. Fires `Disconnected` once per live-to-dead transition.
    pub(crate) async fn teardown(&self, generation: u64) {
        let mut conn = self.conn.lock().await;
        if self.generation.load(Ordering::SeqCst) != generation {
            return;
        }
        conn.take();
        drop(conn);
        if self.connected.swap(false, Ordering::SeqCst) {
            log::info!("connection lost");
            self.emit(ClientEvent::Disconnected);
        }
    }
}

/// Releases the admission slot on every exit path, including panics.
struct AdmissionGuard<'a> {
    inner: &'a Inner,
}

impl Drop for AdmissionGuard<'_> {
    fn drop(&mut self) {
        lock(&self.inner.pending).take();
    }
}

/// Classify a correlated reply line.
fn classify(fields: &[String]) -> ErrorCode {
    if fields.first().map(String::as_str) == Some(ERROR_TOKEN) {
        match fields.get(2).and_then(|f| f.parse::<i32>().ok()) {
            Some(code) => ErrorCode::from_wire(code),
            None => ErrorCode::ErrorReply,
        }
    } else {
        ErrorCode::Success
    }
}

/// Async client for one CV-series vision controller.
#[derive(Clone)]
pub struct CvxClient {
    inner: Arc<Inner>,
}

impl CvxClient {
    /// Create a client with the given options. No connection is made
    /// until the first command (or [`ensure_connected`](Self::ensure_connected)).
    pub fn new(options: ClientOptions) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            inner: Arc::new(Inner {
                options: StdMutex::new(options),
                conn: AsyncMutex::new(None),
                connected: AtomicBool::new(false),
                connect_busy: AtomicBool::new(false),
                generation: AtomicU64::new(0),
                pending: StdMutex::new(None),
                response: StdMutex::new(None),
                response_notify: Notify::new(),
                ledger: StdMutex::new(HashMap::new()),
                events,
            }),
        }
    }

    /// Create a client targeting `address:port` with default options
    pub fn with_target(address: IpAddr, port: u16) -> Self {
        Self::new(ClientOptions::new(address, port))
    }

    /// Subscribe to client events
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.inner.events.subscribe()
    }

    /// Check if a live connection exists
    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::SeqCst)
    }

    /// Check if a command is currently in flight
    pub fn is_busy(&self) -> bool {
        self.inner.lock_pending().is_some()
    }

    /// Token of the in-flight command, if any
    pub fn busy_command(&self) -> Option<String> {
        self.inner.lock_pending().clone()
    }

    /// Last classification observed for `command`, if it was ever issued
    pub fn last_error(&self, command: &str) -> Option<ErrorCode> {
        lock(&self.inner.ledger).get(command).copied()
    }

    /// Set the controller address. Changing it closes any existing
    /// connection; the next command reconnects to the new target.
    pub async fn set_address(&self, address: IpAddr) {
        let changed = {
            let mut options = lock(&self.inner.options);
            if options.address == Some(address) {
                false
            } else {
                options.address = Some(address);
                true
            }
        };
        if changed {
            self.close().await;
        }
    }

    /// Set the controller port. Changing it closes any existing
    /// connection.
    pub async fn set_port(&self, port: u16) {
        let changed = {
            let mut options = lock(&self.inner.options);
            if options.port == port {
                false
            } else {
                options.port = port;
                true
            }
        };
        if changed {
            self.close().await;
        }
    }

    /// Per-command timeout currently in effect
    pub fn command_timeout(&self) -> Duration {
        lock(&self.inner.options).command_timeout
    }

    /// Set the per-command timeout
    pub fn set_command_timeout(&self, timeout: Duration) {
        lock(&self.inner.options).command_timeout = timeout;
    }

    /// Set the admission retry policy
    pub fn set_admission_policy(&self, policy: AdmissionPolicy) {
        lock(&self.inner.options).admission = policy;
    }

    /// Ensure a live connection exists, connecting if necessary.
    ///
    /// Returns `true` when a healthy connection is available. A caller
    /// that observes another connect attempt in progress gets `false`
    /// immediately rather than waiting. Connect failures are logged and
    /// reported as `false`, never propagated.
    pub async fn ensure_connected(&self) -> bool {
        if self.inner.connected.load(Ordering::SeqCst) {
            return true;
        }
        if self
            .inner
            .connect_busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            log::debug!("connect attempt already in progress");
            return false;
        }
        let result = self.connect_attempt().await;
        self.inner.connect_busy.store(false, Ordering::SeqCst);
        match result {
            Ok(()) => true,
            Err(e) => {
                log::error!("connect failed: {e}");
                false
            }
        }
    }

    async fn connect_attempt(&self) -> CvxResult<()> {
        // Any stale handle is closed before a fresh attempt.
        self.close().await;

        let settings = {
            let options = lock(&self.inner.options);
            let address = options
                .address
                .ok_or_else(|| CvxError::NotConfigured("address is not set".to_string()))?;
            if options.port == 0 {
                return Err(CvxError::NotConfigured("port is not set".to_string()));
            }
            TcpSettings::with_timeout(
                SocketAddr::new(address, options.port),
                options.connect_timeout,
            )
        };

        log::info!("connecting to {} ...", settings.address);
        let stream = TcpTransport::connect(&settings).await?;
        let (read_half, write_half) = stream.into_split();
        let (stop_tx, stop_rx) = watch::channel(false);
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;

        *self.inner.conn.lock().await = Some(ConnSlot {
            writer: write_half,
            stop: stop_tx,
        });
        self.inner.connected.store(true, Ordering::SeqCst);
        log::info!("{} connected", settings.address);
        self.inner.emit(ClientEvent::Connected);

        tokio::spawn(reader::receive_loop(
            self.inner.clone(),
            read_half,
            stop_rx,
            generation,
        ));
        Ok(())
    }

    /// Close the connection.
    ///
    /// Idempotent; fires `Disconnected` exactly once per transition from
    /// connected to not-connected. The receive task is stopped and the
    /// socket shut down best-effort.
    pub async fn close(&self) {
        let taken = self.inner.conn.lock().await.take();
        if let Some(mut slot) = taken {
            let _ = slot.stop.send(true);
            let _ = slot.writer.shutdown().await;
            if self.inner.connected.swap(false, Ordering::SeqCst) {
                log::info!("disconnected");
                self.inner.emit(ClientEvent::Disconnected);
            }
        }
    }

    /// Execute a command and return only its classification
    pub async fn execute_simple(&self, command: &str, args: Option<&str>) -> ErrorCode {
        self.execute(command, args).await.error_code
    }

    /// Execute a command against the controller.
    ///
    /// Acquires the single admission slot (bounded retry per the
    /// configured [`AdmissionPolicy`]), ensures a connection, sends
    /// `command[,args]` terminated by CR, and waits for the router to
    /// deliver the correlated reply or for the command timeout.
    ///
    /// Never returns an error: `CommandBusy`, `NoConnection`,
    /// `CommandTimeout`, and `Exception` are reported through the
    /// response classification, and every outcome is recorded in the
    /// per-command ledger. Admission is released on every exit path.
    pub async fn execute(&self, command: &str, args: Option<&str>) -> Response {
        let policy = lock(&self.inner.options).admission.clone();
        let mut admitted = false;
        for attempt in 0..policy.max_attempts.max(1) {
            if self.inner.try_claim(command) {
                admitted = true;
                break;
            }
            if attempt + 1 < policy.max_attempts {
                tokio::time::sleep(policy.retry_interval).await;
            }
        }
        if !admitted {
            log::debug!("{command}: admission slot busy");
            return self.fail(command, ErrorCode::CommandBusy);
        }

        let _admission = AdmissionGuard { inner: &self.inner };
        // A reply that arrived after a previous command timed out must
        // not answer this one.
        self.inner.lock_response().take();

        match self.execute_admitted(command, args).await {
            Ok(response) => response,
            Err(e) => {
                log::error!("{command}: {e}");
                self.fail(command, ErrorCode::Exception)
            }
        }
    }

    async fn execute_admitted(&self, command: &str, args: Option<&str>) -> CvxResult<Response> {
        let mut text = String::from(command);
        if let Some(args) = args {
            text.push(FIELD_SEPARATOR);
            text.push_str(args);
        }
        text.push(COMMAND_TERMINATOR);

        if !self.ensure_connected().await {
            return Ok(self.fail(command, ErrorCode::NoConnection));
        }

        log::debug!("send: {}", text.trim_end());
        let started = Instant::now();
        self.send(text.as_bytes()).await?;
        self.inner.emit(ClientEvent::CommandSent {
            command: command.to_string(),
            text,
        });

        let timeout = lock(&self.inner.options).command_timeout;
        let deadline = started + timeout;
        loop {
            if let Some(fields) = self.inner.lock_response().take() {
                let code = classify(&fields);
                return Ok(self.complete(command, code, fields, started.elapsed()));
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(self.complete(
                    command,
                    ErrorCode::CommandTimeout,
                    Vec::new(),
                    started.elapsed(),
                ));
            }
            let _ = tokio::time::timeout(remaining, self.inner.response_notify.notified()).await;
        }
    }

    async fn send(&self, bytes: &[u8]) -> CvxResult<()> {
        let mut conn = self.inner.conn.lock().await;
        let slot = conn.as_mut().ok_or_else(|| {
            CvxError::Connection(std::io::Error::new(
                std::io::ErrorKind::NotConnected,
                "connection slot is empty",
            ))
        })?;
        slot.writer.write_all(bytes).await.map_err(CvxError::Connection)
    }

    /// Record an outcome that produced no reply line
    fn fail(&self, command: &str, code: ErrorCode) -> Response {
        self.inner.record(command, code);
        Response::failed(command, code)
    }

    /// Record the outcome in the ledger and build the response
    fn complete(
        &self,
        command: &str,
        code: ErrorCode,
        fields: Vec<String>,
        elapsed: Duration,
    ) -> Response {
        self.inner.record(command, code);
        Response {
            command: command.to_string(),
            elapsed,
            error_code: code,
            fields,
        }
    }

    /// Overwrite the ledger entry for `command`; used by typed wrappers
    /// that reclassify a malformed success reply as `Unknown`.
    pub(crate) fn reclassify(&self, command: &str, code: ErrorCode) -> ErrorCode {
        self.inner.record(command, code);
        code
    }
}
