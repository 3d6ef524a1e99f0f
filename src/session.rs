// ABOUTME: Transceivable (bidirectional socket glue) and Session (rebinding wrapper) state machines
// ABOUTME: Correlates submit_resp by sequence number, runs the enquire-link ticker, and auto-rebinds

use crate::codec::Frame;
use crate::connector::{Connection, Connector, ConnectorError};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;

/// Why a transceivable or session stopped running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    ExplicitClosing,
    StoppingProcessOnly,
    ConnectionIssue,
    InvalidStreaming,
    UnbindClosing,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid settings: {0}")]
    InvalidSettings(&'static str),

    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("submit_resp called on a frame that cannot be responded to")]
    NotResponsePdu,

    #[error("the transceivable was closed before a response arrived")]
    Closed,

    #[error("rate limiter wait was cancelled")]
    LimiterFailed,
}

pub type OnPdu = Arc<dyn Fn(Frame, bool) + Send + Sync>;
pub type OnSubmitError = Arc<dyn Fn(Frame, String) + Send + Sync>;
pub type OnReceivingError = Arc<dyn Fn(String) + Send + Sync>;
pub type OnRebindingError = Arc<dyn Fn(String) + Send + Sync>;
pub type OnClosed = Arc<dyn Fn(CloseReason) + Send + Sync>;

/// Tuning knobs for a [`Session`]/[`Transceivable`] pair.
///
/// `Debug` is hand-written because the callback fields aren't `Debug`.
#[derive(Clone)]
pub struct SessionConfig {
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub enquire_link: Duration,
    pub throttle: f64,
    pub rebinding_interval: Duration,
    pub on_pdu: Option<OnPdu>,
    pub on_submit_error: Option<OnSubmitError>,
    pub on_receiving_error: Option<OnReceivingError>,
    pub on_rebinding_error: Option<OnRebindingError>,
    pub on_closed: Option<OnClosed>,
}

impl std::fmt::Debug for SessionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionConfig")
            .field("read_timeout", &self.read_timeout)
            .field("write_timeout", &self.write_timeout)
            .field("enquire_link", &self.enquire_link)
            .field("throttle", &self.throttle)
            .field("rebinding_interval", &self.rebinding_interval)
            .finish_non_exhaustive()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
            enquire_link: Duration::from_secs(20),
            throttle: 0.0,
            rebinding_interval: Duration::ZERO,
            on_pdu: None,
            on_submit_error: None,
            on_receiving_error: None,
            on_rebinding_error: None,
            on_closed: None,
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.read_timeout.is_zero() {
            return Err(SessionError::InvalidSettings("read_timeout must be > 0"));
        }
        if self.read_timeout <= self.enquire_link {
            return Err(SessionError::InvalidSettings(
                "read_timeout must be greater than enquire_link",
            ));
        }
        Ok(())
    }
}

/// A single-token-at-a-time rate limiter: `rate` tokens refill per second, burst of 1.
///
/// Grounded on the hand-rolled `Instant`-based timing style used for keepalive
/// bookkeeping elsewhere in this crate; no ready-made limiter crate is pulled in.
struct TokenBucket {
    rate_per_sec: f64,
    available: Mutex<(f64, Instant)>,
}

impl TokenBucket {
    fn new(rate_per_sec: f64) -> Self {
        Self {
            rate_per_sec,
            available: Mutex::new((1.0, Instant::now())),
        }
    }

    async fn wait(&self) {
        loop {
            let sleep_for = {
                let mut guard = self.available.lock().await;
                let (tokens, last) = &mut *guard;
                let now = Instant::now();
                let elapsed = now.saturating_duration_since(*last).as_secs_f64();
                *tokens = (*tokens + elapsed * self.rate_per_sec).min(1.0);
                *last = now;
                if *tokens >= 1.0 {
                    *tokens -= 1.0;
                    None
                } else {
                    Some(Duration::from_secs_f64((1.0 - *tokens) / self.rate_per_sec))
                }
            };
            match sleep_for {
                None => return,
                Some(d) => tokio::time::sleep(d).await,
            }
        }
    }
}

type PendingMap = Arc<Mutex<HashMap<u32, oneshot::Sender<Frame>>>>;

/// Binds the outbound and inbound halves of one connection together.
///
/// Owns the reader and enquire-link tasks; dropping or calling
/// [`Transceivable::close`] stops both.
pub struct Transceivable {
    system_id: String,
    writer: Arc<Mutex<crate::connector::ConnectionWriter>>,
    pending: PendingMap,
    limiter: Option<Arc<TokenBucket>>,
    alive: Arc<AtomicBool>,
    next_seq: Arc<AtomicU32>,
    reader_task: JoinHandle<()>,
    enquire_task: Option<JoinHandle<()>>,
}

impl Transceivable {
    /// Takes ownership of a bound `Connection` and spawns its reader and
    /// (if enabled) enquire-link tasks.
    pub fn spawn(
        connection: Connection,
        config: SessionConfig,
        on_closed: Option<OnClosed>,
    ) -> Self {
        let system_id = connection.system_id.clone();
        let (reader, writer) = connection.split();
        let writer = Arc::new(Mutex::new(writer));
        let pending: PendingMap = Arc::new(Mutex::new(HashMap::new()));
        let alive = Arc::new(AtomicBool::new(true));
        let next_seq = Arc::new(AtomicU32::new(1));
        let limiter = if config.throttle > 0.0 {
            Some(Arc::new(TokenBucket::new(config.throttle)))
        } else {
            None
        };

        let reader_task = tokio::spawn(receive_loop(
            reader,
            pending.clone(),
            writer.clone(),
            alive.clone(),
            config.read_timeout,
            config.on_pdu.clone(),
            config.on_receiving_error.clone(),
            on_closed.clone(),
        ));

        let enquire_task = if !config.enquire_link.is_zero() {
            Some(tokio::spawn(enquire_link_loop(
                writer.clone(),
                pending.clone(),
                alive.clone(),
                next_seq.clone(),
                config.enquire_link,
                config.on_submit_error.clone(),
                on_closed,
            )))
        } else {
            None
        };

        Self {
            system_id,
            writer,
            pending,
            limiter,
            alive,
            next_seq,
            reader_task,
            enquire_task,
        }
    }

    pub fn system_id(&self) -> &str {
        &self.system_id
    }

    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Assigns the next sequence number and writes `frame` to the socket,
    /// applying the rate limiter first if configured. Returns the assigned
    /// sequence number.
    pub async fn submit(&self, mut frame: Frame) -> Result<u32, SessionError> {
        if let Some(limiter) = &self.limiter {
            limiter.wait().await;
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        frame.set_sequence_number(seq);
        let mut writer = self.writer.lock().await;
        writer.write_frame(&frame).await?;
        Ok(seq)
    }

    /// Submits `frame`, assigning it the next sequence number, and waits for
    /// its correlated response, honoring `timeout`.
    pub async fn submit_resp(
        &self,
        mut frame: Frame,
        timeout: Duration,
    ) -> Result<Frame, SessionError> {
        if !frame.can_response() {
            return Err(SessionError::NotResponsePdu);
        }
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        frame.set_sequence_number(seq);

        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().await;
            pending.insert(seq, tx);
        }

        if let Some(limiter) = &self.limiter {
            limiter.wait().await;
        }
        {
            let mut writer = self.writer.lock().await;
            if let Err(e) = writer.write_frame(&frame).await {
                drop(writer);
                self.pending.lock().await.remove(&seq);
                return Err(e.into());
            }
        }

        let result = tokio::time::timeout(timeout, rx).await;
        self.pending.lock().await.remove(&seq);
        match result {
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(_)) => Err(SessionError::Closed),
            Err(_) => Err(SessionError::LimiterFailed),
        }
    }

    /// One-shot close: stops both tasks and shuts down the socket.
    pub async fn close(&self) {
        if self
            .alive
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }
        self.reader_task.abort();
        if let Some(task) = &self.enquire_task {
            task.abort();
        }
        let mut writer = self.writer.lock().await;
        let _ = writer.shutdown().await;
    }
}

impl Drop for Transceivable {
    fn drop(&mut self) {
        self.reader_task.abort();
        if let Some(task) = &self.enquire_task {
            task.abort();
        }
    }
}

#[allow(clippy::too_many_arguments)]
async fn receive_loop(
    mut reader: crate::connector::ConnectionReader,
    pending: PendingMap,
    writer: Arc<Mutex<crate::connector::ConnectionWriter>>,
    alive: Arc<AtomicBool>,
    read_timeout: Duration,
    on_pdu: Option<OnPdu>,
    on_receiving_error: Option<OnReceivingError>,
    on_closed: Option<OnClosed>,
) {
    let reason = loop {
        let frame = match tokio::time::timeout(read_timeout, reader.read_frame()).await {
            Ok(Ok(Some(frame))) => frame,
            Ok(Ok(None)) => break CloseReason::ConnectionIssue,
            Ok(Err(_)) => break CloseReason::InvalidStreaming,
            Err(_) => break CloseReason::ConnectionIssue,
        };

        if matches!(frame, Frame::Unbind(_)) {
            if let Some(resp) = frame.get_response() {
                let mut w = writer.lock().await;
                let _ = w.write_frame(&resp).await;
            }
            break CloseReason::UnbindClosing;
        }

        let seq = frame.sequence_number();
        let sink = pending.lock().await.remove(&seq);
        if let Some(sink) = sink {
            let _ = sink.send(frame);
            continue;
        }

        if on_pdu.is_none() && frame.can_response() {
            if let Some(resp) = frame.get_response() {
                let mut w = writer.lock().await;
                let _ = w.write_frame(&resp).await;
            }
            continue;
        }

        if let Some(cb) = &on_pdu {
            let cb = cb.clone();
            let auto_responded = false;
            tokio::spawn(async move { cb(frame, auto_responded) });
        }
    };

    if !alive.swap(false, Ordering::AcqRel) {
        return;
    }
    if reason == CloseReason::InvalidStreaming {
        if let Some(cb) = &on_receiving_error {
            cb("malformed frame or truncated body".to_string());
        }
    }
    if let Some(cb) = on_closed {
        cb(reason);
    }
}

#[allow(clippy::too_many_arguments)]
async fn enquire_link_loop(
    writer: Arc<Mutex<crate::connector::ConnectionWriter>>,
    pending: PendingMap,
    alive: Arc<AtomicBool>,
    next_seq: Arc<AtomicU32>,
    interval: Duration,
    on_submit_error: Option<OnSubmitError>,
    on_closed: Option<OnClosed>,
) {
    const SUBMIT_RESP_TIMEOUT: Duration = Duration::from_secs(300);
    let mut ticker = tokio::time::interval(interval);

    loop {
        ticker.tick().await;
        if !alive.load(Ordering::Acquire) {
            return;
        }

        let seq = next_seq.fetch_add(1, Ordering::Relaxed);
        let frame = Frame::EnquireLink(crate::datatypes::EnquireLink::new(seq));

        let (tx, rx) = oneshot::channel();
        pending.lock().await.insert(seq, tx);

        let write_result = {
            let mut w = writer.lock().await;
            w.write_frame(&frame).await
        };

        if let Err(e) = write_result {
            pending.lock().await.remove(&seq);
            if let Some(cb) = &on_submit_error {
                cb(frame, e.to_string());
            }
            if !alive.swap(false, Ordering::AcqRel) {
                return;
            }
            if let Some(cb) = on_closed {
                cb(CloseReason::ConnectionIssue);
            }
            return;
        }

        let timed_out = tokio::time::timeout(SUBMIT_RESP_TIMEOUT, rx).await.is_err();
        pending.lock().await.remove(&seq);
        if timed_out {
            if let Some(cb) = &on_submit_error {
                cb(frame, "enquire_link response timed out".to_string());
            }
            if !alive.swap(false, Ordering::AcqRel) {
                return;
            }
            if let Some(cb) = on_closed {
                cb(CloseReason::ConnectionIssue);
            }
            return;
        }
    }
}

const STATE_ALIVE: u32 = 0;
const STATE_CLOSED: u32 = 1;

/// A rebinding-capable SMPP connection. Owns a [`Transceivable`] behind an
/// atomic slot so callers can sample `session.transceiver()` without a lock
/// while a rebind swaps it out underneath them.
pub struct Session<C: Connector + 'static> {
    id: String,
    config: SessionConfig,
    trx: Arc<Mutex<Option<Arc<Transceivable>>>>,
    state: Arc<AtomicU32>,
    rebinding: Arc<AtomicBool>,
    closed: Arc<AtomicBool>,
    throttle: Option<Arc<TokenBucket>>,
    _connector: std::marker::PhantomData<C>,
}

impl<C: Connector + 'static> Session<C> {
    pub async fn new(
        id: impl Into<String>,
        connector: Arc<C>,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        let state = Arc::new(AtomicU32::new(STATE_ALIVE));
        let rebinding = Arc::new(AtomicBool::new(false));
        let closed = Arc::new(AtomicBool::new(false));
        let throttle = if config.throttle > 0.0 {
            Some(Arc::new(TokenBucket::new(config.throttle)))
        } else {
            None
        };

        // The slot has to exist before the transceivable is spawned, since its
        // on_closed hook captures a handle to it for the rebind loop to swap.
        let trx_slot: Arc<Mutex<Option<Arc<Transceivable>>>> = Arc::new(Mutex::new(None));

        let on_closed = Self::build_rebind_hook(
            config.clone(),
            connector.clone(),
            state.clone(),
            rebinding.clone(),
            trx_slot.clone(),
        );
        let connection = connector.connect().await?;
        let trx = Arc::new(Transceivable::spawn(connection, config.clone(), Some(on_closed)));
        *trx_slot.lock().await = Some(trx);

        Ok(Self {
            id: id.into(),
            config,
            trx: trx_slot,
            state,
            rebinding,
            closed,
            throttle,
            _connector: std::marker::PhantomData,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire) || self.state.load(Ordering::Acquire) == STATE_CLOSED
    }

    /// The currently-bound transceivable. May change underneath the caller
    /// across a rebind; operations against the returned handle still
    /// complete against whichever connection was live when it was sampled.
    ///
    /// Panics only if called before the constructor installs the first
    /// transceivable, which `Session::new` guarantees never happens.
    pub async fn transceiver(&self) -> Arc<Transceivable> {
        self.trx
            .lock()
            .await
            .clone()
            .expect("Session::new installs the initial transceivable before returning")
    }

    /// Blocks for a throttle token. Callers issuing their own high-level
    /// submits should call this before each one; a no-op when unconfigured.
    pub async fn wait(&self) {
        if let Some(throttle) = &self.throttle {
            throttle.wait().await;
        }
    }

    /// Closes the current transceivable and marks the session terminal.
    /// Never triggers a rebind, even if one is in flight (the rebind loop
    /// observes `state == Closed` and exits on its own).
    pub async fn close(&self) -> Result<(), SessionError> {
        self.closed.store(true, Ordering::Release);
        self.state.store(STATE_CLOSED, Ordering::Release);
        if let Some(trx) = self.trx.lock().await.clone() {
            trx.close().await;
        }
        if let Some(cb) = &self.config.on_closed {
            cb(CloseReason::ExplicitClosing);
        }
        Ok(())
    }

    fn build_rebind_hook(
        config: SessionConfig,
        connector: Arc<C>,
        state: Arc<AtomicU32>,
        rebinding: Arc<AtomicBool>,
        trx_slot: Arc<Mutex<Option<Arc<Transceivable>>>>,
    ) -> OnClosed {
        let user_on_closed = config.on_closed.clone();
        let rebinding_interval = config.rebinding_interval;
        Arc::new(move |reason: CloseReason| {
            if let Some(cb) = &user_on_closed {
                cb(reason);
            }
            if reason == CloseReason::ExplicitClosing {
                return;
            }
            if rebinding_interval.is_zero() {
                return;
            }
            if state.load(Ordering::Acquire) == STATE_CLOSED {
                return;
            }
            tokio::spawn(rebind(
                trx_slot.clone(),
                config.clone(),
                connector.clone(),
                state.clone(),
                rebinding.clone(),
            ));
        })
    }
}

impl<C: Connector + 'static> Drop for Session<C> {
    fn drop(&mut self) {
        self.closed.store(true, Ordering::Release);
        self.state.store(STATE_CLOSED, Ordering::Release);
    }
}

async fn rebind<C: Connector + 'static>(
    trx_slot: Arc<Mutex<Option<Arc<Transceivable>>>>,
    config: SessionConfig,
    connector: Arc<C>,
    state: Arc<AtomicU32>,
    rebinding: Arc<AtomicBool>,
) {
    if rebinding
        .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
        .is_err()
    {
        return;
    }

    while state.load(Ordering::Acquire) == STATE_ALIVE {
        match connector.connect().await {
            Ok(connection) => {
                let on_closed = Session::<C>::build_rebind_hook(
                    config.clone(),
                    connector.clone(),
                    state.clone(),
                    rebinding.clone(),
                    trx_slot.clone(),
                );
                let new_trx = Arc::new(Transceivable::spawn(connection, config.clone(), Some(on_closed)));
                let mut slot = trx_slot.lock().await;
                *slot = Some(new_trx);
                rebinding.store(false, Ordering::Release);
                return;
            }
            Err(e) => {
                if let Some(cb) = &config.on_rebinding_error {
                    cb(e.to_string());
                }
                tokio::time::sleep(config.rebinding_interval).await;
            }
        }
    }
    rebinding.store(false, Ordering::Release);
}
