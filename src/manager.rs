// ABOUTME: Pool of sessions with round-robin load balancing and high-level message composition
// ABOUTME: Dials connections outside the registry write lock per the rebind-safety design note

use crate::coding::{best_safe_coding, Coding};
use crate::codec::Frame;
use crate::connector::{BindCredentials, BindKind, ConnectorError, TcpConnector};
use crate::datatypes::{
    AddressError, CommandStatus, DataCoding, DestinationAddr, EsmClass, NumericPlanIndicator,
    SourceAddr, SubmitSm, SubmitSmResponse, TypeOfNumber,
};
use crate::session::{Session, SessionConfig, SessionError};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;

#[derive(Debug, Error)]
pub enum ManagerError {
    #[error("no item is available")]
    NoAvailableItem,

    #[error("manager has no active sessions")]
    NoConnection,

    #[error("no session registered under id {0:?}")]
    SessionNotFound(String),

    #[error(
        "cannot open {requested} connections, only {max} allowed in total ({current} already active)"
    )]
    TooManyConnections {
        requested: usize,
        max: usize,
        current: usize,
    },

    #[error("session error: {0}")]
    Session(#[from] SessionError),

    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),

    #[error("invalid address: {0}")]
    InvalidAddress(#[from] AddressError),
}

/// Strategy for picking a session id out of a candidate set.
pub trait Balancer: Send + Sync {
    fn pick(&self, ids: &[String]) -> Result<String, ManagerError>;
}

/// Picks `ids[counter % len]`, advancing a process-local atomic counter.
#[derive(Default)]
pub struct RoundRobin {
    index: AtomicU32,
}

impl Balancer for RoundRobin {
    fn pick(&self, ids: &[String]) -> Result<String, ManagerError> {
        if ids.is_empty() {
            return Err(ManagerError::NoAvailableItem);
        }
        let i = self.index.fetch_add(1, Ordering::Relaxed) as usize % ids.len();
        Ok(ids[i].clone())
    }
}

/// Connection parameters and behavioral tuning for a [`Manager`]'s pool.
#[derive(Clone)]
pub struct ManagerConfig {
    pub name: String,
    pub slug: String,
    pub url: String,
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub read_timeout: Duration,
    pub write_timeout: Duration,
    pub enquiry_interval: Duration,
    pub enquiry_timeout: Duration,
    pub max_connection: usize,
    pub throttle: f64,
    pub use_all_connection: bool,
    pub auto_rebind: bool,
    pub rebinding_interval: Duration,
    pub on_pdu: Option<crate::session::OnPdu>,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            slug: String::new(),
            url: String::new(),
            system_id: String::new(),
            password: String::new(),
            system_type: String::new(),
            read_timeout: Duration::from_secs(30),
            write_timeout: Duration::from_secs(10),
            enquiry_interval: Duration::from_secs(20),
            enquiry_timeout: Duration::from_secs(300),
            max_connection: 1,
            throttle: 0.0,
            use_all_connection: false,
            auto_rebind: false,
            rebinding_interval: Duration::from_secs(5),
            on_pdu: None,
        }
    }
}

impl ManagerConfig {
    fn session_config(&self) -> SessionConfig {
        SessionConfig {
            read_timeout: self.read_timeout,
            write_timeout: self.write_timeout,
            enquire_link: self.enquiry_interval,
            throttle: self.throttle,
            rebinding_interval: if self.auto_rebind {
                self.rebinding_interval
            } else {
                Duration::ZERO
            },
            on_pdu: self.on_pdu.clone(),
            on_submit_error: None,
            on_receiving_error: None,
            on_rebinding_error: None,
            on_closed: None,
        }
    }

    fn connector(&self) -> TcpConnector {
        let credentials = BindCredentials::new(&self.system_id, &self.password)
            .system_type(&self.system_type)
            .bind_kind(BindKind::Transceiver);
        TcpConnector::new(&self.url, credentials)
    }
}

/// A short message segment ready to ride inside one `submit_sm`.
struct ComposedSegment {
    data_coding: u8,
    payload: Vec<u8>,
}

/// Picks the best safe coding for `text`, splits it if needed, and prepends a
/// 16-bit-reference concatenation UDH to every segment of a multi-part message.
fn compose(text: &str) -> Vec<ComposedSegment> {
    const SEGMENTED_OCTET_LIMIT: usize = 133; // 140 - 7 bytes of UDH
    let (tag, splitter) = best_safe_coding(text);

    if !splitter.should_split(text, SEGMENTED_OCTET_LIMIT) {
        let payload = splitter
            .encode(text)
            .map(|b| b.to_vec())
            .unwrap_or_default();
        return vec![ComposedSegment {
            data_coding: tag,
            payload,
        }];
    }

    let mut reference_bytes = [0u8; 2];
    rand::rng().fill(&mut reference_bytes);
    let reference = u16::from_be_bytes(reference_bytes);
    let segments = splitter
        .encode_split(text, SEGMENTED_OCTET_LIMIT)
        .unwrap_or_default();
    let total = segments.len() as u8;

    segments
        .into_iter()
        .enumerate()
        .map(|(i, segment)| {
            let mut payload = Vec::with_capacity(segment.len() + 7);
            payload.push(0x06); // UDHL: 6 bytes follow
            payload.push(0x08); // IEI: concatenated short message, 16-bit reference
            payload.push(0x04); // IEDL
            payload.extend_from_slice(&reference.to_be_bytes());
            payload.push(total);
            payload.push((i + 1) as u8);
            payload.extend_from_slice(&segment);
            ComposedSegment {
                data_coding: tag,
                payload,
            }
        })
        .collect()
}

/// Classifies `phone` into `(ton, npi)` for a source address per §4.8's heuristics.
pub fn parse_src_phone(phone: &str) -> (TypeOfNumber, NumericPlanIndicator) {
    if phone.starts_with('+') {
        return (TypeOfNumber::International, NumericPlanIndicator::Isdn);
    }
    if phone.chars().count() <= 5 {
        return (TypeOfNumber::NetworkSpecific, NumericPlanIndicator::Unknown);
    }
    if !phone.is_empty() && phone.chars().all(|c| c.is_alphabetic()) {
        return (TypeOfNumber::Alphanumeric, NumericPlanIndicator::Unknown);
    }
    (TypeOfNumber::International, NumericPlanIndicator::Isdn)
}

/// Classifies `phone` into `(ton, npi)` for a destination address per §4.8.
pub fn parse_dest_phone(phone: &str) -> (TypeOfNumber, NumericPlanIndicator) {
    if phone.starts_with('+') {
        (TypeOfNumber::International, NumericPlanIndicator::Isdn)
    } else {
        (TypeOfNumber::Unknown, NumericPlanIndicator::Isdn)
    }
}

/// A message to send through [`Manager::send`].
pub struct Message {
    pub from: String,
    pub to: String,
    pub text: String,
}

/// The result of submitting one segment of a composed message.
pub struct SubmitOutcome {
    pub session_id: String,
    pub response: SubmitSmResponse,
}

static NEXT_SESSION_ID: AtomicU64 = AtomicU64::new(1);

fn generate_session_id() -> String {
    format!("session-{}", NEXT_SESSION_ID.fetch_add(1, Ordering::Relaxed))
}

/// A pool of transceiver sessions against one SMSC, load-balanced by a
/// pluggable [`Balancer`].
pub struct Manager {
    pub name: String,
    pub id: String,
    config: ManagerConfig,
    sessions: Arc<RwLock<HashMap<String, Arc<Session<TcpConnector>>>>>,
    session_ids: Arc<RwLock<Vec<String>>>,
    balancer: Arc<dyn Balancer>,
}

impl Manager {
    pub fn new(config: ManagerConfig) -> Self {
        Self {
            name: config.name.clone(),
            id: generate_session_id(),
            config,
            sessions: Arc::new(RwLock::new(HashMap::new())),
            session_ids: Arc::new(RwLock::new(Vec::new())),
            balancer: Arc::new(RoundRobin::default()),
        }
    }

    pub fn with_balancer(mut self, balancer: Arc<dyn Balancer>) -> Self {
        self.balancer = balancer;
        self
    }

    /// Opens `max_connection` sessions if configured to use them all,
    /// otherwise ensures at least one session exists.
    pub async fn start(&self) -> Result<(), ManagerError> {
        if self.config.use_all_connection {
            for _ in 0..self.config.max_connection {
                self.setup_connection().await?;
            }
            return Ok(());
        }
        if self.session_ids.read().await.is_empty() {
            self.setup_connection().await?;
        }
        Ok(())
    }

    /// Opens `n` new sessions, rejecting the request if it would exceed
    /// `max_connection`.
    pub async fn add_connection(&self, n: usize) -> Result<(), ManagerError> {
        let current = self.session_ids.read().await.len();
        if n > self.config.max_connection {
            return Err(ManagerError::TooManyConnections {
                requested: n,
                max: self.config.max_connection,
                current,
            });
        }
        if current + n > self.config.max_connection {
            return Err(ManagerError::TooManyConnections {
                requested: n,
                max: self.config.max_connection,
                current,
            });
        }
        let remaining = self.config.max_connection - current;
        for _ in 0..n.min(remaining) {
            self.setup_connection().await?;
        }
        Ok(())
    }

    /// Dials and binds a new session, then registers it. The dial happens
    /// before any lock is taken; only the brief map/vec insertion is guarded.
    async fn setup_connection(&self) -> Result<(), ManagerError> {
        let connector = Arc::new(self.config.connector());
        let id = generate_session_id();
        let session = Session::new(id.clone(), connector, self.config.session_config()).await?;
        let session = Arc::new(session);

        let mut sessions = self.sessions.write().await;
        let mut ids = self.session_ids.write().await;
        sessions.insert(id.clone(), session);
        ids.push(id);
        Ok(())
    }

    /// Closes and drops the named sessions, or every session if `ids` is empty.
    pub async fn remove_connection(&self, ids: &[String]) -> Result<(), ManagerError> {
        let targets: Vec<String> = if ids.is_empty() {
            self.session_ids.read().await.clone()
        } else {
            ids.to_vec()
        };

        for id in &targets {
            let session = {
                let sessions = self.sessions.read().await;
                sessions.get(id).cloned()
            };
            if let Some(session) = session {
                session.close().await?;
            }
            let mut sessions = self.sessions.write().await;
            let mut session_ids = self.session_ids.write().await;
            sessions.remove(id);
            session_ids.retain(|existing| existing != id);
        }
        Ok(())
    }

    /// Closes every session, clears the registry, and re-runs `start()`.
    pub async fn rebind(&self) -> Result<(), ManagerError> {
        self.remove_connection(&[]).await?;
        self.start().await
    }

    /// Balances among `ids` if non-empty, else among every active session.
    pub async fn get_connection(
        &self,
        ids: &[String],
    ) -> Result<Arc<Session<TcpConnector>>, ManagerError> {
        let candidates = if ids.is_empty() {
            self.session_ids.read().await.clone()
        } else {
            ids.to_vec()
        };
        if candidates.is_empty() {
            return Err(ManagerError::NoConnection);
        }
        let picked = self.balancer.pick(&candidates)?;
        let sessions = self.sessions.read().await;
        sessions
            .get(&picked)
            .cloned()
            .ok_or_else(|| ManagerError::SessionNotFound(picked))
    }

    /// Composes `text` into segments, and concurrently submits each on a
    /// balanced session, returning one outcome per segment.
    pub async fn send(
        &self,
        message: Message,
        ids: &[String],
    ) -> Result<Vec<SubmitOutcome>, ManagerError> {
        let (src_ton, src_npi) = parse_src_phone(&message.from);
        let (dst_ton, dst_npi) = parse_dest_phone(&message.to);
        let source_addr = SourceAddr::new(&message.from, src_ton)?;
        let destination_addr = DestinationAddr::new(&message.to, dst_ton)?;

        let segments = compose(&message.text);
        let mut tasks = Vec::with_capacity(segments.len());

        for segment in segments {
            let session = self.get_connection(ids).await?;
            let source_addr = source_addr.clone();
            let destination_addr = destination_addr.clone();
            tasks.push(tokio::spawn(async move {
                session.wait().await;
                let esm_class = if segment.payload.first() == Some(&0x06) {
                    EsmClass::default().with_udhi()
                } else {
                    EsmClass::default()
                };
                let short_message = crate::datatypes::ShortMessage::new(&segment.payload)
                    .map_err(|_| SessionError::InvalidSettings("composed segment too long"))?;
                let submit_sm = SubmitSm {
                    command_status: CommandStatus::Ok,
                    sequence_number: 0,
                    service_type: crate::datatypes::ServiceType::default(),
                    source_addr_ton: src_ton,
                    source_addr_npi: src_npi,
                    source_addr,
                    dest_addr_ton: dst_ton,
                    dest_addr_npi: dst_npi,
                    destination_addr,
                    esm_class,
                    protocol_id: 0,
                    priority_flag: 0,
                    schedule_delivery_time: Default::default(),
                    validity_period: Default::default(),
                    registered_delivery: 1,
                    replace_if_present_flag: 0,
                    data_coding: DataCoding::from_byte(segment.data_coding),
                    sm_default_msg_id: 0,
                    sm_length: short_message.len(),
                    short_message,
                    user_message_reference: None,
                    source_port: None,
                    destination_port: None,
                    sar_msg_ref_num: None,
                    sar_total_segments: None,
                    sar_segment_seqnum: None,
                    user_data_header: None,
                    privacy_indicator: None,
                    callback_num: None,
                    source_subaddress: None,
                    dest_subaddress: None,
                    language_indicator: None,
                    its_session_info: None,
                    message_payload: None,
                };

                let trx = session.transceiver().await;
                let resp = trx
                    .submit_resp(Frame::SubmitSm(Box::new(submit_sm)), Duration::from_secs(60))
                    .await?;
                let response = match resp {
                    Frame::SubmitSmResp(resp) => resp,
                    _ => {
                        return Err(SessionError::NotResponsePdu);
                    }
                };
                Ok::<SubmitOutcome, SessionError>(SubmitOutcome {
                    session_id: session.id().to_string(),
                    response,
                })
            }));
        }

        let mut outcomes = Vec::with_capacity(tasks.len());
        for task in tasks {
            match task.await {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(e)) => return Err(e.into()),
                Err(_) => return Err(ManagerError::NoConnection),
            }
        }
        Ok(outcomes)
    }

    /// Closes the named sessions, or all of them if `ids` is empty.
    pub async fn close(&self, ids: &[String]) -> Result<(), ManagerError> {
        self.remove_connection(ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_robin_cycles_evenly() {
        let balancer = RoundRobin::default();
        let ids: Vec<String> = vec!["a".into(), "b".into(), "c".into()];
        let mut counts = HashMap::new();
        for _ in 0..9 {
            let picked = balancer.pick(&ids).unwrap();
            *counts.entry(picked).or_insert(0) += 1;
        }
        assert_eq!(counts["a"], 3);
        assert_eq!(counts["b"], 3);
        assert_eq!(counts["c"], 3);
    }

    #[test]
    fn round_robin_rejects_empty() {
        let balancer = RoundRobin::default();
        assert!(matches!(
            balancer.pick(&[]),
            Err(ManagerError::NoAvailableItem)
        ));
    }

    #[test]
    fn src_phone_heuristics() {
        assert_eq!(
            parse_src_phone("+15551234"),
            (TypeOfNumber::International, NumericPlanIndicator::Isdn)
        );
        assert_eq!(
            parse_src_phone("123"),
            (TypeOfNumber::NetworkSpecific, NumericPlanIndicator::Unknown)
        );
        assert_eq!(
            parse_src_phone("HELLO"),
            (TypeOfNumber::Alphanumeric, NumericPlanIndicator::Unknown)
        );
        assert_eq!(
            parse_src_phone("15551234"),
            (TypeOfNumber::International, NumericPlanIndicator::Isdn)
        );
    }

    #[test]
    fn dest_phone_heuristics() {
        assert_eq!(
            parse_dest_phone("+15551234"),
            (TypeOfNumber::International, NumericPlanIndicator::Isdn)
        );
        assert_eq!(
            parse_dest_phone("15551234"),
            (TypeOfNumber::Unknown, NumericPlanIndicator::Isdn)
        );
    }

    #[test]
    fn compose_long_ascii_splits_under_limit_and_reassembles() {
        let text: String = std::iter::repeat('a').take(800).collect();
        let segments = compose(&text);
        assert!(segments.len() > 1);
        let (_, splitter) = best_safe_coding(&text);
        let mut reassembled = String::new();
        for segment in &segments {
            assert!(segment.payload.len() <= 140);
            // strip the 7-byte UDH before decoding
            let body = &segment.payload[7..];
            reassembled.push_str(&splitter.decode(body).unwrap());
        }
        assert_eq!(reassembled, text);
    }

    #[test]
    fn compose_short_message_has_no_udh() {
        let segments = compose("hello");
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].data_coding, 0x00);
    }
}
