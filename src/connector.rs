// ABOUTME: Dialing and bind-handshake capability consumed by Session to obtain a bound connection
// ABOUTME: Wraps a TCP stream with frame-based buffered I/O, split into independent read/write halves

use crate::codec::{CodecError, Frame, PduHeader, PduRegistry};
use crate::datatypes::{
    AddressRange, BindReceiver, BindTransceiver, BindTransmitter, CommandStatus,
    NumericPlanIndicator, Password, SystemId, SystemType, TypeOfNumber,
};
use bytes::{Buf, BytesMut};
use std::future::Future;
use std::io;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};

/// Which bind operation to perform against the peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindKind {
    Transmitter,
    Receiver,
    Transceiver,
}

/// Credentials presented during the bind handshake.
#[derive(Debug, Clone)]
pub struct BindCredentials {
    pub system_id: String,
    pub password: String,
    pub system_type: String,
    pub bind_kind: BindKind,
}

impl BindCredentials {
    pub fn new(system_id: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            system_id: system_id.into(),
            password: password.into(),
            system_type: String::new(),
            bind_kind: BindKind::Transceiver,
        }
    }

    pub fn system_type(mut self, system_type: impl Into<String>) -> Self {
        self.system_type = system_type.into();
        self
    }

    pub fn bind_kind(mut self, bind_kind: BindKind) -> Self {
        self.bind_kind = bind_kind;
        self
    }
}

#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("io error during connect: {0}")]
    Io(#[from] io::Error),

    #[error("codec error during bind handshake: {0}")]
    Codec(#[from] CodecError),

    #[error("peer rejected bind with status {status:?}")]
    BindRejected { status: CommandStatus },

    #[error("expected a bind response, got command_id {actual:?}")]
    UnexpectedResponse { actual: crate::datatypes::CommandId },

    #[error("connection closed before the bind handshake completed")]
    ConnectionClosed,
}

/// Capability for obtaining a bound, authenticated [`Connection`].
///
/// Consumed by [`crate::session::Session`]; kept as a trait so tests can swap
/// in an in-memory double instead of dialing a real socket.
pub trait Connector: Send + Sync {
    fn connect(&self) -> impl Future<Output = Result<Connection, ConnectorError>> + Send;
}

/// Dials a TCP socket and performs the SMPP bind handshake.
pub struct TcpConnector {
    addr: String,
    credentials: BindCredentials,
    registry: Arc<PduRegistry>,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>, credentials: BindCredentials) -> Self {
        Self {
            addr: addr.into(),
            credentials,
            registry: Arc::new(PduRegistry::new()),
        }
    }

    fn bind_frame(&self, sequence_number: u32) -> Frame {
        let system_id = SystemId::from(self.credentials.system_id.as_str());
        let password = Password::from(self.credentials.password.as_str());
        let system_type = SystemType::from(self.credentials.system_type.as_str());
        match self.credentials.bind_kind {
            BindKind::Transmitter => Frame::BindTransmitter(Box::new(BindTransmitter {
                command_status: CommandStatus::Ok,
                sequence_number,
                system_id,
                password: Some(password),
                system_type,
                interface_version: crate::datatypes::InterfaceVersion::SmppV34,
                addr_ton: TypeOfNumber::Unknown,
                addr_npi: NumericPlanIndicator::Unknown,
                address_range: AddressRange::default(),
            })),
            BindKind::Receiver => Frame::BindReceiver(Box::new(BindReceiver {
                command_status: CommandStatus::Ok,
                sequence_number,
                system_id,
                password: Some(password),
                system_type,
                interface_version: crate::datatypes::InterfaceVersion::SmppV34,
                addr_ton: TypeOfNumber::Unknown,
                addr_npi: NumericPlanIndicator::Unknown,
                address_range: AddressRange::default(),
            })),
            BindKind::Transceiver => Frame::BindTransceiver(Box::new(BindTransceiver {
                command_status: CommandStatus::Ok,
                sequence_number,
                system_id,
                password: Some(password),
                system_type,
                interface_version: crate::datatypes::InterfaceVersion::SmppV34,
                addr_ton: TypeOfNumber::Unknown,
                addr_npi: NumericPlanIndicator::Unknown,
                address_range: AddressRange::default(),
            })),
        }
    }
}

impl Connector for TcpConnector {
    async fn connect(&self) -> Result<Connection, ConnectorError> {
        let stream = TcpStream::connect(&self.addr).await?;
        stream.set_nodelay(true).ok();
        let mut conn = Connection::new(stream, self.registry.clone());

        conn.write_frame(&self.bind_frame(1)).await?;

        let response = conn
            .read_frame()
            .await?
            .ok_or(ConnectorError::ConnectionClosed)?;

        let (status, system_id) = match &response {
            Frame::BindTransmitterResp(resp) => (resp.command_status, resp.system_id.clone()),
            Frame::BindReceiverResp(resp) => (resp.command_status, resp.system_id.clone()),
            Frame::BindTransceiverResp(resp) => (resp.command_status, resp.system_id.clone()),
            other => {
                return Err(ConnectorError::UnexpectedResponse {
                    actual: other.command_id(),
                });
            }
        };

        if status != CommandStatus::Ok {
            return Err(ConnectorError::BindRejected { status });
        }

        conn.system_id = system_id.as_str().unwrap_or_default().to_string();
        Ok(conn)
    }
}

/// A bound SMPP connection: frame-buffered I/O over a TCP stream.
///
/// Splits into independent [`ConnectionReader`]/[`ConnectionWriter`] halves so
/// the inbound and outbound loops of a transceivable can run concurrently
/// without sharing a lock.
pub struct Connection {
    pub system_id: String,
    reader: ConnectionReader,
    writer: ConnectionWriter,
}

impl Connection {
    fn new(stream: TcpStream, registry: Arc<PduRegistry>) -> Self {
        let (read_half, write_half) = stream.into_split();
        Self {
            system_id: String::new(),
            reader: ConnectionReader {
                stream: read_half,
                buffer: BytesMut::with_capacity(4 * 1024),
                registry,
            },
            writer: ConnectionWriter {
                stream: BufWriter::new(write_half),
            },
        }
    }

    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectorError> {
        self.reader.read_frame().await
    }

    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectorError> {
        self.writer.write_frame(frame).await
    }

    /// Splits the connection for independent concurrent read/write tasks.
    pub fn split(self) -> (ConnectionReader, ConnectionWriter) {
        (self.reader, self.writer)
    }

    pub async fn close(mut self) -> Result<(), ConnectorError> {
        self.writer.stream.shutdown().await?;
        Ok(())
    }
}

/// The inbound half of a [`Connection`].
pub struct ConnectionReader {
    stream: OwnedReadHalf,
    buffer: BytesMut,
    registry: Arc<PduRegistry>,
}

impl ConnectionReader {
    /// Reads a single frame, buffering partial reads across calls.
    ///
    /// Returns `Ok(None)` on a clean peer shutdown between frames.
    pub async fn read_frame(&mut self) -> Result<Option<Frame>, ConnectorError> {
        loop {
            if let Some(frame) = self.parse_frame()? {
                return Ok(Some(frame));
            }

            if 0 == self.stream.read_buf(&mut self.buffer).await? {
                return if self.buffer.is_empty() {
                    Ok(None)
                } else {
                    Err(ConnectorError::ConnectionClosed)
                };
            }
        }
    }

    fn parse_frame(&mut self) -> Result<Option<Frame>, ConnectorError> {
        if self.buffer.len() < PduHeader::SIZE {
            return Ok(None);
        }

        let mut peek = std::io::Cursor::new(&self.buffer[..]);
        let header = match PduHeader::decode(&mut peek) {
            Ok(header) => header,
            Err(CodecError::Incomplete) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let total_len = header.command_length as usize;
        if self.buffer.len() < total_len {
            return Ok(None);
        }

        let frame_bytes = self.buffer.split_to(total_len).freeze();
        let mut cursor = std::io::Cursor::new(&frame_bytes[PduHeader::SIZE..]);
        let frame = self.registry.decode_pdu(header, &mut cursor)?;
        Ok(Some(frame))
    }
}

/// The outbound half of a [`Connection`].
pub struct ConnectionWriter {
    stream: BufWriter<OwnedWriteHalf>,
}

impl ConnectionWriter {
    pub async fn write_frame(&mut self, frame: &Frame) -> Result<(), ConnectorError> {
        let bytes = frame.to_bytes()?;
        self.stream.write_all(&bytes).await?;
        self.stream.flush().await?;
        Ok(())
    }

    pub async fn close(mut self) -> Result<(), ConnectorError> {
        self.stream.shutdown().await?;
        Ok(())
    }

    /// Shuts down the write half without consuming `self`, for callers that
    /// hold the writer behind a shared lock.
    pub async fn shutdown(&mut self) -> Result<(), ConnectorError> {
        self.stream.shutdown().await?;
        Ok(())
    }
}
