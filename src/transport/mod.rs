//! Moving frames over byte streams.
//!
//! Reads and writes loop until the whole 512-byte frame is through, so a
//! short read or write never splits a packet. An end-of-stream before the
//! frame completes is reported as [`TransportError::Closed`].

use std::fmt;
use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::config::PACKET_SIZE;
use crate::protocol::Packet;

pub mod in_memory;
pub mod tcp;

pub use in_memory::InMemoryTransport;
pub use tcp::TcpTransport;

#[derive(Debug)]
pub enum TransportError {
    /// The peer closed the stream.
    Closed,
    Io(io::Error),
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Closed => write!(f, "Connection closed by peer"),
            TransportError::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for TransportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            TransportError::Closed => None,
            TransportError::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::UnexpectedEof
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted => TransportError::Closed,
            _ => TransportError::Io(e),
        }
    }
}

/// Receiving half of a connection.
#[async_trait]
pub trait FrameSource: Send {
    async fn recv(&mut self) -> Result<Packet, TransportError>;
}

/// Sending half of a connection.
#[async_trait]
pub trait FrameSink: Send {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError>;
}

/// Read exactly one frame, retrying interrupted reads.
pub async fn read_frame<R>(reader: &mut R) -> Result<Packet, TransportError>
where
    R: AsyncRead + Unpin + ?Sized,
{
    let mut frame = [0u8; PACKET_SIZE];
    let mut filled = 0;
    while filled < PACKET_SIZE {
        match reader.read(&mut frame[filled..]).await {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(Packet::decode(&frame))
}

/// Write exactly one frame, retrying interrupted and short writes.
pub async fn write_frame<W>(writer: &mut W, packet: &Packet) -> Result<(), TransportError>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    let frame = packet.encode();
    let mut sent = 0;
    while sent < PACKET_SIZE {
        match writer.write(&frame[sent..]).await {
            Ok(0) => return Err(TransportError::Closed),
            Ok(n) => sent += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    writer.flush().await?;
    Ok(())
}

/// Frame reader over any async byte stream.
pub struct FrameReader<R> {
    inner: R,
}

impl<R> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        FrameReader { inner }
    }
}

#[async_trait]
impl<R: AsyncRead + Unpin + Send> FrameSource for FrameReader<R> {
    async fn recv(&mut self) -> Result<Packet, TransportError> {
        read_frame(&mut self.inner).await
    }
}

/// Frame writer over any async byte stream.
pub struct FrameWriter<W> {
    inner: W,
}

impl<W> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        FrameWriter { inner }
    }
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    /// Flush and half-close the stream.
    pub async fn shutdown(&mut self) -> Result<(), TransportError> {
        self.inner.shutdown().await?;
        Ok(())
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> FrameSink for FrameWriter<W> {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        write_frame(&mut self.inner, packet).await
    }
}
