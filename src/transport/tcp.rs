use std::io;

use async_trait::async_trait;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio::time::{timeout, Duration};

use crate::protocol::Packet;
use crate::transport::{read_frame, write_frame, FrameReader, FrameSink, FrameSource, FrameWriter, TransportError};

/// Longest a single frame write may take before the peer counts as gone.
pub const DEFAULT_WRITE_TIMEOUT: Duration = Duration::from_secs(30);

/// A framed TCP connection.
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    pub fn new(stream: TcpStream) -> Self {
        // Frames are small and latency matters more than batching.
        let _ = stream.set_nodelay(true);
        Self { stream }
    }

    pub async fn connect<A: ToSocketAddrs>(addr: A) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self::new(stream))
    }

    /// Split into independently owned reading and writing halves.
    pub fn into_split(self) -> (FrameReader<OwnedReadHalf>, FrameWriter<OwnedWriteHalf>) {
        let (read, write) = self.stream.into_split();
        (FrameReader::new(read), FrameWriter::new(write))
    }
}

#[async_trait]
impl FrameSink for TcpTransport {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        timeout(DEFAULT_WRITE_TIMEOUT, write_frame(&mut self.stream, packet))
            .await
            .map_err(|_| TransportError::Io(io::Error::new(io::ErrorKind::TimedOut, "frame write timed out")))?
    }
}

#[async_trait]
impl FrameSource for TcpTransport {
    async fn recv(&mut self) -> Result<Packet, TransportError> {
        read_frame(&mut self.stream).await
    }
}
