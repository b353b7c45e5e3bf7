use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::protocol::Packet;
use crate::transport::{FrameSink, FrameSource, TransportError};

/// One end of an in-process packet pipe. Dropping an end closes the pipe
/// for the other side once its queue is drained.
pub struct InMemoryTransport {
    source: InMemorySource,
    sink: InMemorySink,
}

pub struct InMemorySource {
    rx: mpsc::UnboundedReceiver<Packet>,
}

#[derive(Clone)]
pub struct InMemorySink {
    tx: mpsc::UnboundedSender<Packet>,
}

impl InMemoryTransport {
    pub fn pair() -> (Self, Self) {
        let (tx1, rx1) = mpsc::unbounded_channel();
        let (tx2, rx2) = mpsc::unbounded_channel();
        (
            Self {
                source: InMemorySource { rx: rx1 },
                sink: InMemorySink { tx: tx2 },
            },
            Self {
                source: InMemorySource { rx: rx2 },
                sink: InMemorySink { tx: tx1 },
            },
        )
    }

    pub fn into_split(self) -> (InMemorySource, InMemorySink) {
        (self.source, self.sink)
    }
}

#[async_trait]
impl FrameSource for InMemorySource {
    async fn recv(&mut self) -> Result<Packet, TransportError> {
        self.rx.recv().await.ok_or(TransportError::Closed)
    }
}

#[async_trait]
impl FrameSink for InMemorySink {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        self.tx.send(packet.clone()).map_err(|_| TransportError::Closed)
    }
}

#[async_trait]
impl FrameSource for InMemoryTransport {
    async fn recv(&mut self) -> Result<Packet, TransportError> {
        self.source.recv().await
    }
}

#[async_trait]
impl FrameSink for InMemoryTransport {
    async fn send(&mut self, packet: &Packet) -> Result<(), TransportError> {
        self.sink.send(packet).await
    }
}
