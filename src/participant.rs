use std::net::SocketAddr;
use std::sync::{Arc, PoisonError, RwLock};
use compact_str::CompactString;
use futures::SinkExt;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio_util::codec::{FramedWrite, LinesCodec, LinesCodecError};
use tokio_util::sync::CancellationToken;

pub type Msg = Arc<str>;

pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

// most messages written per flush
const WRITE_BATCH: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Queued,
    /// mailbox already shut, message dropped
    Closed,
    /// mailbox full, message dropped and participant shut down
    Overflow,
}

/// Server side state of one connected client. Everything written to the
/// connection goes through its mailbox.
pub struct Participant {
    name: RwLock<CompactString>,
    addr: SocketAddr,
    mailbox: mpsc::Sender<Msg>,
    shutdown: CancellationToken,
}

pub struct Mailbox {
    rx: mpsc::Receiver<Msg>,
    shutdown: CancellationToken,
}

impl Participant {
    pub fn new(addr: SocketAddr, capacity: usize) -> (Arc<Self>, Mailbox) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let shutdown = CancellationToken::new();
        let participant = Self {
            name: RwLock::new(CompactString::from(addr.to_string())),
            addr,
            mailbox: tx,
            shutdown: shutdown.clone(),
        };
        (Arc::new(participant), Mailbox { rx, shutdown })
    }

    pub fn name(&self) -> CompactString {
        self.name.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    // only the registry renames, while holding its write lock
    pub(crate) fn set_name(&self, name: CompactString) {
        *self.name.write().unwrap_or_else(PoisonError::into_inner) = name;
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Never waits. A full mailbox drops `msg` and shuts the participant down.
    pub fn deliver(&self, msg: Msg) -> Delivery {
        match self.mailbox.try_send(msg) {
            Ok(()) => Delivery::Queued,
            Err(TrySendError::Closed(_)) => Delivery::Closed,
            Err(TrySendError::Full(_)) => {
                self.shutdown.cancel();
                Delivery::Overflow
            }
        }
    }

    /// Waits for room. Returns false once the mailbox is shut.
    pub async fn send_direct(&self, msg: impl Into<Msg>) -> bool {
        self.mailbox.send(msg.into()).await.is_ok()
    }

    pub fn close(&self) {
        self.shutdown.cancel();
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    pub async fn closed(&self) {
        self.shutdown.cancelled().await
    }
}

impl Mailbox {
    /// Writes queued messages to `sink` in FIFO order, one flush per batch.
    /// After shutdown whatever is still queued gets written, then the sink
    /// is dropped.
    pub async fn run<W>(mut self, mut sink: FramedWrite<W, LinesCodec>) -> Result<(), LinesCodecError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut batch = Vec::with_capacity(WRITE_BATCH);
        loop {
            tokio::select! {
                biased;
                n = self.rx.recv_many(&mut batch, WRITE_BATCH) => {
                    if n == 0 {
                        break;
                    }
                    write_batch(&mut sink, &mut batch).await?;
                },
                _ = self.shutdown.cancelled() => break,
            }
        }
        self.rx.close();
        while self.rx.recv_many(&mut batch, WRITE_BATCH).await > 0 {
            write_batch(&mut sink, &mut batch).await?;
        }
        Ok(())
    }
}

async fn write_batch<W>(sink: &mut FramedWrite<W, LinesCodec>, batch: &mut Vec<Msg>) -> Result<(), LinesCodecError>
where
    W: AsyncWrite + Unpin,
{
    for msg in batch.drain(..) {
        sink.feed(msg).await?;
    }
    SinkExt::<Msg>::flush(sink).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use tokio_util::codec::FramedRead;

    fn addr() -> SocketAddr {
        "10.0.0.1:4000".parse().unwrap()
    }

    #[test]
    fn named_after_address() {
        let (participant, _mailbox) = Participant::new(addr(), 4);
        assert_eq!(participant.name(), "10.0.0.1:4000");
        assert_eq!(participant.addr(), addr());
    }

    #[test]
    fn overflow_drops_and_shuts_down() {
        let (participant, _mailbox) = Participant::new(addr(), 1);
        assert_eq!(participant.deliver("one".into()), Delivery::Queued);
        assert!(!participant.is_closed());
        assert_eq!(participant.deliver("two".into()), Delivery::Overflow);
        assert!(participant.is_closed());
    }

    #[test]
    fn deliver_after_mailbox_dropped() {
        let (participant, mailbox) = Participant::new(addr(), 4);
        drop(mailbox);
        assert_eq!(participant.deliver("late".into()), Delivery::Closed);
    }

    #[tokio::test]
    async fn writes_in_order_and_drains_on_close() {
        let (participant, mailbox) = Participant::new(addr(), 8);
        let (client, server) = tokio::io::duplex(1024);
        let task = tokio::spawn(mailbox.run(FramedWrite::new(server, LinesCodec::new())));

        participant.deliver("first".into());
        assert!(participant.send_direct("second").await);
        participant.deliver("third".into());
        participant.close();

        task.await.unwrap().unwrap();
        let lines: Vec<String> = FramedRead::new(client, LinesCodec::new())
            .map(Result::unwrap)
            .collect()
            .await;
        assert_eq!(lines, ["first", "second", "third"]);
        assert!(!participant.send_direct("after").await);
    }

    #[tokio::test]
    async fn backlog_is_written_in_batches() {
        let (participant, mailbox) = Participant::new(addr(), 256);
        for i in 0..200 {
            assert_eq!(participant.deliver(format!("m{i}").into()), Delivery::Queued);
        }
        participant.close();
        let (client, server) = tokio::io::duplex(64 * 1024);
        mailbox.run(FramedWrite::new(server, LinesCodec::new())).await.unwrap();

        let lines: Vec<String> = FramedRead::new(client, LinesCodec::new())
            .map(Result::unwrap)
            .collect()
            .await;
        let expected: Vec<String> = (0..200).map(|i| format!("m{i}")).collect();
        assert_eq!(lines, expected);
    }
}
