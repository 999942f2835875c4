use std::io::{self, ErrorKind};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use futures::StreamExt;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec, LinesCodecError};
use crate::command;
use crate::participant::Participant;
use crate::protocol::{self, IDLE_TIMEOUT, MAX_MSG_LEN, WELCOME};
use crate::server::{Lobby, ServerConfig};

// how long teardown waits for a mailbox to flush onto a stalled socket
const FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

enum Exit {
    Disconnected(Result<(), LinesCodecError>),
    WriteFailed(Result<(), LinesCodecError>),
    Idle,
    Evicted,
}

/// Runs one connection from welcome to teardown.
pub async fn handle_user<R, W>(reader: R, writer: W, addr: SocketAddr, lobby: Lobby, config: ServerConfig)
where
    R: AsyncRead + Unpin + Send + 'static,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let stream = FramedRead::new(reader, LinesCodec::new_with_max_length(MAX_MSG_LEN));
    let sink = FramedWrite::new(writer, LinesCodec::new_with_max_length(MAX_MSG_LEN + 100));

    let (me, mailbox) = Participant::new(addr, config.mailbox_capacity);
    let mut delivery = tokio::spawn(mailbox.run(sink));
    me.send_direct(WELCOME).await;
    if let Err(err) = lobby.registry().join(me.clone()) {
        tracing::debug!("{addr} refused: {err}");
        me.send_direct(err.to_string()).await;
        me.close();
        flush(delivery).await;
        return;
    }
    let name = me.name();
    tracing::debug!("{addr} joined as {name}");
    lobby.broadcast(protocol::joined(&name)).await;

    let activity = Arc::new(Notify::new());
    let mut reader = tokio::spawn(read_loop(stream, me.clone(), lobby.clone(), activity.clone()));

    let exit = loop {
        tokio::select! {
            biased;
            _ = activity.notified() => continue,
            result = &mut reader => {
                break Exit::Disconnected(result.unwrap_or(Ok(())));
            },
            _ = me.closed() => break Exit::Evicted,
            // the writer only returns early when the connection broke
            result = &mut delivery => {
                break Exit::WriteFailed(result.unwrap_or(Ok(())));
            },
            _ = tokio::time::sleep(config.idle_timeout) => break Exit::Idle,
        }
    };

    let delivery = match exit {
        Exit::Disconnected(result) => {
            log_exit(addr, result);
            Some(delivery)
        }
        Exit::WriteFailed(result) => {
            log_exit(addr, result);
            stop(reader).await;
            None
        }
        Exit::Idle => {
            tracing::debug!("{addr} idle for {:?}", config.idle_timeout);
            let _ = tokio::time::timeout(FLUSH_TIMEOUT, me.send_direct(IDLE_TIMEOUT)).await;
            stop(reader).await;
            Some(delivery)
        }
        Exit::Evicted => {
            stop(reader).await;
            Some(delivery)
        }
    };

    // teardown
    lobby.registry().leave(&me);
    me.close();
    let name = me.name();
    lobby.broadcast(protocol::left(&name)).await;
    if let Some(delivery) = delivery {
        flush(delivery).await;
    }
    tracing::debug!("{addr} disconnected, name {name}");
}

/// Reads lines, runs them as commands and reports activity after each one.
async fn read_loop<R>(
    mut stream: FramedRead<R, LinesCodec>,
    me: Arc<Participant>,
    lobby: Lobby,
    activity: Arc<Notify>,
) -> Result<(), LinesCodecError>
where
    R: AsyncRead + Unpin,
{
    let mut name = me.name();
    let mut discarding_long_msg = false;
    loop {
        let line = match stream.next().await {
            Some(Ok(line)) => line,
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                if !me.send_direct(protocol::too_long()).await {
                    return Ok(());
                }
                discarding_long_msg = true;
                activity.notify_one();
                continue;
            }
            Some(Err(LinesCodecError::Io(io_err))) => {
                return match io_err.kind() {
                    // user typed invalid utf8 like ^C or ^D
                    // and is probably trying to quit
                    ErrorKind::InvalidData | ErrorKind::InvalidInput => Ok(()),
                    _ => Err(LinesCodecError::Io(io_err)),
                };
            }
            // user disconnected, or the stream is resetting
            // after a line that was too long
            None => {
                if !discarding_long_msg {
                    return Ok(());
                }
                discarding_long_msg = false;
                continue;
            }
        };
        let outcome = command::execute(&lobby, &mut name, command::parse(&line));
        for reply in outcome.replies {
            if !me.send_direct(reply).await {
                return Ok(());
            }
        }
        if let Some(msg) = outcome.broadcast {
            lobby.broadcast(msg).await;
        }
        activity.notify_one();
    }
}

async fn stop(reader: JoinHandle<Result<(), LinesCodecError>>) {
    reader.abort();
    let _ = reader.await;
}

async fn flush(mut delivery: JoinHandle<Result<(), LinesCodecError>>) {
    match tokio::time::timeout(FLUSH_TIMEOUT, &mut delivery).await {
        Ok(Ok(Err(LinesCodecError::Io(err)))) if !ignore(&err) => {
            tracing::error!("unexpected write error: {err}");
        }
        Ok(_) => (),
        Err(_) => {
            tracing::warn!("mailbox flush timed out");
            delivery.abort();
        }
    }
}

// kinds of io errors we don't care about logging
const IGNORE_KINDS: [ErrorKind; 2] = [ErrorKind::BrokenPipe, ErrorKind::ConnectionReset];

fn ignore(io_err: &io::Error) -> bool {
    IGNORE_KINDS.contains(&io_err.kind())
}

fn log_exit(addr: SocketAddr, result: Result<(), LinesCodecError>) {
    match result {
        Err(LinesCodecError::Io(err)) if !ignore(&err) => {
            tracing::error!("{addr} unexpected error: {err}");
        }
        _ => (),
    }
}
