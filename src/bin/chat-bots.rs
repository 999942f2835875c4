use std::net::SocketAddr;
use std::ops::{AddAssign, RangeInclusive};
use std::sync::Arc;
use std::time::Duration;
use compact_str::CompactString;
use futures::SinkExt;
use lobby_chat::{connection_refused, parse_socket_addr, random_msg, stdout_logging, NameGenerator};
use lobby_chat::protocol::{RENAME, TO, WHO};
use tokio::net::{
    tcp::{OwnedReadHalf, OwnedWriteHalf},
    TcpStream,
};
use tokio::task::JoinSet;
use tokio_stream::StreamExt;
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};

struct Bot<M> {
    msgs: M,
    msg_delay: RangeInclusive<u64>,
    sink: FramedWrite<OwnedWriteHalf, LinesCodec>,
    stream: FramedRead<OwnedReadHalf, LinesCodec>,
    stats: Stats,
}

#[derive(Default, Debug)]
struct Stats {
    sent_bytes: usize,
    got_bytes: usize,
    sent_msgs: usize,
    got_msgs: usize,
}

impl AddAssign for Stats {
    fn add_assign(&mut self, rhs: Self) {
        self.sent_bytes += rhs.sent_bytes;
        self.sent_msgs += rhs.sent_msgs;
        self.got_bytes += rhs.got_bytes;
        self.got_msgs += rhs.got_msgs;
    }
}

impl<M: Iterator<Item = String>> Bot<M> {
    async fn new(addr: SocketAddr, msgs: M, msg_delay: RangeInclusive<u64>) -> anyhow::Result<Self> {
        let conn = TcpStream::connect(addr).await?;
        let (reader, writer) = conn.into_split();
        let sink = FramedWrite::new(writer, LinesCodec::new());
        let stream = FramedRead::new(reader, LinesCodec::new());
        Ok(Self {
            msgs,
            msg_delay,
            sink,
            stream,
            stats: Stats::default(),
        })
    }
    async fn chat(mut self) -> anyhow::Result<Stats> {
        for msg in self.msgs {
            let msg_len = msg.len();
            self.sink.send(msg).await?;
            self.stats.sent_bytes += msg_len + 1;
            self.stats.sent_msgs += 1;
            let sleep = tokio::time::sleep(
                Duration::from_millis(fastrand::u64(self.msg_delay.clone()))
            );
            tokio::pin!(sleep);
            loop {
                tokio::select! {
                    option = self.stream.next() => {
                        match option {
                            Some(result) => {
                                let msg = result?;
                                self.stats.got_bytes += msg.len() + 1;
                                self.stats.got_msgs += 1;
                            }
                            None => anyhow::bail!("server hung up"),
                        }
                    },
                    _ = &mut sleep => {
                        break;
                    },
                };
            }
        }
        // dropping the connection is how a client leaves
        Ok(self.stats)
    }
}

/// Renames itself, then chats in public, checking `who` now and then.
struct Chatty {
    name: CompactString,
    send_msgs: usize,
    msgs_sent: usize,
}

impl Chatty {
    fn new(name: CompactString, send_msgs: usize) -> Self {
        Self {
            name,
            send_msgs,
            msgs_sent: 0,
        }
    }
}

impl Iterator for Chatty {
    type Item = String;
    fn next(&mut self) -> Option<Self::Item> {
        if self.msgs_sent >= self.send_msgs {
            return None;
        }
        let msg = if self.msgs_sent == 0 {
            format!("{RENAME}{}", self.name)
        } else if self.msgs_sent % 10 == 0 {
            WHO.to_owned()
        } else {
            random_msg()
        };
        self.msgs_sent += 1;
        Some(msg)
    }
}

/// Renames itself, then whispers to other bots, some of which have
/// already left by then.
struct Whisperer {
    name: CompactString,
    others: Arc<[CompactString]>,
    send_msgs: usize,
    msgs_sent: usize,
}

impl Whisperer {
    fn new(name: CompactString, others: Arc<[CompactString]>) -> Self {
        Self {
            name,
            others,
            send_msgs: 50,
            msgs_sent: 0,
        }
    }
}

impl Iterator for Whisperer {
    type Item = String;
    fn next(&mut self) -> Option<Self::Item> {
        if self.msgs_sent >= self.send_msgs {
            return None;
        }
        let msg = if self.msgs_sent == 0 {
            format!("{RENAME}{}", self.name)
        } else if fastrand::bool() {
            random_msg()
        } else {
            let target = &self.others[fastrand::usize(..self.others.len())];
            format!("{TO}{target}={}", random_msg())
        };
        self.msgs_sent += 1;
        Some(msg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let addr = parse_socket_addr();
    stdout_logging();
    let conn = match TcpStream::connect(addr).await {
        Ok(conn) => conn,
        Err(err) => {
            match err.kind() {
                std::io::ErrorKind::ConnectionRefused => {
                    tracing::error!("{}", connection_refused(addr));
                    std::process::exit(1)
                }
                // got unexpected err, re-throw
                _ => Err(err)?,
            }
        }
    };
    drop(conn);

    let mut name_generator = NameGenerator::new();
    let mut names = || {
        let mut name = name_generator.next();
        name.push_str(&fastrand::u16(..).to_string());
        name
    };

    let mut stats = Stats::default();
    let mut set = JoinSet::new();
    tracing::info!("spawning bots");

    // spawn 3 chatty bots
    for _ in 0..3 {
        let bot = Bot::new(addr, Chatty::new(names(), 100), 2000..=4000).await?;
        set.spawn(bot.chat());
    }

    // spawn 100 fast chatty bots
    for _ in 0..100 {
        let bot = Bot::new(addr, Chatty::new(names(), 1000), 100..=200).await?;
        set.spawn(bot.chat());
    }

    // spawn 10 whisperers that know each other's names
    let whisperers: Arc<[CompactString]> = (0..10).map(|_| names()).collect();
    for name in whisperers.iter() {
        let msgs = Whisperer::new(name.clone(), whisperers.clone());
        let bot = Bot::new(addr, msgs, 500..=1000).await?;
        set.spawn(bot.chat());
    }

    tracing::info!("waiting for all bots to finish");
    while let Some(join_result) = set.join_next().await {
        let chat_result = join_result?;
        match chat_result {
            Ok(bot_stats) => stats += bot_stats,
            Err(err) => {
                tracing::error!("{err}");
            }
        }
    }

    tracing::info!("sent bytes - {}", stats.sent_bytes);
    tracing::info!("got bytes  - {}", stats.got_bytes);
    tracing::info!("sent msgs  - {}", stats.sent_msgs);
    tracing::info!("got msgs   - {}", stats.got_msgs);

    Ok(())
}
