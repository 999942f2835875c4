pub mod command;
pub mod participant;
pub mod protocol;
pub mod registry;
pub mod router;
pub mod server;
pub mod session;

mod words;

pub use server::{Lobby, Server, ServerConfig};

// RANDOM NAME GENERATION //

use compact_str::CompactString;
use words::{ADJECTIVES, ANIMALS, WORDS, EMOJIS};

pub fn choose<T: Copy>(array: &[T]) -> T {
    array[fastrand::usize(..array.len())]
}

pub struct NameGenerator {
    adj_idx: usize,
    adj_offset: usize,
    an_idx: usize,
    an_offset_idx: usize,
    an_offsets: Vec<usize>,
}

impl Default for NameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameGenerator {
    pub fn new() -> Self {
        let mut an_offsets: Vec<usize> = (0..ANIMALS.len()).collect();
        fastrand::shuffle(&mut an_offsets);
        Self {
            adj_idx: 0,
            adj_offset: fastrand::usize(..ADJECTIVES.len()),
            an_idx: 0,
            an_offset_idx: 0,
            an_offsets,
        }
    }
    pub fn next(&mut self) -> CompactString {
        // keep iterating until we get an adj +
        // animal combo that is 8-12 characters
        let (adj, animal) = loop {
            let adj =
                ADJECTIVES[(self.adj_idx + self.adj_offset) % ADJECTIVES.len()];
            let animal = ANIMALS[(self.an_idx
                + self.an_offsets[self.an_offset_idx])
                % ANIMALS.len()];

            self.adj_idx += 1;
            self.adj_idx %= ADJECTIVES.len();
            self.an_idx += 1;
            self.an_idx %= ANIMALS.len();
            if self.adj_idx == 0 {
                self.an_idx = 0;
                self.an_offset_idx += 1;
                self.an_offset_idx %= self.an_offsets.len();
            }

            if (8..=12).contains(&(adj.len() + animal.len())) {
                break (adj, animal);
            }
        };

        let mut name = CompactString::new(adj);
        name.push_str(animal);
        name
    }
}

// RANDOM MSG GENERATION //

pub fn random_msg() -> String {
    let mut msg = String::with_capacity(32);
    let words = fastrand::u8(2..=10);
    for _ in 1..words {
        msg.push_str(choose(WORDS));
        msg.push(' ');
    }
    msg.push_str(choose(WORDS));
    if fastrand::bool() {
        msg.push(' ');
        msg.push(choose(EMOJIS));
    }
    msg
}

// COMMAND LINE //

use std::net::{IpAddr, SocketAddr, Ipv4Addr};
use clap::{Args, Parser};

pub const DEFAULT_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1));
pub const DEFAULT_PORT: u16 = 8888;

#[derive(Args, Debug, Clone, Copy)]
pub struct AddrArgs {
    #[arg(short, long, default_value_t = DEFAULT_IP)]
    pub ip: IpAddr,

    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,
}

impl AddrArgs {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }
}

#[derive(Parser)]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    addr: AddrArgs,
}

pub fn parse_socket_addr() -> SocketAddr {
    Cli::parse().addr.socket_addr()
}

// LOGGING //

const LOGS_DIR: &str = "logs";

use std::io;
use tracing_appender::{non_blocking::WorkerGuard, rolling::{RollingFileAppender, Rotation}};
use tracing_subscriber::{fmt, EnvFilter, layer::SubscriberExt};

pub fn stdout_logging() {
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::Layer::new().without_time().compact().with_ansi(true).with_writer(io::stdout));
    tracing::subscriber::set_global_default(subscriber)
            .expect("Unable to set a global subscriber");
}

pub fn file_logging(rotation: Rotation, log_file: &str) -> WorkerGuard {
    let _ = std::fs::create_dir(LOGS_DIR);
    let file_appender = RollingFileAppender::new(rotation, LOGS_DIR, log_file);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let subscriber = tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::Layer::new().compact().with_ansi(false).with_writer(non_blocking));
    tracing::subscriber::set_global_default(subscriber)
            .expect("Unable to set a global subscriber");
    guard
}

// MISC //

pub fn connection_refused(tried: SocketAddr) -> String {
    let mut msg = format!("No server listening on {tried}\n");
    msg.push_str("Try running: cargo run --release --bin chat-server");
    if tried.port() != DEFAULT_PORT || tried.ip() != DEFAULT_IP {
        msg.push_str(" --");
        if tried.ip() != DEFAULT_IP {
            msg.push_str(" -i ");
            msg.push_str(&tried.ip().to_string());
        }
        if tried.port() != DEFAULT_PORT {
            msg.push_str(" -p ");
            msg.push_str(&tried.port().to_string());
        }
    }
    msg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_fit_length() {
        let mut names = NameGenerator::new();
        for _ in 0..200 {
            let name = names.next();
            assert!((8..=12).contains(&name.len()), "{name}");
        }
    }

    #[test]
    fn refused_hint_mentions_non_default_flags() {
        let default = SocketAddr::new(DEFAULT_IP, DEFAULT_PORT);
        assert!(!connection_refused(default).contains(" -- "));
        let other = SocketAddr::new(DEFAULT_IP, 9000);
        assert!(connection_refused(other).ends_with("chat-server -- -p 9000"));
    }

    #[test]
    fn random_msgs_are_never_empty() {
        for _ in 0..50 {
            assert!(!random_msg().trim().is_empty());
        }
    }
}
