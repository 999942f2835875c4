use std::time::Duration;
use clap::Parser;
use lobby_chat::{stdout_logging, AddrArgs, Server, ServerConfig};
use lobby_chat::participant::DEFAULT_MAILBOX_CAPACITY;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

#[derive(Parser)]
#[command(long_about = None)]
struct Cli {
    #[command(flatten)]
    addr: AddrArgs,

    /// Seconds a client may stay silent before being disconnected
    #[arg(short = 't', long, default_value_t = 90)]
    idle_timeout: u64,

    /// Messages queued per client before it counts as too slow
    #[arg(long, default_value_t = DEFAULT_MAILBOX_CAPACITY)]
    mailbox: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    stdout_logging();
    let config = ServerConfig {
        addr: cli.addr.socket_addr(),
        idle_timeout: Duration::from_secs(cli.idle_timeout),
        mailbox_capacity: cli.mailbox,
    };
    let server = Server::bind(config).await?;
    server.run().await?;
    Ok(())
}
