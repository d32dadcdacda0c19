use std::net::SocketAddr;

use clap::{Arg, ArgMatches};
use snapcode::Config;
use tokio_util::sync::CancellationToken;

pub fn cmd() -> clap::Command {
    clap::Command::new("serve")
        .display_order(1)
        .about("Runs the http server")
        .arg(
            Arg::new("address")
                .long("address")
                .short('a')
                .value_name("ADDR")
                .value_parser(clap::value_parser!(SocketAddr))
                .help("Overrides the address to listen on"),
        )
}

pub async fn run(matches: &ArgMatches, mut config: Config, cancel: CancellationToken) -> anyhow::Result<()> {
    if let Some(address) = matches.get_one::<SocketAddr>("address") {
        config.address = *address;
    }

    let shutdown = cancel.clone();
    let mut server = tokio::spawn(snapcode::axum::start_with_shutdown(config, async move {
        shutdown.cancelled().await
    }));

    // Wait for either ctrl_c signal or the server stopping on its own
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            println!("Initiating graceful shutdown...");
            cancel.cancel();
        },
        result = &mut server => return Ok(result??),
    }

    server.await??;
    Ok(())
}
