mod image;
mod passwd;
mod serve;

use std::path::Path;
use std::str::FromStr;

use clap::{Arg, ArgMatches, Command};
use snapcode::{config, tracing::Level, Config};
use tokio_util::sync::CancellationToken;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let matches = cmd().get_matches();
    let mut config = load_config(&matches)?;

    let verbosity = matches.get_one::<String>("verbosity");
    if let Some(verbosity) = verbosity {
        config.tracing.level = Level::from_str(verbosity)?;
    }

    match matches.subcommand() {
        Some(("serve", m)) => serve::run(m, config, cancel).await?,
        Some(("hash-password", m)) => passwd::run(m)?,
        Some((name, m)) => {
            // Logs would get mixed up with the printed output, only show them
            // when explicitly asked for.
            config.tracing.enabled = verbosity.is_some();
            image::run(name, m, config).await?
        }
        None => unreachable!("subcommand is required"),
    }

    Ok(())
}

/// Picks the config file given on the command line, otherwise falls back to
/// `snapcode.toml` in the working directory and finally to defaults.
fn load_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    match matches.get_one::<String>("config") {
        Some(path) => Ok(config::load_from(path)?),
        None => load_default(Path::new(config::CONFIG_FILE)),
    }
}

/// Defaults are only used when there's no file at all. A file that fails to
/// parse is an error.
fn load_default(path: &Path) -> anyhow::Result<Config> {
    if path.exists() {
        Ok(config::load_from(path.to_string_lossy())?)
    } else {
        Ok(Config::default())
    }
}

pub fn cmd() -> Command {
    Command::new("snapcode")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .infer_subcommands(true)
        .version(VERSION)
        .about("Upload images, get short shareable codes for them.")
        .subcommand(serve::cmd())
        .subcommands(image::cmds())
        .subcommand(passwd::cmd())
        .arg(
            Arg::new("config")
                .long("config")
                .short('c')
                .value_name("PATH")
                .global(true)
                .help("Path to the config file"),
        )
        .arg(
            Arg::new("verbosity")
                .long("verbosity")
                .short('v')
                .display_order(100)
                .value_name("level")
                .value_parser(["trace", "debug", "info", "warn", "error", "none"])
                .global(true)
                .help("Set the verbosity of the log output"),
        )
}
