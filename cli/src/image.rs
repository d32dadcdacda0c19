//! Subcommands operating directly on the registry and object store.
//!
//! The registry can only be opened by a single process at a time, these
//! won't work while a server using the same registry is running.

use std::path::PathBuf;

use anyhow::Result;
use clap::{arg, Arg, ArgAction, ArgMatches};
use snapcode::{Config, Service};

pub fn cmds() -> Vec<clap::Command> {
    vec![
        clap::Command::new("upload")
            .display_order(10)
            .arg_required_else_help(true)
            .about("Uploads an image and prints its link")
            .arg(
                Arg::new("path")
                    .required(true)
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Image file to upload"),
            )
            .arg(json()),
        clap::Command::new("resolve")
            .display_order(11)
            .arg_required_else_help(true)
            .about("Prints the remote url behind a shortcode")
            .arg(arg!(<shortcode> "Shortcode, optionally with extension"))
            .arg(json()),
        clap::Command::new("list")
            .display_order(12)
            .about("Lists all images, most recent first")
            .arg(json()),
        clap::Command::new("delete")
            .display_order(13)
            .arg_required_else_help(true)
            .about("Deletes an image along with its remote object")
            .arg(arg!(<shortcode> "Shortcode, optionally with extension")),
    ]
}

fn json() -> Arg {
    Arg::new("json")
        .long("json")
        .action(ArgAction::SetTrue)
        .help("Print output as json")
}

pub async fn run(name: &str, matches: &ArgMatches, config: Config) -> Result<()> {
    if let Err(e) = snapcode::tracing::init(&config) {
        eprintln!("failed initializing tracing: {e}");
    }
    snapcode::init::initialize(&config)?;
    let service = Service::from_config(config)?;
    let as_json = matches.try_get_one::<bool>("json").ok().flatten().copied().unwrap_or(false);

    match name {
        "upload" => {
            let path = matches
                .get_one::<PathBuf>("path")
                .ok_or_else(|| anyhow::anyhow!("path is required"))?;
            let filename = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| anyhow::anyhow!("invalid file name: {}", path.display()))?;
            let mut file = tokio::fs::File::open(path).await?;
            let uploaded = service.upload(&mut file, filename).await?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&uploaded)?);
            } else {
                println!("{}", uploaded.link);
            }
        }
        "resolve" => {
            let resolved = service.resolve(shortcode(matches)?)?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&resolved)?);
            } else {
                println!("{}", resolved.remote_url);
            }
        }
        "list" => {
            let listing = service.list()?;
            if as_json {
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for entry in listing {
                    println!("{}\t{}\t{}", entry.shortcode, entry.timestamp, entry.remote_url);
                }
            }
        }
        "delete" => {
            let record = service.delete(shortcode(matches)?).await?;
            println!("deleted {} ({})", record.shortcode, record.filename);
        }
        _ => unreachable!("unknown subcommand: {name}"),
    }

    service.db.flush()?;
    Ok(())
}

fn shortcode(matches: &ArgMatches) -> Result<&str> {
    matches
        .get_one::<String>("shortcode")
        .map(String::as_str)
        .ok_or_else(|| anyhow::anyhow!("shortcode is required"))
}
