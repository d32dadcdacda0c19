//! Shows how to load configuration from file.
//!
//! Serves images from a local directory, which makes it usable without
//! access to an actual object store.

use snapcode::{config, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration from file
    let config: Config = config::load_from(format!(
        "{}/examples/snapcode.toml",
        env!("CARGO_MANIFEST_DIR")
    ))?;

    // Start the application
    snapcode::axum::start(config).await?;

    Ok(())
}
