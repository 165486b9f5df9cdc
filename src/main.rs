use std::path::PathBuf;

use anyhow::{bail, Result};
use tracing_subscriber::EnvFilter;

use mediaview::app::App;
use mediaview::config::ViewerConfig;

const USAGE: &str = "usage: mediaview <dir> [--secure]";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so they don't interleave with the viewer status on stdout.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env().add_directive("mediaview=info".parse()?))
        .init();

    let mut dir = None;
    let mut secure = false;
    for arg in std::env::args_os().skip(1) {
        if arg == "--secure" {
            secure = true;
        } else if arg == "-h" || arg == "--help" {
            println!("{}", USAGE);
            return Ok(());
        } else if dir.is_none() {
            dir = Some(PathBuf::from(arg));
        } else {
            bail!("{}", USAGE);
        }
    }
    let Some(dir) = dir else {
        bail!("{}", USAGE);
    };

    App::new(dir, secure, ViewerConfig::from_env()).run().await
}
