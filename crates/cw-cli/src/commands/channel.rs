//! Broadcaster id lookup.

use std::io::Write;

use anyhow::{Context, Result};

use super::util::{helix_client, helix_error};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, login: &str) -> Result<()> {
    let client = helix_client(config)?;
    let runtime = tokio::runtime::Runtime::new().context("failed to initialize tokio runtime")?;
    let id = runtime
        .block_on(client.user_id(login))
        .map_err(|e| helix_error(e, "failed to look up channel"))?;

    writeln!(writer, "{}: {id}", login.trim().to_lowercase())?;
    writeln!(
        writer,
        "Set broadcaster_id = \"{id}\" in config.toml to skip this lookup when watching."
    )?;
    Ok(())
}
