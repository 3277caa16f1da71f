//! Writes the OpenAPI document exactly as the server serves it.
//!
//! ```text
//! cargo run --bin generate_openapi > openapi.json
//! cargo run --bin generate_openapi -- --output openapi.json --prefix /api
//! ```
//!
//! The path prefix defaults to `API_PREFIX` (from the environment or `.env`),
//! falling back to `/api` like the server.

use std::{env, fs, io::Write, path::PathBuf};

use anyhow::{bail, Context, Result};
use solar_telemetry_service::{api, config::normalize_prefix};

#[derive(Debug, Default)]
struct Args {
    output: Option<PathBuf>,
    prefix: Option<String>,
}

impl Args {
    fn parse(mut raw: impl Iterator<Item = String>) -> Result<Self> {
        let mut args = Self::default();
        while let Some(flag) = raw.next() {
            match flag.as_str() {
                "--output" => args.output = Some(raw.next().context("--output needs a path")?.into()),
                "--prefix" => args.prefix = Some(raw.next().context("--prefix needs a value")?),
                other => bail!("unknown argument {other:?}"),
            }
        }
        Ok(args)
    }
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let args = Args::parse(env::args().skip(1))?;

    let prefix = args
        .prefix
        .or_else(|| env::var("API_PREFIX").ok())
        .unwrap_or_else(|| "/api".to_owned());
    let json = api::api_doc(&normalize_prefix(&prefix))
        .to_pretty_json()
        .context("failed to serialise OpenAPI document")?;

    match args.output {
        Some(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("failed to write {}", path.display()))?;
            eprintln!("OpenAPI document written to {}", path.display());
        }
        None => std::io::stdout()
            .write_all(json.as_bytes())
            .context("failed to write to stdout")?,
    }
    Ok(())
}
