pub mod avro;
pub mod cli;
pub mod data;
pub mod delimited;
pub mod detect;
pub mod io_utils;
pub mod profile;
pub mod render;
pub mod sniff;
pub mod stats;
pub mod stream;

use std::{env, sync::OnceLock};

use anyhow::{Context, Result};
use clap::Parser;
use log::LevelFilter;

use crate::{cli::Cli, profile::ProfileOptions};

static LOGGER: OnceLock<()> = OnceLock::new();

fn init_logging() {
    LOGGER.get_or_init(|| {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if env::var("RUST_LOG").is_err() {
            builder.filter_module("tabscan", LevelFilter::Info);
        }
        let _ = builder.format_timestamp_millis().try_init();
    });
}

pub fn run() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    let encoding = io_utils::resolve_encoding(cli.input_encoding.as_deref())?;
    let stream = detect::open_stream(&cli.input, cli.delimiter, encoding)
        .with_context(|| format!("Opening {:?}", cli.input))?;

    let options = ProfileOptions {
        sort_columns: !cli.no_sort,
        sample_size: cli.samples,
        least_frequent: cli.least_frequent,
    };
    let report = profile::profile(stream, &options)
        .with_context(|| format!("Profiling {:?}", cli.input))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render::render_text(&report));
    }
    Ok(())
}
