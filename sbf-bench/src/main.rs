use {
    crate::{
        cli::{Cli, Command},
        config::ServerConfig,
        error::{BResult, Error},
    },
    clap::Parser,
    sbf::Filter,
    sbf_skytable::SkytableStore,
    std::{env, process},
};

#[macro_use]
extern crate log;

mod cli;
mod config;
mod error;

fn main() {
    env_logger::Builder::new()
        .parse_filters(&env::var("SBF_LOG").unwrap_or_else(|_| "info".to_owned()))
        .init();
    if let Err(e) = run() {
        error!("sbf-bench exited with error: {}", e);
        process::exit(0x01);
    }
}

fn run() -> BResult<()> {
    let cli = Cli::parse();
    let server: ServerConfig = (&cli).into();
    let mut store = SkytableStore::connect(server.host(), server.port())
        .map_err(|e| Error::Filter(e.into()))?;

    match cli.command {
        Command::Create { ratio, k, m } => {
            let filter = Filter::create(&mut store, &cli.refer, ratio, k, m)?;
            info!(
                "created filter '{}': {} slice(s) of {} bits, full_rate={}",
                cli.refer,
                filter.header().slice_count,
                filter.header().slice_size,
                filter.header().full_rate
            );
        }
        Command::Add { element } => {
            let mut filter = Filter::load(&mut store, &cli.refer)?;
            let added = filter.add(&mut store, element.as_bytes());
            if added {
                info!("added '{}' to '{}'", element, cli.refer);
            } else {
                warn!("failed to add '{}' to '{}'", element, cli.refer);
            }
        }
        Command::Check { element } => {
            let filter = Filter::load(&mut store, &cli.refer)?;
            let present = filter.check(&mut store, element.as_bytes());
            println!("{present}");
        }
        Command::Truncate => {
            Filter::truncate(&mut store, &cli.refer)?;
            info!("truncated '{}'", cli.refer);
        }
    }
    Ok(())
}
