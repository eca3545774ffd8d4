#![warn(clippy::all, rust_2018_idioms)]

use clap::Parser;

fn main() -> anyhow::Result<()> {
    let args = schannel_cli::cli::Cli::parse();
    let settings = schannel_core::get_settings(args.data_dir.clone())?;

    if let Err(e) = schannel_cli::tracing::init(&args, &settings) {
        eprintln!("Failed to start tracing: {e}");
    }

    let rt = schannel_cli::runtime::create_runtime()?;
    rt.block_on(schannel_cli::commands::run(args.command, &settings))
}
