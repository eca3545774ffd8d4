use anyhow::bail;
use schannel_core::Settings;
use schannel_shared::telemetry;

const APP_NAME: &str = "schannel_cli";

pub fn init(cli: &super::cli::Cli, settings: &Settings) -> anyhow::Result<()> {
    fn init_to_file(settings: &Settings) -> anyhow::Result<()> {
        let (file, filename) = telemetry::create_trace_file(&settings.data_dir, APP_NAME)?;
        let subscriber = telemetry::get_subscriber(APP_NAME.into(), &settings.log_filter, file);

        // Start logging to file
        match telemetry::init_subscriber(subscriber) {
            Ok(_) => {
                println!("Tracing started to file {filename:?}");
                Ok(())
            }
            Err(e) => {
                bail!("Failed to start tracing to file. Error: {e}");
            }
        }
    }

    if !cli.is_to_std_out {
        // Log to file
        match init_to_file(settings) {
            Ok(_) => return Ok(()),
            Err(e) => {
                // Print error and fall though to logging to stdout
                eprintln!("Failed to start logging to file: {e}");
            }
        }
    }

    // Log to stdout
    match tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(&settings.log_filter))
        .try_init()
    {
        Ok(_) => Ok(()),
        Err(e) => {
            bail!("Failed to start tracing. Error: {e}");
        }
    }
}
