use anyhow::Result;
use clap::{CommandFactory, Parser};
use refrain::app::{LiveOptions, run_live_command, run_sessions_command};
use refrain::cli::{Cli, Commands};
use refrain::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(Config::default_path);
    let config = Config::load_or_default(&config_path)?.with_env_overrides();

    match cli.command {
        None => {
            let options = LiveOptions {
                input: cli.input,
                device: cli.device,
                session: cli.session,
                resume: cli.resume,
                fast_model: cli.fast_model,
                refine_model: cli.refine_model,
                language: cli.language,
                chunk_secs: cli.chunk_size,
                snapshot_secs: cli.snapshot_interval,
                quiet: cli.quiet,
            };
            run_live_command(config, options).await?;
        }
        Some(Commands::Devices) => {
            #[cfg(feature = "cpal-audio")]
            {
                for device in refrain::audio::capture::list_devices()? {
                    println!("{}", device);
                }
            }
            #[cfg(not(feature = "cpal-audio"))]
            anyhow::bail!("refrain was built without microphone support");
        }
        Some(Commands::Sessions) => {
            run_sessions_command(&config)?;
        }
        Some(Commands::Completions { shell }) => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            clap_complete::generate(shell, &mut cmd, name, &mut std::io::stdout());
        }
    }

    Ok(())
}
