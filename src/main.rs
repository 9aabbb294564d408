use anyhow::{Context, Result};
use avatext::audio::DurationAccountant;
use avatext::cli::{Cli, Commands, ConfigAction};
use avatext::config::Config;
use avatext::output::format_transcript;
use avatext::replay::{ReplayScript, replay_realtime, replay_simulated};
use avatext::sink::{StdoutFormat, StdoutSink, TranscriptSink};
use clap::{CommandFactory, Parser};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.quiet, cli.verbose);
    tracing::debug!(version = %avatext::version_string(), "starting");

    match cli.command {
        Commands::Replay {
            file,
            realtime,
            json,
            render_delay,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(ms) = render_delay {
                config.reveal.render_delay_ms = ms;
            }
            run_replay(&file, &config, realtime, json).await?;
        }
        Commands::Duration { payload } => {
            let config = load_config(cli.config.as_deref())?;
            let accountant = DurationAccountant::from_config(&config.audio);
            println!(
                "{} bytes, {:.3} ms",
                DurationAccountant::payload_bytes(payload.trim()),
                accountant.duration_ms(payload.trim())
            );
        }
        Commands::Config { action } => handle_config_command(action, cli.config.as_deref())?,
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "avatext", &mut std::io::stdout());
        }
    }

    Ok(())
}

/// `-q` → errors only, default → warnings, `-v` → debug, `-vv` → trace.
/// `RUST_LOG` wins when set.
fn init_logging(quiet: bool, verbose: u8) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("avatext={level}")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(custom_path: Option<&Path>) -> Result<Config> {
    let config = match custom_path {
        Some(path) => Config::load(path)?,
        None => match Config::default_path() {
            Some(path) => Config::load_or_default(&path)?,
            None => Config::default(),
        },
    };
    let config = config.with_env_overrides();
    config.validate()?;
    Ok(config)
}

async fn run_replay(file: &Path, config: &Config, realtime: bool, json: bool) -> Result<()> {
    let script = ReplayScript::load(file)
        .with_context(|| format!("Failed to load replay script {}", file.display()))?;
    let color = !json && std::io::stdout().is_terminal();
    let format = if json {
        StdoutFormat::Json
    } else {
        StdoutFormat::Text { color }
    };

    let transcript = if realtime {
        replay_realtime(&script, config, StdoutSink::new(format)).await?
    } else {
        let outcome = replay_simulated(&script, config);
        let mut sink = StdoutSink::new(format);
        for frame in &outcome.frames {
            if json {
                println!("{}", serde_json::to_string(frame)?);
            } else {
                for line in sink.render(&frame.update)? {
                    if color {
                        println!("{} {line}", format!("[{:>6} ms]", frame.at_ms).dimmed());
                    } else {
                        println!("[{:>6} ms] {line}", frame.at_ms);
                    }
                }
            }
        }
        sink.finish();
        outcome.transcript
    };

    if !json {
        println!();
        if color {
            println!("{}", "Final transcript".bold());
        } else {
            println!("Final transcript");
        }
        println!("{}", format_transcript(&transcript, color));
    }
    Ok(())
}

fn handle_config_command(action: ConfigAction, custom_path: Option<&Path>) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let config = load_config(custom_path)?;
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Path => {
            let path: Option<PathBuf> = custom_path.map(Path::to_path_buf).or_else(Config::default_path);
            match path {
                Some(path) => println!("{}", path.display()),
                None => anyhow::bail!("No configuration directory on this system"),
            }
        }
    }
    Ok(())
}
