use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use intercom_gateway::api::ApiServer;
use intercom_gateway::config::file::load_config_file;
use intercom_gateway::voice::{AudioCache, ElevenLabsTts};
use intercom_gateway::{CallFlow, Config, MatchOutcome, PersonMatcher};

/// Intercom - voice gateway for the building's front door
#[derive(Parser)]
#[command(name = "intercom", version, about)]
struct Cli {
    /// Port to listen on (overrides PORT and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Path to a TOML config file
    #[arg(short, long, env = "INTERCOM_CONFIG")]
    config: Option<PathBuf>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Show how a transcript would be matched
    Match {
        /// Transcript text, e.g. "can I speak to Matt"
        transcript: String,
    },
    /// Render a phrase into the audio cache and print its URL
    Speak {
        /// Text to speak
        #[arg(default_value = "Hello! Who are you here to see?")]
        text: String,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let filter = match cli.verbose {
        0 => "info,intercom_gateway=info",
        1 => "info,intercom_gateway=debug",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("fatal: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config_path = cli.config.as_deref();

    if let Some(cmd) = cli.command {
        return match cmd {
            Command::Match { transcript } => match_transcript(config_path, &transcript),
            Command::Speak { text } => speak(Config::load(config_path, cli.port)?, &text).await,
        };
    }

    let config = Config::load(config_path, cli.port)?;
    tracing::debug!(?config, "loaded configuration");
    tracing::info!(
        port = config.server.port,
        public_url = %config.server.public_url,
        residents = config.directory.len(),
        "starting intercom gateway"
    );

    let server = config.server.clone();
    let calls = CallFlow::from_config(config)?;

    ApiServer::new(calls, server.port, server.audio_dir)
        .run()
        .await?;

    Ok(())
}

/// Match a transcript without any provider credentials
fn match_transcript(config_path: Option<&std::path::Path>, transcript: &str) -> anyhow::Result<()> {
    let fc = load_config_file(config_path)?;
    let matcher = PersonMatcher::new(fc.directory(), fc.matcher);

    match matcher.match_transcript(transcript) {
        MatchOutcome::Delivery(person) => {
            println!("delivery: {} (code {}, unverified)", person.name, person.verification_code);
        }
        MatchOutcome::Resident(resident) => {
            println!("resident: {} -> {}", resident.name, resident.phone_number);
        }
        MatchOutcome::NoMatch => println!("no match"),
    }

    Ok(())
}

/// Render a phrase through the audio cache
async fn speak(config: Config, text: &str) -> anyhow::Result<()> {
    let creds = config.credentials;
    let tts = Arc::new(ElevenLabsTts::new(
        creds.elevenlabs_api_key,
        creds.elevenlabs_voice_id,
        config.voice,
    )?);
    let cache = AudioCache::new(tts, config.server.audio_dir, &config.server.public_url);

    let url = cache.get_or_create(text).await?;
    println!("{url}");
    println!("file: {}", cache.dir().join(AudioCache::file_name(text)).display());

    Ok(())
}
