mod args;
mod tutor;

use std::sync::Arc;

use services::{Clock, HttpTutorClient, SessionError, TutorConfig, TutorLoopService};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use tutor_core::model::ImageRef;

use args::{Args, Command};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(args: &Args) -> Result<TutorConfig, Box<dyn std::error::Error>> {
    let mut config = TutorConfig::from_env()?;
    if let Some(url) = &args.api_url {
        config = config.with_base_url(url)?;
    }
    if let Some(max) = &args.max_attempts {
        config = config.with_max_attempts(max)?;
    }
    tracing::debug!(
        base_url = %config.base_url,
        max_attempts = config.policy.max_attempts(),
        "configuration loaded"
    );
    Ok(config)
}

async fn solve(args: Args, config: &TutorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = Arc::new(HttpTutorClient::from_config(config));
    let loop_svc = TutorLoopService::from_config(Clock::system(), client, config);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    let image = args.image.map(ImageRef::from_file).transpose()?;
    let mut text = args.text;
    let interactive = text.is_none() && image.is_none();

    loop {
        if interactive {
            let Some(line) = tutor::read_line(&mut lines, "Enter a math problem: ").await? else {
                return Ok(());
            };
            text = Some(line);
        }

        println!("Working out the steps...");
        let session = match loop_svc.start_session(text.as_deref(), image.clone()).await {
            Ok(session) => session,
            Err(SessionError::Validation(_)) if interactive => {
                println!("Please enter a math problem.");
                continue;
            }
            Err(err) if interactive && err.is_retryable() => {
                println!("Error: {err}");
                continue;
            }
            Err(SessionError::EmptyStepSequence) if interactive => {
                println!("No steps were generated for that problem. Try rephrasing it.");
                continue;
            }
            Err(err) => return Err(err.into()),
        };

        tutor::run_session(&session, &mut lines).await?;
        loop_svc.end_session();
        return Ok(());
    }
}

async fn ping(config: &TutorConfig) -> Result<(), Box<dyn std::error::Error>> {
    let client = HttpTutorClient::from_config(config);
    let banner = client.ping().await?;
    println!(
        "{} is up{}",
        client.base_url(),
        banner.map(|b| format!(": {b}")).unwrap_or_default()
    );
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let dotenv = dotenvy::dotenv();
    init_tracing();
    match dotenv {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(err) if err.not_found() => {}
        Err(err) => tracing::warn!(error = %err, "ignoring unreadable .env"),
    }

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let (cmd, parsed) = args::parse(argv).map_err(|e| {
        eprintln!("{e}");
        args::print_usage();
        e
    })?;

    match cmd {
        Command::Help => {
            args::print_usage();
            Ok(())
        }
        Command::Ping => ping(&load_config(&parsed)?).await,
        Command::Solve => {
            let config = load_config(&parsed)?;
            solve(parsed, &config).await
        }
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
