use std::process::ExitCode;

use clap::{Parser, Subcommand};
use opentelemetry::sdk::trace::Tracer;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};
use uuid::Uuid;

use inhouse_bot::{cmd, config, PgStore};

#[derive(Parser, Debug)]
#[command(version, author, about = "Inhouse games admin tool")]
struct Args {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Show the participants of a game
    Show { game_id: Uuid },
    /// Report the champion a player used in a game
    Champion {
        game_id: Uuid,
        player_id: String,
        champion_id: i32,
    },
    /// Delete a game and all its participants
    Delete { game_id: Uuid },
}

fn install_tracing(
    config: Option<&config::TracingConfig>,
) -> Result<bool, Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(config.and_then(|c| c.filter.as_deref()).unwrap_or("info"))
    });

    // Jaeger sink, only when configured
    let tracer: Option<Tracer> = match config.and_then(|c| c.jaeger.as_ref()) {
        Some(endpoint) => Some(
            opentelemetry_jaeger::new_agent_pipeline()
                .with_endpoint(endpoint)
                .with_service_name("inhouse-bot")
                .install_simple()?,
        ),
        None => None,
    };
    let jaeger = tracer.is_some();

    let subscriber = tracing_subscriber::Registry::default()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .with(tracer.map(|t| tracing_opentelemetry::layer().with_tracer(t)));
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(jaeger)
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let config = match config::load_config(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {}: {}", args.config, e);
            return ExitCode::FAILURE;
        }
    };

    let jaeger = match install_tracing(config.tracing_config.as_ref()) {
        Ok(jaeger) => jaeger,
        Err(e) => {
            eprintln!("Failed to install tracing: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if jaeger {
        tracing::info!("Installed jaeger tracing");
    }

    tracing::info!("Connecting to postgres...");
    let store = match PgStore::connect(&config.db_config.database_url) {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let res = match args.command {
        Command::Show { game_id } => cmd::admin::show(&store, game_id).await,
        Command::Champion {
            game_id,
            player_id,
            champion_id,
        } => {
            cmd::player::champion(&store, game_id, &player_id, champion_id).await
        }
        Command::Delete { game_id } => cmd::admin::delete(&store, game_id).await,
    };

    let code = match res {
        Ok(Some(reply)) => {
            println!("{}", reply);
            ExitCode::SUCCESS
        }
        Ok(None) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            eprintln!("{}", e.as_message());
            ExitCode::FAILURE
        }
    };

    if jaeger {
        opentelemetry::global::shutdown_tracer_provider();
    }
    code
}
