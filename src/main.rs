use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cupid_swipe::config::Settings;
use cupid_swipe::core::{CompatibilityScorer, Matchmaker};
use cupid_swipe::routes::{self, AppState};
use cupid_swipe::services::{AzureReasoningClient, AzureSpeechClient, LedgerStore, ProfileSnapshot};

fn io_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logging
    let filter = EnvFilter::try_new(&settings.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.compact().init();
    }

    info!("Starting Cupid swipe service...");

    // Load the profile snapshot; a malformed dataset is fatal
    let snapshot = ProfileSnapshot::load(&settings.profiles.csv_path)
        .map_err(|e| io_error("Failed to load profiles", e))?;

    info!("Profile snapshot ready ({} profiles)", snapshot.profiles().len());

    let ledger = LedgerStore::from_settings(&settings.database)
        .await
        .map_err(|e| io_error("Failed to open ledger database", e))?;

    info!("Ledger database initialized (max: {} connections)", settings.database.max_connections);

    let reasoning_timeout = Duration::from_secs(settings.reasoning.timeout_secs);
    let speech_timeout = Duration::from_secs(settings.speech.timeout_secs);

    let reasoning = AzureReasoningClient::new(
        settings.reasoning.endpoint.clone(),
        settings.reasoning.api_key.clone(),
        reasoning_timeout,
    )
    .map_err(|e| io_error("Failed to build reasoning client", e))?;

    if !reasoning.is_configured() {
        tracing::warn!("No reasoning endpoint configured, analytics will use fallbacks");
    }

    let speech = AzureSpeechClient::new(
        settings.speech.stt_endpoint.clone(),
        settings.speech.tts_endpoint.clone(),
        settings.speech.api_key.clone(),
        settings.speech.voice.clone(),
        speech_timeout,
    )
    .map_err(|e| io_error("Failed to build speech client", e))?;

    let weights = settings.scoring_weights();
    let scorer = CompatibilityScorer::new(weights, settings.scoring.promising_threshold);

    info!("Scorer initialized with weights: {:?}", weights);

    let matchmaker = Matchmaker::new(Arc::new(snapshot), ledger, Arc::new(reasoning), Arc::new(speech))
        .with_scorer(scorer)
        .with_timeouts(reasoning_timeout, speech_timeout);

    // Build application state
    let app_state = AppState {
        matchmaker: Arc::new(matchmaker),
    };

    // Configure HTTP server
    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .configure(routes::configure_extractors)
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .configure(routes::configure_routes)
    })
    .workers(workers)
    .bind((host, port))?
    .run()
    .await
}
