use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use rishta_match::config::Settings;
use rishta_match::core::{
    DelegatingInterpreter, Dispatcher, MatchEngine, Matcher, PreferenceInterpreter,
    RuleBasedInterpreter, Vocabulary,
};
use rishta_match::routes::{self, matches::AppState};
use rishta_match::services::{ChatCompletionsClient, ProfileStore, ReasoningClient, UltraMsgClient};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// JSON error response for JSON payload errors
#[derive(Debug, serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}

impl std::fmt::Display for JsonError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

impl std::error::Error for JsonError {}

impl error::ResponseError for JsonError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::BAD_REQUEST))
            .json(self)
    }
}

/// Handle JSON payload errors
pub fn handle_json_payload_error(err: error::JsonPayloadError, req: &actix_web::HttpRequest) -> actix_web::Error {
    tracing::info!("JSON payload error on {}: {}", req.path(), err);
    JsonError {
        error: "invalid_json".to_string(),
        message: format!("Invalid JSON: {}", err),
        status_code: 400,
    }
    .into()
}

fn startup_error(context: &str, err: impl std::fmt::Display) -> std::io::Error {
    error!("{}: {}", context, err);
    std::io::Error::new(std::io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    // Load configuration before logging so the log settings apply
    let settings = Settings::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string())
    })?;

    // Initialize logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(true);

    if settings.logging.format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.init();
    }

    info!("Starting Rishta Match service...");

    settings
        .ensure_credentials()
        .map_err(|e| startup_error("Configuration error", e))?;

    info!("Configuration loaded successfully");

    // Load the read-only catalog
    let store = ProfileStore::from_json_file(&settings.catalog.path)
        .map_err(|e| startup_error("Failed to load rishta catalog", e))?;

    info!("Loaded {} rishta profiles from {}", store.len(), settings.catalog.path);

    // Initialize WhatsApp notifier
    let notifier = UltraMsgClient::new(
        settings.notifier.base_url.clone(),
        settings.notifier.instance.clone(),
        settings.notifier.token.clone(),
        settings.notifier.timeout(),
    )
    .map_err(|e| startup_error("Failed to create WhatsApp client", e))?;

    let dispatcher = Dispatcher::new(
        Arc::new(notifier),
        settings.notifier.country_code.clone(),
        settings.notifier.timeout(),
    );

    // Initialize the interpreter, delegating to the reasoning provider when enabled
    let matching = &settings.matching;
    let rules = RuleBasedInterpreter::new(Vocabulary::from_catalog(&store), matching.age_spread);

    let reasoning: Option<Arc<dyn ReasoningClient>> = if settings.reasoning.enabled {
        let client = ChatCompletionsClient::new(
            settings.reasoning.base_url.clone(),
            settings.reasoning.api_key.clone(),
            settings.reasoning.model.clone(),
            settings.reasoning.timeout(),
        )
        .map_err(|e| startup_error("Failed to create reasoning client", e))?;
        info!("Reasoning provider enabled (model {})", settings.reasoning.model);
        Some(Arc::new(client) as Arc<dyn ReasoningClient>)
    } else {
        info!("Reasoning provider disabled, using rule-based interpretation only");
        None
    };

    let interpreter: Arc<dyn PreferenceInterpreter> = match &reasoning {
        Some(client) => Arc::new(DelegatingInterpreter::new(
            rules,
            client.clone(),
            settings.reasoning.timeout(),
        )),
        None => Arc::new(rules),
    };

    let matcher = Matcher::new(matching.penalties(), matching.tie_break);

    info!("Matcher initialized: {:?}", matcher);

    let mut engine = MatchEngine::new(
        store,
        matching.prefilter_options(),
        interpreter,
        matcher,
        dispatcher,
    );
    if let Some(client) = reasoning {
        engine = engine.with_explainer(client, settings.reasoning.timeout());
    }

    // Build application state
    let app_state = AppState {
        engine: Arc::new(engine),
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
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
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
