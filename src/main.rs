use actix_cors::Cors;
use actix_web::{error, http::StatusCode, middleware, web, App, HttpResponse, HttpServer};
use campus_swipe::config::{LoggingSettings, Settings, StoreBackend};
use campus_swipe::core::DocumentStore;
use campus_swipe::routes::{self, AppState};
use campus_swipe::services::{
    AdmissionAdvisor, AppwriteAccounts, AppwriteCollections, AppwriteStore, Authenticator,
    CacheManager, CollegeCatalog, DecisionSink, IdentityProvider, ImageCache, ImageLoader,
    MemoryAccounts, MemoryStore, ProfileService, ProfileStore, SessionRegistry,
};
use std::num::NonZeroUsize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
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

/// Handle query payload errors
pub fn handle_query_payload_error(err: error::QueryPayloadError, _req: &actix_web::HttpRequest) -> actix_web::Error {
    JsonError {
        error: "invalid_query".to_string(),
        message: format!("Invalid query: {}", err),
        status_code: 400,
    }
    .into()
}

/// LOG_LEVEL / LOG_FORMAT win over the `logging` settings section
fn init_logging(logging: &LoggingSettings) {
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| logging.level.clone());
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_else(|_| logging.format.clone());

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&log_level).unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_level(true);

    if log_format == "pretty" {
        subscriber.pretty().init();
    } else {
        subscriber.json().init();
    }
}

/// Build the document store and identity service for the configured backend
fn build_backends(settings: &Settings) -> (Arc<dyn DocumentStore>, Arc<dyn IdentityProvider>) {
    match settings.store.backend {
        StoreBackend::Appwrite => {
            let collections = AppwriteCollections {
                colleges: settings.collection.colleges.clone(),
                users: settings.collection.users.clone(),
            };

            let store = AppwriteStore::new(
                settings.store.endpoint.clone(),
                settings.store.api_key.clone(),
                settings.store.project_id.clone(),
                settings.store.database_id.clone(),
                collections,
            );
            let accounts = AppwriteAccounts::new(
                settings.store.endpoint.clone(),
                settings.store.project_id.clone(),
            );

            info!("Using remote document store at {}", settings.store.endpoint);
            let store: Arc<dyn DocumentStore> = Arc::new(store);
            let accounts: Arc<dyn IdentityProvider> = Arc::new(accounts);
            (store, accounts)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory document store; nothing will be persisted remotely");
            let store = match settings.store.seed_file.as_deref() {
                Some(path) => load_seed(path),
                None => MemoryStore::new(),
            };
            let store: Arc<dyn DocumentStore> = Arc::new(store);
            let accounts: Arc<dyn IdentityProvider> = Arc::new(MemoryAccounts::new());
            (store, accounts)
        }
    }
}

/// In-memory store preloaded with the college documents in `path`
fn load_seed(path: &str) -> MemoryStore {
    let documents = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|raw| serde_json::from_str::<Vec<serde_json::Value>>(&raw).map_err(|e| e.to_string()));

    match documents {
        Ok(documents) => {
            info!("Seeded {} college documents from {}", documents.len(), path);
            MemoryStore::with_documents(documents)
        }
        Err(e) => {
            error!("Failed to read seed file {}: {}", path, e);
            MemoryStore::new()
        }
    }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Load .env file if present
    dotenv::dotenv().ok();

    let settings = Settings::load();

    let logging = settings
        .as_ref()
        .map(|s| s.logging.clone())
        .unwrap_or_default();
    init_logging(&logging);

    info!("Starting Campus Swipe deck service...");

    let settings = settings.unwrap_or_else(|e| {
        error!("Failed to load configuration: {}", e);
        panic!("Configuration error: {}", e);
    });

    info!("Configuration loaded successfully");

    let (store, identity) = build_backends(&settings);

    let cache = Arc::new(CacheManager::new(
        settings.cache.l1_cache_size,
        settings.cache.ttl_secs,
    ));
    info!(
        "User record cache initialized ({} entries, TTL: {}s)",
        settings.cache.l1_cache_size, settings.cache.ttl_secs
    );

    let catalog = Arc::new(CollegeCatalog::new(Arc::clone(&store), Arc::clone(&cache)));
    let sink = DecisionSink::new(Arc::clone(&store), Arc::clone(&cache));
    let sessions = Arc::new(SessionRegistry::with_limits(
        Arc::clone(&catalog),
        sink,
        settings.sessions.max_sessions,
        Duration::from_secs(settings.sessions.idle_secs),
    ));

    let auth = Arc::new(Authenticator::new(identity, Arc::clone(&store)));

    let profiles = Arc::new(ProfileService::new(
        ProfileStore::new(&settings.profile.storage_dir),
        Arc::clone(&store),
    ));

    let max_images = NonZeroUsize::new(settings.images.max_entries).unwrap_or(NonZeroUsize::MIN);
    let images = Arc::new(ImageLoader::new(ImageCache::new(
        max_images,
        settings.images.max_bytes,
    )));
    info!(
        "Image cache initialized ({} entries, {} bytes)",
        max_images, settings.images.max_bytes
    );

    let advisor = Arc::new(AdmissionAdvisor::new(
        settings.advisor.endpoint.clone(),
        settings.advisor.api_key.clone(),
        settings.advisor.model.clone(),
    ));
    if !advisor.is_configured() {
        warn!("Advisor API key not set; admission checks will answer no");
    }

    let app_state = AppState {
        sessions,
        catalog,
        auth,
        profiles,
        images,
        advisor,
        cache,
    };

    let host = settings.server.host.clone();
    let port = settings.server.port;
    let workers = settings.server.workers.unwrap_or(4);

    info!("Starting HTTP server on {}:{}", host, port);

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .app_data(web::JsonConfig::default().error_handler(handle_json_payload_error))
            .app_data(web::QueryConfig::default().error_handler(handle_query_payload_error))
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
