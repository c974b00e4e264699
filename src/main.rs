//! Mabratech API server

use clap::Parser;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mabratech_api::{
    config::Args,
    db::{
        schemas::{
            AnalyticsEventDoc, ContactDoc, ProductDoc, ProjectDoc, ServiceDoc,
            ANALYTICS_COLLECTION, CONTACT_COLLECTION, PRODUCT_COLLECTION, PROJECT_COLLECTION,
            SERVICE_COLLECTION,
        },
        DocumentStore, MemoryStore, MongoClient,
    },
    server,
    services::{DisabledNotifier, MailRelayNotifier, Notifier},
    types::{Clock, SystemClock},
    worker::{SideEffectQueue, SideEffectWorker},
    AppState,
};

async fn ensure_indexes(mongo: &MongoClient) -> mabratech_api::Result<()> {
    mongo.ensure_indexes::<ContactDoc>(CONTACT_COLLECTION).await?;
    mongo.ensure_indexes::<ServiceDoc>(SERVICE_COLLECTION).await?;
    mongo.ensure_indexes::<ProductDoc>(PRODUCT_COLLECTION).await?;
    mongo.ensure_indexes::<ProjectDoc>(PROJECT_COLLECTION).await?;
    mongo.ensure_indexes::<AnalyticsEventDoc>(ANALYTICS_COLLECTION).await?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file if present
    let _ = dotenvy::dotenv();

    let args = Args::parse();

    let log_level = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mabratech_api={},info", log_level).into()),
        )
        .with(args.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.log_json).then(|| tracing_subscriber::fmt::layer()))
        .init();

    if let Err(e) = args.validate() {
        error!("Configuration error: {}", e);
        std::process::exit(1);
    }

    info!("======================================");
    info!("  Mabratech API");
    info!("  PT Mabra Technology Solutions");
    info!("======================================");
    info!("Listen: {}", args.listen);
    info!("Mode: {}", if args.dev_mode { "DEVELOPMENT" } else { "PRODUCTION" });
    info!("MongoDB: {} (db: {})", args.mongodb_uri, args.mongodb_db);
    info!(
        "Mail relay: {}",
        args.mail_relay_url.as_deref().unwrap_or("disabled")
    );
    info!("Analytics window: {} days", args.analytics_window_days);
    info!("======================================");

    // Connect to MongoDB (in-memory fallback in dev mode)
    let store: Arc<dyn DocumentStore> =
        match MongoClient::new(&args.mongodb_uri, &args.mongodb_db).await {
            Ok(mongo) => {
                if let Err(e) = ensure_indexes(&mongo).await {
                    warn!("Failed to create indexes: {}", e);
                }
                Arc::new(mongo)
            }
            Err(e) => {
                if args.dev_mode {
                    warn!("MongoDB connection failed (dev mode, using in-memory store): {}", e);
                    Arc::new(MemoryStore::new())
                } else {
                    error!("MongoDB connection failed: {}", e);
                    std::process::exit(1);
                }
            }
        };

    let notifier: Arc<dyn Notifier> = match (&args.mail_relay_url, &args.mail_from) {
        (Some(url), Some(from)) => {
            info!("Contact notifications via mail relay at {}", url);
            Arc::new(MailRelayNotifier::new(
                url.clone(),
                args.mail_api_key.clone(),
                from.clone(),
                args.admin_email.clone(),
            )?)
        }
        _ => {
            warn!("MAIL_RELAY_URL not set, contact notifications will only be logged");
            Arc::new(DisabledNotifier)
        }
    };

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let (queue, queue_rx) = SideEffectQueue::new(args.side_effect_queue_size);
    let state = Arc::new(AppState::new(args, Arc::clone(&store), clock, queue));

    if state.args.seed_content {
        match state.content.seed_defaults().await {
            Ok(report) => info!(
                services = report.services,
                products = report.products,
                projects = report.projects,
                "Default content seeded"
            ),
            Err(e) => warn!("Seeding default content failed: {}", e),
        }
    }

    let worker = SideEffectWorker::new(notifier, state.analytics.clone());
    worker.spawn(queue_rx);

    let result = server::run(Arc::clone(&state)).await;

    info!("Shutting down Mabratech API server...");
    store.close().await;

    result.map_err(Into::into)
}
