use std::sync::Arc;

use anyhow::Context;
use dotenv::dotenv;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workshop_registration::{
    app::create_router,
    app_state::AppState,
    config,
    db::{
        self,
        repositories::{
            PaymentRepository, PgPaymentRepository, PgRegistrationRepository,
            PgSchoolRepository, PgWorkshopRepository, RegistrationRepository, SchoolRepository,
            WorkshopRepository,
        },
    },
    modules::{payments::PaymentLifecycle, registrations::RegistrationLedger},
    providers::{
        ConsoleNotifier, Notifier, SmtpNotifier, SslCommerzGateway, TextReceiptRenderer,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("{}=debug", env!("CARGO_CRATE_NAME")).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv().ok();

    let config = config::init()?;

    let pool = db::init_pool().await.context("Failed to set up database")?;

    let workshops: Arc<dyn WorkshopRepository> =
        Arc::new(PgWorkshopRepository::new(pool.clone()));
    let schools: Arc<dyn SchoolRepository> = Arc::new(PgSchoolRepository::new(pool.clone()));
    let registrations: Arc<dyn RegistrationRepository> =
        Arc::new(PgRegistrationRepository::new(pool.clone()));
    let payments: Arc<dyn PaymentRepository> = Arc::new(PgPaymentRepository::new(pool.clone()));

    let gateway = Arc::new(SslCommerzGateway::new(config.gateway.clone()));

    let notifier: Arc<dyn Notifier> = match &config.email {
        Some(email) => Arc::new(SmtpNotifier::new(email)),
        None => {
            info!("SMTP not configured; confirmations go to the log");
            Arc::new(ConsoleNotifier)
        }
    };

    let receipts = Arc::new(TextReceiptRenderer);

    let strict = config.app.strict_lifecycle;
    if strict {
        info!("strict lifecycle mode is on");
    }

    let ledger = Arc::new(RegistrationLedger::new(
        workshops.clone(),
        schools.clone(),
        registrations.clone(),
        payments.clone(),
        notifier.clone(),
        receipts,
        strict,
    ));

    let lifecycle = Arc::new(PaymentLifecycle::new(
        workshops.clone(),
        registrations.clone(),
        payments.clone(),
        gateway,
        notifier,
        config.app.currency.clone(),
        config.app.base_url.clone(),
        strict,
    ));

    let state = AppState {
        db: pool,
        ledger,
        lifecycle,
        workshops,
        schools,
        registrations,
        payments,
    };

    let app = create_router(state);

    let addr = config.server_addr();
    info!("{} listening on {}", config.app.name, addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .await
        .context("Failed to serve application")?;

    Ok(())
}
