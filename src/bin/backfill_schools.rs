//! One-shot backfill resolving free-text school names on existing
//! registrations to rows in the schools catalogue. Safe to rerun; already
//! resolved registrations are not touched.

use anyhow::Context;
use dotenv::dotenv;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use workshop_registration::config;
use workshop_registration::db::{
    self,
    repositories::{
        PgRegistrationRepository, PgSchoolRepository, RegistrationRepository, SchoolRepository,
    },
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "backfill_schools=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    dotenv().ok();
    config::init()?;

    let pool = db::init_pool().await.context("Failed to set up database")?;
    let registrations = PgRegistrationRepository::new(pool.clone());
    let schools = PgSchoolRepository::new(pool);

    let unresolved = registrations.list_unresolved_schools().await?;
    info!(count = unresolved.len(), "registrations with unresolved school names");

    let mut resolved = 0_u64;
    let mut skipped = 0_u64;
    for registration in unresolved {
        let name = registration.school_name.trim();
        if name.is_empty() {
            skipped += 1;
            continue;
        }
        let school = schools.get_or_create(name).await?;
        match registrations.set_school(registration.id, school.id).await {
            Ok(()) => resolved += 1,
            Err(err) => {
                warn!(
                    registration_number = %registration.registration_number,
                    error = %err,
                    "could not attach school"
                );
                skipped += 1;
            }
        }
    }

    info!(resolved, skipped, "school backfill finished");
    Ok(())
}
