// SPDX-License-Identifier: MIT

//! Session smoke tool.
//!
//! Logs in against live backends with credentials from the environment,
//! triggers a manual document refresh, and tails the poller until every
//! document reaches a terminal indexing state. Useful for exercising the
//! refresh and polling paths outside the UI.

use atrium_session::{Config, Session, SessionStatus};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let config = Config::from_env()?;
    tracing::info!(
        identity = %config.identity_base_url,
        docs = %config.docs_base_url,
        "Starting session smoke run"
    );

    let session = Session::new(config);

    let email = std::env::var("ATRIUM_EMAIL")?;
    let password = std::env::var("ATRIUM_PASSWORD")?;
    let user = session.identity().login(&email, &password).await?;
    tracing::info!(user = %user.email, tenant = ?user.tenant_id, "Logged in");

    let subscription = session.identity().current_subscription().await;
    tracing::info!(active = subscription.is_active, plan = ?subscription.plan_name, "Subscription");

    let documents = session.poller().user_refresh().await?;
    tracing::info!(count = documents.len(), "Documents fetched");

    let mut status = session.status();
    let mut snapshots = session.poller().subscribe();

    while session.poller().is_running() {
        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                for doc in &snapshot.documents {
                    tracing::info!(
                        id = %doc.id,
                        status = ?doc.indexing_status,
                        file = ?doc.file_name,
                        "Document"
                    );
                }
            }
            _ = status.changed() => {
                if *status.borrow() == SessionStatus::Ended {
                    tracing::warn!("Session ended, stopping");
                    break;
                }
            }
        }
    }

    session.poller().stop();
    session.identity().logout().await;
    tracing::info!("Done");
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("atrium_session=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
