//! Example booking a trip as a saga.
//!
//! Run with: cargo run --example travel_booking
//!
//! The payment step is flaky and the car rental is sold out, so the saga
//! retries the payment, then gives up on the car and unwinds in reverse
//! order: it refunds the payment, then cancels the hotel and the flight.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use saga::{IdempotencyStore, MemoryIdempotencyStore, Saga, SagaConfig, from_fn};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,saga=debug")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = SagaConfig::from_toml_str("max_retries = 3\nretry_wait_ms = 100\n")?;
    let store: Arc<dyn IdempotencyStore> = Arc::new(MemoryIdempotencyStore::new());

    let payment_attempts = Arc::new(AtomicU32::new(0));
    let attempts = Arc::clone(&payment_attempts);
    let pay = move || {
        let attempts = Arc::clone(&attempts);
        async move {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(20)).await;
            if n < 1 {
                anyhow::bail!("payment gateway timed out");
            }
            info!("Payment captured");
            Ok(())
        }
    };

    let mut saga = Saga::new("trip-42", Arc::clone(&store)).with_config(config);
    saga.add_step(
        "book_flight",
        from_fn(|| {
            info!("Flight booked");
            Ok(())
        }),
        from_fn(|| {
            info!("Flight cancelled");
            Ok(())
        }),
    )?
    .add_step(
        "book_hotel",
        from_fn(|| {
            info!("Hotel booked");
            Ok(())
        }),
        from_fn(|| {
            info!("Hotel cancelled");
            Ok(())
        }),
    )?
    .add_step(
        "charge_card",
        pay,
        from_fn(|| {
            info!("Payment refunded");
            Ok(())
        }),
    )?
    .add_step(
        "rent_car",
        from_fn(|| Err(anyhow::anyhow!("no cars available"))),
        from_fn(|| Ok(())),
    )?;

    match saga.execute().await {
        Ok(()) => info!("Trip booked"),
        Err(e) => error!(error = %e, "Trip booking failed"),
    }

    for step in saga.steps() {
        info!(step = step.name(), status = %step.status(), "Final status");
    }
    info!(
        attempts = payment_attempts.load(Ordering::SeqCst),
        failed_compensations = saga.compensation_failures().len(),
        "Done"
    );

    Ok(())
}
