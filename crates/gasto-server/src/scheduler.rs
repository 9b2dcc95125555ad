//! Background sweep scheduler
//!
//! Rate-limit windows and pending payment markers expire by timestamp,
//! but nothing removes the expired map entries at request time. This
//! task sweeps both stores every five minutes so an instance that stays
//! up for weeks does not accumulate dead identifiers.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::AppState;

/// How often expired entries are swept
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Start the sweep scheduler as a background task
pub fn start_sweep_scheduler(state: Arc<AppState>) {
    info!(
        "Starting sweep scheduler: every {} seconds",
        SWEEP_INTERVAL.as_secs()
    );

    tokio::spawn(async move {
        let mut ticker = interval(SWEEP_INTERVAL);

        // Skip the first immediate tick - a fresh server has nothing to sweep
        ticker.tick().await;

        loop {
            ticker.tick().await;
            sweep_once(&state);
        }
    });
}

/// Run a single sweep over every expiring store
fn sweep_once(state: &AppState) -> usize {
    let mut removed = 0;

    for (limiter, label) in [
        (&state.extraction_limiter, "extraction"),
        (&state.billing_limiter, "billing"),
    ] {
        match limiter.sweep() {
            Ok(count) => {
                if count > 0 {
                    debug!(endpoint = label, removed = count, "Swept rate-limit windows");
                }
                removed += count;
            }
            Err(e) => warn!(endpoint = label, "Rate-limit sweep failed: {}", e),
        }
    }

    match state.gate.sweep() {
        Ok(count) => {
            if count > 0 {
                debug!(removed = count, "Swept expired payment markers");
            }
            removed += count;
        }
        Err(e) => warn!("Payment marker sweep failed: {}", e),
    }

    removed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ServerConfig;
    use gasto_core::ai::FallbackOrchestrator;
    use gasto_core::billing::BillingDispatcher;

    #[test]
    fn test_sweep_once_on_fresh_state() {
        let state = AppState::new(
            FallbackOrchestrator::new(vec![]),
            BillingDispatcher::new(vec![]),
            ServerConfig::default(),
        );
        assert_eq!(sweep_once(&state), 0);
    }

    #[test]
    fn test_sweep_once_keeps_active_windows() {
        let state = AppState::new(
            FallbackOrchestrator::new(vec![]),
            BillingDispatcher::new(vec![]),
            ServerConfig::default(),
        );
        state
            .extraction_limiter
            .check("10.0.0.1", &state.config.extraction_limit)
            .unwrap();

        assert_eq!(sweep_once(&state), 0);
        let info = state
            .extraction_limiter
            .info("10.0.0.1", &state.config.extraction_limit)
            .unwrap();
        assert_eq!(info.remaining, state.config.extraction_limit.max_requests - 1);
    }
}
