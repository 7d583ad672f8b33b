use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

use crate::error::Result;
use crate::limiter::quota_gate::QuotaGate;

/// Runs work only while holding a permit from the shared gate.
#[derive(Debug, Clone)]
pub struct GatedInvoker {
    gate: Arc<QuotaGate>,
}

impl GatedInvoker {
    pub fn new(gate: Arc<QuotaGate>) -> Self {
        Self { gate }
    }

    pub fn gate(&self) -> &Arc<QuotaGate> {
        &self.gate
    }

    /// Acquire a permit, run `work`, give the permit back.
    ///
    /// The permit is returned on every exit path, including when `work`
    /// panics or the returned future is dropped mid-flight. The outcome of
    /// `work` is passed through untouched; nothing is retried.
    pub async fn invoke<F, Fut, T>(&self, work: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let permit = self.gate.acquire().await?;
        let started = Instant::now();

        let outcome = work().await;
        permit.release();

        match &outcome {
            Ok(_) => debug!("Gated call finished in {}ms", started.elapsed().as_millis()),
            Err(e) => {
                self.gate.stats().inc_failed_operations();
                warn!(
                    "Gated call failed after {}ms: {}",
                    started.elapsed().as_millis(),
                    e
                );
            }
        }

        outcome
    }
}
