//! Payment verification polling.
//!
//! After the user is sent to the external checkout page, the reference is
//! verified every five seconds until the gateway reports a terminal status
//! or the attempt budget (36 attempts, about three minutes) runs out.
//! Transient verification errors consume attempts but do not terminate the
//! loop. Cancellation is carried by a token threaded through the loop, so
//! tearing down the hosting view cannot leak a running timer, and a
//! reference can only have one live poller at a time.

use nw_api_types::{PaymentInit, PaymentStatus, PaymentVerification};
use nw_backend_client::{BackendError, PaymentGateway};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::watch;
use tracing::warn;

pub const VERIFY_INTERVAL: Duration = Duration::from_secs(5);
pub const MAX_VERIFY_ATTEMPTS: u32 = 36;

pub const TIMEOUT_MESSAGE: &str =
    "Verification timed out. Please check the payment status manually.";

#[derive(Debug, Clone, Copy)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: VERIFY_INTERVAL,
            max_attempts: MAX_VERIFY_ATTEMPTS,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PollOutcome {
    Success {
        message: String,
        verification: PaymentVerification,
    },
    Failed {
        message: String,
        status: PaymentStatus,
    },
    TimedOut {
        message: String,
        attempts: u32,
    },
    Cancelled,
}

/// Human-readable message for a terminal gateway status.
pub fn status_message(status: &PaymentStatus) -> &'static str {
    match status {
        PaymentStatus::Success => "Payment completed successfully.",
        PaymentStatus::Failed => {
            "Payment failed. Please try again or use a different payment method."
        }
        PaymentStatus::Abandoned => "Payment was abandoned before completion.",
        PaymentStatus::Cancelled => "Payment was cancelled.",
        PaymentStatus::Pending | PaymentStatus::Unknown(_) => "Payment is still processing.",
    }
}

/// Create a linked cancellation pair. Dropping the handle cancels the token,
/// so a torn-down view stops its poller even without an explicit call.
pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelToken { rx })
}

pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }
}

pub struct CancelToken {
    rx: watch::Receiver<bool>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is signalled or the handle is dropped.
    pub async fn cancelled(&mut self) {
        loop {
            if *self.rx.borrow() {
                return;
            }
            if self.rx.changed().await.is_err() {
                return;
            }
        }
    }
}

pub struct PaymentPoller {
    gateway: Arc<dyn PaymentGateway>,
    config: PollConfig,
}

impl PaymentPoller {
    pub fn new(gateway: Arc<dyn PaymentGateway>) -> Self {
        Self::with_config(gateway, PollConfig::default())
    }

    pub fn with_config(gateway: Arc<dyn PaymentGateway>, config: PollConfig) -> Self {
        Self { gateway, config }
    }

    /// Drive verification of `reference` to a terminal outcome. The first
    /// verification fires immediately; subsequent ones follow the configured
    /// interval. No verification call fires after cancellation.
    pub async fn poll(&self, reference: &str, cancel: &mut CancelToken) -> PollOutcome {
        let mut attempts: u32 = 0;

        while attempts < self.config.max_attempts {
            if cancel.is_cancelled() {
                return PollOutcome::Cancelled;
            }

            let verification = tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                result = self.gateway.verify(reference) => result,
            };
            attempts += 1;

            match verification {
                Ok(snapshot) if snapshot.status.is_terminal() => {
                    let message = status_message(&snapshot.status).to_owned();
                    return if snapshot.status == PaymentStatus::Success {
                        PollOutcome::Success {
                            message,
                            verification: snapshot,
                        }
                    } else {
                        PollOutcome::Failed {
                            message,
                            status: snapshot.status,
                        }
                    };
                }
                Ok(_) => {}
                Err(err) => {
                    // Transient failure: counts toward the budget, does not
                    // terminate the loop.
                    warn!("verification attempt {attempts} for {reference} failed: {err}");
                }
            }

            if attempts >= self.config.max_attempts {
                break;
            }

            tokio::select! {
                _ = cancel.cancelled() => return PollOutcome::Cancelled,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        PollOutcome::TimedOut {
            message: TIMEOUT_MESSAGE.to_owned(),
            attempts,
        }
    }
}

/// Registry of payment references with a live poller. A second poller for
/// the same reference is refused until the first one's guard drops.
#[derive(Default)]
pub struct ActivePolls {
    inflight: Mutex<HashSet<String>>,
}

impl ActivePolls {
    pub fn try_begin(self: &Arc<Self>, reference: &str) -> Option<PollGuard> {
        let mut inflight = self.inflight.lock().expect("active polls poisoned");
        if !inflight.insert(reference.to_owned()) {
            return None;
        }
        Some(PollGuard {
            polls: Arc::clone(self),
            reference: reference.to_owned(),
        })
    }
}

pub struct PollGuard {
    polls: Arc<ActivePolls>,
    reference: String,
}

impl Drop for PollGuard {
    fn drop(&mut self) {
        let mut inflight = self.polls.inflight.lock().expect("active polls poisoned");
        inflight.remove(&self.reference);
    }
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("a verification poll is already running for reference {0}")]
    AlreadyPolling(String),

    #[error("payment flow is not in a state that allows this operation")]
    InvalidPhase,

    #[error(transparent)]
    Gateway(#[from] BackendError),
}

#[derive(Debug, Clone, PartialEq)]
pub enum PaymentPhase {
    Idle,
    AwaitingRedirect,
    Polling,
    Complete(PollOutcome),
}

/// One buy/sell payment from initialization through verification.
/// Idle → AwaitingRedirect → Polling → Complete; all Complete variants are
/// terminal and the flow is discarded afterwards.
pub struct PaymentFlow {
    gateway: Arc<dyn PaymentGateway>,
    poller: PaymentPoller,
    registry: Arc<ActivePolls>,
    phase: PaymentPhase,
    init: Option<PaymentInit>,
}

impl PaymentFlow {
    pub fn new(gateway: Arc<dyn PaymentGateway>, registry: Arc<ActivePolls>) -> Self {
        Self::with_config(gateway, registry, PollConfig::default())
    }

    pub fn with_config(
        gateway: Arc<dyn PaymentGateway>,
        registry: Arc<ActivePolls>,
        config: PollConfig,
    ) -> Self {
        let poller = PaymentPoller::with_config(gateway.clone(), config);
        Self {
            gateway,
            poller,
            registry,
            phase: PaymentPhase::Idle,
            init: None,
        }
    }

    pub fn phase(&self) -> &PaymentPhase {
        &self.phase
    }

    /// Create the gateway session. The caller opens `payment_link` in a new
    /// context; the app itself does not navigate away.
    pub async fn begin(&mut self, amount: &str, email: &str) -> Result<PaymentInit, PaymentError> {
        if !matches!(self.phase, PaymentPhase::Idle) {
            return Err(PaymentError::InvalidPhase);
        }
        let init = self.gateway.initialize(amount, email).await?;
        self.init = Some(init.clone());
        self.phase = PaymentPhase::AwaitingRedirect;
        Ok(init)
    }

    /// Poll the initialized reference to a terminal outcome.
    pub async fn track(&mut self, cancel: &mut CancelToken) -> Result<PollOutcome, PaymentError> {
        if !matches!(self.phase, PaymentPhase::AwaitingRedirect) {
            return Err(PaymentError::InvalidPhase);
        }
        let init = self.init.clone().ok_or(PaymentError::InvalidPhase)?;

        let _guard = self
            .registry
            .try_begin(&init.reference)
            .ok_or_else(|| PaymentError::AlreadyPolling(init.reference.clone()))?;

        self.phase = PaymentPhase::Polling;
        let outcome = self.poller.poll(&init.reference, cancel).await;
        self.phase = PaymentPhase::Complete(outcome.clone());
        Ok(outcome)
    }
}
