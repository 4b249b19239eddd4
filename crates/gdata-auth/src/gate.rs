//! Coalescing of concurrent refreshes.
//!
//! ```text
//!   caller A ──► Idle ──spawn──► Refreshing ──result──► Idle
//!   caller B ─────────────────────┘   (joins, same result)
//! ```

use std::sync::{Arc, Mutex};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::authorizer::BoxFuture;
use crate::error::{AuthError, AuthErrorCode, AuthResult};

/// The result as broadcast to every waiting caller.
type Outcome = Result<bool, (AuthErrorCode, String)>;

/// The running refresh: its broadcast channel and the token it fetches
/// under. The token belongs to the gate, never to a caller.
#[derive(Debug)]
struct Flight {
    receiver: watch::Receiver<Option<Outcome>>,
    cancel: CancellationToken,
}

type InFlight = Arc<Mutex<Option<Flight>>>;

/// Per-authorizer refresh state: at most one refresh runs at a time and
/// callers arriving meanwhile wait for its result.
#[derive(Debug, Default)]
pub struct RefreshGate {
    in_flight: InFlight,
}

impl RefreshGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true while a refresh is running.
    pub fn is_refreshing(&self) -> bool {
        self.in_flight.lock().unwrap().is_some()
    }

    /// Joins the running refresh, or starts one from `start` when idle.
    ///
    /// `start` receives a token owned by the gate, so a caller cancelled
    /// through `cancel` gets `Cancelled` while the refresh keeps going for
    /// the others. The refresh is only cancelled when the gate is dropped.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn run<F>(&self, cancel: &CancellationToken, start: F) -> AuthResult<bool>
    where
        F: FnOnce(CancellationToken) -> BoxFuture<'static, AuthResult<bool>>,
    {
        if cancel.is_cancelled() {
            return Err(AuthError::cancelled());
        }

        let receiver = {
            let mut in_flight = self.in_flight.lock().unwrap();
            // A closed channel means the refresh task died; start over.
            let joinable = in_flight
                .as_ref()
                .map(|flight| &flight.receiver)
                .filter(|receiver| receiver.has_changed().is_ok())
                .cloned();

            match joinable {
                Some(receiver) => {
                    trace!("joining in-flight refresh");
                    receiver
                }
                None => {
                    let (sender, receiver) = watch::channel(None);
                    let refresh_cancel = CancellationToken::new();
                    *in_flight = Some(Flight {
                        receiver: receiver.clone(),
                        cancel: refresh_cancel.clone(),
                    });

                    let refresh = start(refresh_cancel);
                    let state = Arc::clone(&self.in_flight);
                    tokio::spawn(async move {
                        let outcome = refresh
                            .await
                            .map_err(|e| (e.code(), e.message().to_owned()));
                        state.lock().unwrap().take();
                        debug!(ok = outcome.is_ok(), "refresh finished");
                        let _ = sender.send(Some(outcome));
                    });
                    receiver
                }
            }
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AuthError::cancelled()),
            outcome = wait(receiver) => outcome,
        }
    }
}

impl Drop for RefreshGate {
    fn drop(&mut self) {
        if let Some(flight) = self.in_flight.lock().unwrap().take() {
            debug!("abandoning in-flight refresh");
            flight.cancel.cancel();
        }
    }
}

async fn wait(mut receiver: watch::Receiver<Option<Outcome>>) -> AuthResult<bool> {
    let outcome = match receiver.wait_for(Option::is_some).await {
        Ok(outcome) => outcome.clone(),
        Err(_) => None,
    };

    match outcome {
        Some(Ok(refreshed)) => Ok(refreshed),
        Some(Err((code, message))) => Err(AuthError::new(code, message)),
        None => Err(AuthError::internal("refresh task ended without a result")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    fn counting_refresh(
        calls: &Arc<AtomicUsize>,
        delay: Duration,
        result: AuthResult<bool>,
    ) -> impl FnOnce(CancellationToken) -> BoxFuture<'static, AuthResult<bool>> {
        let calls = Arc::clone(calls);
        move |_| {
            Box::pin(async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(delay).await;
                result
            })
        }
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_refresh() {
        let gate = Arc::new(RefreshGate::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            gate.run(&cancel, counting_refresh(&calls, Duration::from_millis(20), Ok(true))),
            gate.run(&cancel, counting_refresh(&calls, Duration::from_millis(20), Ok(true))),
        );
        assert!(a.unwrap());
        assert!(b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(!gate.is_refreshing());
    }

    #[tokio::test]
    async fn errors_reach_every_caller() {
        let gate = RefreshGate::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let (a, b) = tokio::join!(
            gate.run(
                &cancel,
                counting_refresh(&calls, Duration::from_millis(10), Err(AuthError::network("down")))
            ),
            gate.run(&cancel, counting_refresh(&calls, Duration::ZERO, Ok(true))),
        );
        assert_eq!(a.unwrap_err().code(), AuthErrorCode::NetworkError);
        assert_eq!(b.unwrap_err().code(), AuthErrorCode::NetworkError);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn cancelled_caller_does_not_stop_the_refresh() {
        let gate = RefreshGate::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let impatient = CancellationToken::new();
        let patient = CancellationToken::new();

        let cancel_soon = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            impatient.cancel();
        };
        let (a, b, ()) = tokio::join!(
            gate.run(&impatient, counting_refresh(&calls, Duration::from_millis(30), Ok(true))),
            gate.run(&patient, counting_refresh(&calls, Duration::ZERO, Ok(false))),
            cancel_soon,
        );
        assert!(a.unwrap_err().is_cancelled());
        assert!(b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn gate_is_reusable_after_a_refresh() {
        let gate = RefreshGate::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        gate.run(&cancel, counting_refresh(&calls, Duration::ZERO, Ok(true)))
            .await
            .unwrap();
        let second = gate
            .run(&cancel, counting_refresh(&calls, Duration::ZERO, Ok(false)))
            .await;
        assert!(!second.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn the_refresh_does_not_see_caller_cancellation() {
        let gate = RefreshGate::new();
        let impatient = CancellationToken::new();
        let patient = CancellationToken::new();

        // Fails if the token it was handed fires before the sleep ends.
        let honouring = |token: CancellationToken| -> BoxFuture<'static, AuthResult<bool>> {
            Box::pin(async move {
                tokio::select! {
                    _ = token.cancelled() => Err(AuthError::cancelled()),
                    _ = tokio::time::sleep(Duration::from_millis(30)) => Ok(true),
                }
            })
        };
        let cancel_soon = async {
            tokio::time::sleep(Duration::from_millis(5)).await;
            impatient.cancel();
        };
        let (a, b, ()) = tokio::join!(
            gate.run(&impatient, honouring),
            gate.run(&patient, honouring),
            cancel_soon,
        );
        assert!(a.unwrap_err().is_cancelled());
        assert!(b.unwrap());
    }

    #[tokio::test]
    async fn dropping_the_gate_cancels_the_refresh() {
        let gate = RefreshGate::new();
        let (seen_tx, seen_rx) = tokio::sync::oneshot::channel();
        let cancel = CancellationToken::new();
        let start = move |token: CancellationToken| -> BoxFuture<'static, AuthResult<bool>> {
            Box::pin(async move {
                token.cancelled().await;
                let _ = seen_tx.send(());
                Err(AuthError::cancelled())
            })
        };

        let caller = async {
            tokio::time::timeout(Duration::from_millis(5), gate.run(&cancel, start)).await
        };
        assert!(caller.await.is_err());
        assert!(gate.is_refreshing());
        drop(gate);
        tokio::time::timeout(Duration::from_secs(1), seen_rx)
            .await
            .unwrap()
            .unwrap();
    }
}
