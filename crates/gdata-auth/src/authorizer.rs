//! The [`Authorizer`] trait and the refresh entry points built on it.
//!
//! ```text
//!                  refresh_mode()
//!   Unsupported ─────────────────► Ok(false), even when cancelled
//!   Blocking    ─────────────────► refresh() on a blocking worker
//!   Async       ─────────────────► refresh_async() on the caller's runtime
//! ```
//!
//! Both supported modes race the refresh against the cancellation token;
//! a cancelled caller gets [`AuthErrorCode::Cancelled`](crate::AuthErrorCode)
//! whatever the refresh itself does afterwards.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use tokio::task::{JoinError, JoinHandle};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::domain::AuthorizationDomain;
use crate::error::{AuthError, AuthResult};

/// A boxed future for async trait methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Which refresh method an authorizer implements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshMode {
    /// Credentials cannot be refreshed.
    #[default]
    Unsupported,
    /// [`Authorizer::refresh`] blocks the calling thread.
    Blocking,
    /// [`Authorizer::refresh_async`] is a future.
    Async,
}

/// Credential material for a set of authorization domains.
///
/// Implementations must be safe to call from any thread, including while a
/// refresh is in progress.
pub trait Authorizer: Send + Sync {
    /// Adds whatever the credential scheme needs (typically an
    /// `Authorization` header) to `request`. Calling it twice with the same
    /// arguments leaves the request as after the first call.
    fn process_request(&self, domain: Option<&AuthorizationDomain>, request: &mut reqwest::Request);

    /// Returns true if the held credentials cover `domain`.
    fn is_authorized_for(&self, domain: &AuthorizationDomain) -> bool;

    fn refresh_mode(&self) -> RefreshMode {
        RefreshMode::Unsupported
    }

    /// Refreshes the credentials, blocking. Only called when
    /// [`refresh_mode`](Self::refresh_mode) is `Blocking`.
    fn refresh(&self, _cancel: &CancellationToken) -> AuthResult<bool> {
        Ok(false)
    }

    /// Refreshes the credentials. Only called when
    /// [`refresh_mode`](Self::refresh_mode) is `Async`.
    fn refresh_async(&self, _cancel: CancellationToken) -> BoxFuture<'_, AuthResult<bool>> {
        Box::pin(async { Ok(false) })
    }
}

async fn race<F>(refresh: F, cancel: &CancellationToken) -> AuthResult<bool>
where
    F: Future<Output = AuthResult<bool>>,
{
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {
            debug!("refresh cancelled by caller");
            Err(AuthError::cancelled())
        }
        result = refresh => result,
    }
}

fn join_error(err: JoinError) -> AuthError {
    if err.is_cancelled() {
        return AuthError::cancelled();
    }
    AuthError::internal(format!("refresh task failed: {}", err))
}

/// Refreshes `authorizer`, blocking the current thread.
///
/// An `Async` authorizer is driven on a private current-thread runtime, so
/// it cannot be refreshed this way from inside another runtime.
///
/// # Errors
///
/// `Cancelled` if `cancel` fires first, `InternalError` for an `Async`
/// authorizer on a runtime thread, otherwise whatever the refresh reports.
pub fn refresh_authorization(
    authorizer: &dyn Authorizer,
    cancel: Option<&CancellationToken>,
) -> AuthResult<bool> {
    let cancel = cancel.cloned().unwrap_or_default();
    match authorizer.refresh_mode() {
        RefreshMode::Unsupported => Ok(false),
        _ if cancel.is_cancelled() => Err(AuthError::cancelled()),
        RefreshMode::Blocking => authorizer.refresh(&cancel),
        RefreshMode::Async => {
            if tokio::runtime::Handle::try_current().is_ok() {
                return Err(AuthError::internal(
                    "blocking refresh called from within an async runtime; use refresh_authorization_async",
                ));
            }
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| {
                    AuthError::internal("failed to start a runtime for the refresh").with_source(e)
                })?;
            runtime.block_on(race(authorizer.refresh_async(cancel.clone()), &cancel))
        }
    }
}

/// Refreshes `authorizer` asynchronously. A `Blocking` authorizer runs on
/// tokio's blocking pool.
///
/// An authorizer without refresh support completes with `Ok(false)`
/// immediately, even if `cancel` has already fired.
pub async fn refresh_authorization_async(
    authorizer: Arc<dyn Authorizer>,
    cancel: Option<CancellationToken>,
) -> AuthResult<bool> {
    let cancel = cancel.unwrap_or_default();
    match authorizer.refresh_mode() {
        RefreshMode::Unsupported => Ok(false),
        _ if cancel.is_cancelled() => Err(AuthError::cancelled()),
        RefreshMode::Async => race(authorizer.refresh_async(cancel.clone()), &cancel).await,
        RefreshMode::Blocking => {
            let worker_cancel = cancel.clone();
            let handle = tokio::task::spawn_blocking(move || authorizer.refresh(&worker_cancel));
            let joined = async move { handle.await.map_err(join_error)? };
            race(joined, &cancel).await
        }
    }
}

/// Starts a refresh in the background; [`RefreshTask::finish`] collects
/// its result.
///
/// Must be called from within a tokio runtime.
pub fn spawn_refresh(
    authorizer: Arc<dyn Authorizer>,
    cancel: Option<CancellationToken>,
) -> RefreshTask {
    RefreshTask {
        handle: tokio::spawn(refresh_authorization_async(authorizer, cancel)),
    }
}

/// A refresh running on the runtime.
#[derive(Debug)]
pub struct RefreshTask {
    handle: JoinHandle<AuthResult<bool>>,
}

impl RefreshTask {
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the refresh and returns its result.
    pub async fn finish(self) -> AuthResult<bool> {
        self.handle.await.map_err(join_error)?
    }
}
