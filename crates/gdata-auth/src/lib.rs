//! Request authorization for GData services.
//!
//! ```text
//!   caller ──► Authorizer::process_request(domain, request)
//!                 │
//!                 ├─ domain not held ──► request untouched
//!                 └─ domain held ──────► Authorization header set
//!
//!   refresh_authorization[_async] ──► RefreshMode
//!                 ├─ Unsupported ─► Ok(false)
//!                 ├─ Blocking ────► refresh()        (on a blocking thread when async)
//!                 └─ Async ───────► refresh_async()  (on a private runtime when blocking)
//! ```
//!
//! Authorization domains are interned: [`AuthorizationDomain::intern`]
//! returns the same `&'static` instance for equal service/scope pairs.

pub mod authorizer;
pub mod domain;
pub mod error;
pub mod gate;
pub mod token;

pub use authorizer::{
    Authorizer, BoxFuture, RefreshMode, RefreshTask, refresh_authorization,
    refresh_authorization_async, spawn_refresh,
};
pub use domain::AuthorizationDomain;
pub use error::{AuthError, AuthErrorCode, AuthResult};
pub use gate::RefreshGate;
pub use token::{TokenAuthorizer, TokenInfo, TokenSource};
