//! A bearer-token authorizer whose tokens come from a pluggable source.

use std::collections::HashSet;
use std::fmt;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Utc};
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::authorizer::{Authorizer, BoxFuture, RefreshMode};
use crate::domain::AuthorizationDomain;
use crate::error::{AuthError, AuthResult};
use crate::gate::RefreshGate;

/// Tokens are treated as expired this long before their actual expiry.
const EXPIRY_MARGIN_SECS: i64 = 60;

/// An access token and when it stops being valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenInfo {
    pub access_token: String,
    /// `None` for tokens that do not expire.
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenInfo {
    /// Creates a token valid for `expires_in_secs` from now, minus a safety
    /// margin.
    pub fn new(access_token: impl Into<String>, expires_in_secs: Option<i64>) -> Self {
        let expires_at = expires_in_secs
            .map(|secs| Utc::now() + Duration::seconds(secs) - Duration::seconds(EXPIRY_MARGIN_SECS));
        Self {
            access_token: access_token.into(),
            expires_at,
        }
    }

    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires_at) => Utc::now() >= expires_at,
            None => false,
        }
    }

    pub fn time_until_expiry(&self) -> Option<Duration> {
        self.expires_at.map(|expires_at| expires_at - Utc::now())
    }
}

/// Produces fresh tokens, e.g. by redeeming a refresh token at an OAuth 2.0
/// endpoint.
pub trait TokenSource: Send + Sync {
    fn fetch_token(&self, cancel: CancellationToken) -> BoxFuture<'_, AuthResult<TokenInfo>>;
}

/// Signs requests with `Authorization: Bearer <token>` for a fixed set of
/// domains.
///
/// A request is signed only when a token is held, the domain belongs to
/// the set and the request goes over HTTPS.
pub struct TokenAuthorizer {
    domains: HashSet<&'static AuthorizationDomain>,
    token: Arc<RwLock<Option<TokenInfo>>>,
    source: Option<Arc<dyn TokenSource>>,
    gate: RefreshGate,
    allow_insecure: bool,
}

impl fmt::Debug for TokenAuthorizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthorizer")
            .field("domains", &self.domains)
            .field("has_token", &self.token.read().unwrap().is_some())
            .field("has_source", &self.source.is_some())
            .field("allow_insecure", &self.allow_insecure)
            .finish()
    }
}

impl Default for TokenAuthorizer {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenAuthorizer {
    pub fn new() -> Self {
        Self {
            domains: HashSet::new(),
            token: Arc::new(RwLock::new(None)),
            source: None,
            gate: RefreshGate::new(),
            allow_insecure: false,
        }
    }

    #[must_use]
    pub fn with_domain(mut self, domain: &'static AuthorizationDomain) -> Self {
        self.domains.insert(domain);
        self
    }

    #[must_use]
    pub fn with_token(self, token: TokenInfo) -> Self {
        self.set_token(Some(token));
        self
    }

    #[must_use]
    pub fn with_token_source(mut self, source: impl TokenSource + 'static) -> Self {
        self.source = Some(Arc::new(source));
        self
    }

    /// Also signs plain-HTTP requests. Only meant for local test servers.
    #[must_use]
    pub fn allow_insecure(mut self, allow: bool) -> Self {
        self.allow_insecure = allow;
        self
    }

    pub fn domains(&self) -> impl Iterator<Item = &'static AuthorizationDomain> + '_ {
        self.domains.iter().copied()
    }

    pub fn token(&self) -> Option<TokenInfo> {
        self.token.read().unwrap().clone()
    }

    pub fn set_token(&self, token: Option<TokenInfo>) {
        *self.token.write().unwrap() = token;
    }

    /// Returns true if the held token has expired or there is none.
    pub fn needs_refresh(&self) -> bool {
        self.token
            .read()
            .unwrap()
            .as_ref()
            .is_none_or(TokenInfo::is_expired)
    }

    fn is_secure(&self, url: &Url) -> bool {
        self.allow_insecure || url.scheme() == "https"
    }
}

impl Authorizer for TokenAuthorizer {
    fn process_request(&self, domain: Option<&AuthorizationDomain>, request: &mut reqwest::Request) {
        let Some(domain) = domain.filter(|d| self.domains.contains(*d)) else {
            return;
        };
        let guard = self.token.read().unwrap();
        let Some(token) = guard.as_ref() else {
            return;
        };

        if !self.is_secure(request.url()) {
            warn!(
                domain = %domain,
                "not authorizing a non-HTTPS request with the access token"
            );
            return;
        }

        match HeaderValue::from_str(&format!("Bearer {}", token.access_token)) {
            Ok(mut value) => {
                value.set_sensitive(true);
                request.headers_mut().insert(AUTHORIZATION, value);
            }
            Err(e) => warn!(error = %e, "access token is not a valid header value"),
        }
    }

    fn is_authorized_for(&self, domain: &AuthorizationDomain) -> bool {
        self.token.read().unwrap().is_some() && self.domains.contains(domain)
    }

    fn refresh_mode(&self) -> RefreshMode {
        match self.source {
            Some(_) => RefreshMode::Async,
            None => RefreshMode::Unsupported,
        }
    }

    fn refresh_async(&self, cancel: CancellationToken) -> BoxFuture<'_, AuthResult<bool>> {
        Box::pin(async move {
            let Some(source) = self.source.clone() else {
                return Ok(false);
            };
            let token = Arc::clone(&self.token);

            // The fetch runs under the gate's token; `cancel` only releases
            // this caller.
            self.gate
                .run(&cancel, move |fetch_cancel| {
                    Box::pin(async move {
                        debug!("fetching a fresh access token");
                        let fresh = source.fetch_token(fetch_cancel).await?;
                        if fresh.access_token.is_empty() {
                            return Err(AuthError::protocol("token source returned an empty token"));
                        }
                        *token.write().unwrap() = Some(fresh);
                        info!("access token refreshed");
                        Ok(true)
                    })
                })
                .await
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::authorizer::refresh_authorization_async;
    use crate::error::AuthErrorCode;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn calendar() -> &'static AuthorizationDomain {
        AuthorizationDomain::intern("cl", "https://www.google.com/calendar/feeds/")
    }

    fn contacts() -> &'static AuthorizationDomain {
        AuthorizationDomain::intern("cp", "https://www.google.com/m8/feeds/")
    }

    fn request(url: &str) -> reqwest::Request {
        reqwest::Request::new(reqwest::Method::GET, url.parse().unwrap())
    }

    struct StaticSource {
        calls: Arc<AtomicUsize>,
        token: &'static str,
    }

    impl TokenSource for StaticSource {
        fn fetch_token(&self, _cancel: CancellationToken) -> BoxFuture<'_, AuthResult<TokenInfo>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                Ok(TokenInfo::new(self.token, Some(3600)))
            })
        }
    }

    struct RefusingSource;

    impl TokenSource for RefusingSource {
        fn fetch_token(&self, _cancel: CancellationToken) -> BoxFuture<'_, AuthResult<TokenInfo>> {
            Box::pin(async { Err(AuthError::protocol("invalid_grant")) })
        }
    }

    /// Gives up as soon as its token fires.
    struct CancellableSource {
        calls: Arc<AtomicUsize>,
    }

    impl TokenSource for CancellableSource {
        fn fetch_token(&self, cancel: CancellationToken) -> BoxFuture<'_, AuthResult<TokenInfo>> {
            Box::pin(async move {
                self.calls.fetch_add(1, Ordering::SeqCst);
                tokio::select! {
                    _ = cancel.cancelled() => Err(AuthError::cancelled()),
                    _ = tokio::time::sleep(std::time::Duration::from_millis(30)) => {
                        Ok(TokenInfo::new("shared", Some(3600)))
                    }
                }
            })
        }
    }

    #[test]
    fn signs_only_known_domains_over_https() {
        let authorizer = TokenAuthorizer::new()
            .with_domain(calendar())
            .with_token(TokenInfo::new("secret", None));

        let mut req = request("https://www.google.com/calendar/feeds/default");
        authorizer.process_request(Some(calendar()), &mut req);
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer secret");

        let mut other = request("https://www.google.com/m8/feeds/");
        authorizer.process_request(Some(contacts()), &mut other);
        authorizer.process_request(None, &mut other);
        assert!(other.headers().get(AUTHORIZATION).is_none());

        let mut plain = request("http://www.google.com/calendar/feeds/default");
        authorizer.process_request(Some(calendar()), &mut plain);
        assert!(plain.headers().get(AUTHORIZATION).is_none());
    }

    #[test]
    fn insecure_requests_can_be_allowed() {
        let authorizer = TokenAuthorizer::new()
            .with_domain(calendar())
            .with_token(TokenInfo::new("secret", None))
            .allow_insecure(true);
        let mut req = request("http://127.0.0.1:8080/feeds");
        authorizer.process_request(Some(calendar()), &mut req);
        assert!(req.headers().contains_key(AUTHORIZATION));
    }

    #[test]
    fn processing_twice_is_idempotent() {
        let authorizer = TokenAuthorizer::new()
            .with_domain(calendar())
            .with_token(TokenInfo::new("secret", None));
        let mut req = request("https://www.google.com/calendar/feeds/default");
        authorizer.process_request(Some(calendar()), &mut req);
        let once = req.headers().clone();
        authorizer.process_request(Some(calendar()), &mut req);
        assert_eq!(req.headers(), &once);
    }

    #[test]
    fn authorization_needs_token_and_domain() {
        let authorizer = TokenAuthorizer::new().with_domain(calendar());
        assert!(!authorizer.is_authorized_for(calendar()));
        assert!(authorizer.needs_refresh());

        authorizer.set_token(Some(TokenInfo::new("t", Some(3600))));
        assert!(authorizer.is_authorized_for(calendar()));
        assert!(!authorizer.is_authorized_for(contacts()));
        assert!(!authorizer.needs_refresh());
    }

    #[test]
    fn token_expiry() {
        assert!(!TokenInfo::new("t", None).is_expired());
        assert!(!TokenInfo::new("t", Some(3600)).is_expired());
        // The margin makes a token that expires within a minute stale.
        assert!(TokenInfo::new("t", Some(30)).is_expired());
        assert!(TokenInfo::new("t", None).time_until_expiry().is_none());
    }

    #[test]
    fn token_info_serializes() {
        let token = TokenInfo::new("abc", Some(3600));
        let json = serde_json::to_string(&token).unwrap();
        let back: TokenInfo = serde_json::from_str(&json).unwrap();
        assert_eq!(back, token);
    }

    #[tokio::test]
    async fn refresh_without_source_is_unsupported() {
        let authorizer = Arc::new(TokenAuthorizer::new().with_domain(calendar()));
        assert_eq!(authorizer.refresh_mode(), RefreshMode::Unsupported);
        assert!(!refresh_authorization_async(authorizer, None).await.unwrap());
    }

    #[tokio::test]
    async fn concurrent_refreshes_fetch_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let authorizer: Arc<TokenAuthorizer> = Arc::new(
            TokenAuthorizer::new()
                .with_domain(calendar())
                .with_token_source(StaticSource {
                    calls: Arc::clone(&calls),
                    token: "fresh",
                }),
        );

        let (a, b) = tokio::join!(
            refresh_authorization_async(authorizer.clone(), None),
            refresh_authorization_async(authorizer.clone(), None),
        );
        assert!(a.unwrap());
        assert!(b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(authorizer.is_authorized_for(calendar()));

        let mut req = request("https://www.google.com/calendar/feeds/default");
        authorizer.process_request(Some(calendar()), &mut req);
        assert_eq!(req.headers()[AUTHORIZATION], "Bearer fresh");
    }

    #[tokio::test]
    async fn refused_refresh_surfaces_protocol_error() {
        let authorizer = Arc::new(
            TokenAuthorizer::new()
                .with_domain(calendar())
                .with_token_source(RefusingSource),
        );
        let err = refresh_authorization_async(authorizer.clone(), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), AuthErrorCode::ProtocolError);
        assert!(authorizer.token().is_none());
    }

    #[tokio::test]
    async fn cancelling_the_first_caller_keeps_the_shared_fetch() {
        let calls = Arc::new(AtomicUsize::new(0));
        let authorizer = Arc::new(
            TokenAuthorizer::new()
                .with_domain(calendar())
                .with_token_source(CancellableSource {
                    calls: Arc::clone(&calls),
                }),
        );
        let first = CancellationToken::new();

        let cancel_soon = async {
            tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            first.cancel();
        };
        let (a, b, ()) = tokio::join!(
            refresh_authorization_async(authorizer.clone(), Some(first.clone())),
            refresh_authorization_async(authorizer.clone(), None),
            cancel_soon,
        );
        assert!(a.unwrap_err().is_cancelled());
        assert!(b.unwrap());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(authorizer.token().unwrap().access_token, "shared");
    }
}
