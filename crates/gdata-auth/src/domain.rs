//! Authorization domains: `(service, scope)` pairs naming what a
//! credential grants access to.

use std::collections::HashSet;
use std::fmt;
use std::sync::{LazyLock, Mutex};

use tracing::trace;

static DOMAINS: LazyLock<Mutex<HashSet<&'static AuthorizationDomain>>> =
    LazyLock::new(|| Mutex::new(HashSet::new()));

/// A service and the scope URI that authorizes access to it.
///
/// Domains are interned and live for the rest of the process; obtain them
/// through [`AuthorizationDomain::intern`].
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct AuthorizationDomain {
    service_name: String,
    scope: String,
}

impl AuthorizationDomain {
    /// Returns the unique domain for `(service_name, scope)`, creating it
    /// on first use.
    pub fn intern(service_name: &str, scope: &str) -> &'static AuthorizationDomain {
        let candidate = AuthorizationDomain {
            service_name: service_name.to_owned(),
            scope: scope.to_owned(),
        };

        let mut domains = DOMAINS.lock().unwrap();
        if let Some(&existing) = domains.get(&candidate) {
            return existing;
        }

        trace!(service = service_name, scope, "interning authorization domain");
        let domain: &'static AuthorizationDomain = Box::leak(Box::new(candidate));
        domains.insert(domain);
        domain
    }

    /// Short service identifier, such as `lh2` or `cl`.
    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }
}

impl fmt::Display for AuthorizationDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.service_name, self.scope)
    }
}
