//! Shared vocabulary for the GData crates: timestamps, comparison, tracing.
//!
//! ```text
//!   gdata-parsable ──► gdata-core ◄── gdata-atom
//!         ▲                                │
//!         └────────────────────────────────┘
//! ```

pub mod comparable;
pub mod time;
pub mod tracing;

pub use comparable::{Comparable, compare_optional};
pub use time::{format_date, format_iso8601, parse_date, parse_iso8601};
pub use tracing::{TracingError, env_filter, init_tracing};
