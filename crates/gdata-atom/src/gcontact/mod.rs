//! Elements of the contacts namespace (`gContact:`).

pub mod external_id;

pub use external_id::ExternalId;
