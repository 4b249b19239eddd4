//! Media RSS elements (`media:`).

pub mod keywords;

pub use keywords::Keywords;
