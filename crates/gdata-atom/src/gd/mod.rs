//! Elements of the GData namespace (`gd:`).

pub mod reminder;

pub use reminder::{Reminder, ReminderTime};
