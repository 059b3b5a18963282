pub mod config;
pub mod error;
pub mod identity;
pub mod ifspec;
pub mod logging;
pub mod types;

#[cfg(test)]
mod tests;

pub use config::*;
pub use error::*;
pub use identity::{MacAllocator, new_mac, new_uuid};
pub use ifspec::{InterfaceSpecs, parse_interface_option, split_list};
pub use logging::{LogLevel, NullLog, RunJournal, RunLog};
pub use types::*;
