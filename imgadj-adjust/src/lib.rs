pub mod bootloader;
pub mod console;
pub mod dispatch;
pub mod hostname;
pub mod misc;
pub mod resolver;
pub mod run;
pub mod udev;

#[cfg(test)]
mod tests;

pub use dispatch::{AdjustFn, Operation, dispatch, lookup};
pub use run::{AdjustRequest, RunSummary, run};

use imgadj_core::{CommittedInterfaces, Config};

/// Inputs shared by the auxiliary adjusters.
#[derive(Debug, Clone, Copy)]
pub struct AdjustContext<'a> {
    pub config: &'a Config,
    pub hostname: Option<&'a str>,
    pub nameservers: &'a [String],
    pub domains: &'a [String],
    /// Set once the interface pass has committed.
    pub committed: Option<&'a CommittedInterfaces>,
}

impl<'a> AdjustContext<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            hostname: None,
            nameservers: &[],
            domains: &[],
            committed: None,
        }
    }
}
