use crate::{AdjustContext, bootloader, console, hostname, misc, resolver, udev};
use imgadj_core::{AdjusterError, OsFamily, Result};
use imgadj_guest::GuestSession;
use tracing::{debug, warn};

pub type AdjustFn = fn(&mut dyn GuestSession, &AdjustContext<'_>) -> Result<()>;

/// Guest adjustments beyond the interface files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    UdevRules,
    Hostname,
    Resolver,
    Bootloader,
    InitConsole,
    Inittab,
    Misc,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::UdevRules => "adjust_udev_rules",
            Operation::Hostname => "adjust_hostname",
            Operation::Resolver => "adjust_resolvconf",
            Operation::Bootloader => "adjust_grub",
            Operation::InitConsole => "adjust_upstart",
            Operation::Inittab => "adjust_inittab",
            Operation::Misc => "adjust_misc",
        }
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The adjuster registered for a family and operation, if any.
///
/// Debian style guests take resolvers from the interfaces file and have no
/// inittab, so those operations are absent there.
pub fn lookup(family: OsFamily, operation: Operation) -> Option<AdjustFn> {
    use Operation::*;

    match (family, operation) {
        (_, UdevRules) => Some(udev::adjust_udev_rules),
        (OsFamily::Rhel, Hostname) => Some(hostname::rhel_hostname),
        (OsFamily::Ubuntu, Hostname) => Some(hostname::ubuntu_hostname),
        (OsFamily::Rhel, Resolver) => Some(resolver::adjust_resolv_conf),
        (OsFamily::Rhel, Bootloader) => Some(bootloader::rhel_grub),
        (OsFamily::Ubuntu, Bootloader) => Some(bootloader::ubuntu_grub),
        (OsFamily::Rhel, InitConsole) => Some(console::rhel_start_ttys),
        (OsFamily::Ubuntu, InitConsole) => Some(console::ubuntu_ttys0),
        (OsFamily::Rhel, Inittab) => Some(misc::rhel_inittab),
        (OsFamily::Rhel, Misc) => Some(misc::rhel_networking),
        (OsFamily::Ubuntu, Resolver | Inittab | Misc) => None,
    }
}

/// Runs one operation. A missing adjuster is logged and skipped; returns
/// whether anything ran.
pub fn dispatch(
    guest: &mut dyn GuestSession,
    family: OsFamily,
    operation: Operation,
    ctx: &AdjustContext<'_>,
) -> Result<bool> {
    debug!("adjuster(): {}, {}", operation, family);
    match lookup(family, operation) {
        Some(adjust) => {
            adjust(guest, ctx)?;
            Ok(true)
        }
        None => {
            let missing = AdjusterError::MissingOperation {
                family: family.to_string(),
                operation: operation.to_string(),
            };
            warn!("{}, skipping...", missing);
            Ok(false)
        }
    }
}
