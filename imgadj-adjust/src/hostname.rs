use crate::AdjustContext;
use imgadj_core::Result;
use imgadj_guest::{GuestSession, file_path, preserve_original, write_preserving};
use tracing::{debug, info};

pub const RHEL_NETWORK: &str = "/etc/sysconfig/network";
pub const HOSTNAME_FILE: &str = "/etc/hostname";

/// Sets `HOSTNAME` in `/etc/sysconfig/network`.
pub fn rhel_hostname(guest: &mut dyn GuestSession, ctx: &AdjustContext<'_>) -> Result<()> {
    let Some(new_hostname) = ctx.hostname else {
        return Ok(());
    };
    info!("==> hostname ({})", RHEL_NETWORK);

    preserve_original(guest, RHEL_NETWORK)?;
    let key = format!("{}/HOSTNAME", file_path(RHEL_NETWORK));
    let old = guest.aug_get(&key)?;
    info!("  {} => {}", old.as_deref().unwrap_or("-"), new_hostname);
    guest.aug_set(&key, new_hostname)?;
    guest.aug_save()
}

/// Rewrites `/etc/hostname`, keeping the old file as `hostname.adjuster_orig`.
pub fn ubuntu_hostname(guest: &mut dyn GuestSession, ctx: &AdjustContext<'_>) -> Result<()> {
    let Some(new_hostname) = ctx.hostname else {
        return Ok(());
    };
    info!("==> hostname ({})", HOSTNAME_FILE);

    let old = if guest.is_file(HOSTNAME_FILE)? {
        guest
            .read_file(HOSTNAME_FILE)?
            .lines()
            .next()
            .map(str::to_string)
    } else {
        debug!("{} does not exist yet", HOSTNAME_FILE);
        None
    };
    info!("  {} => {}", old.as_deref().unwrap_or("-"), new_hostname);
    write_preserving(guest, HOSTNAME_FILE, &format!("{new_hostname}\n"))
}
