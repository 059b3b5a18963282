use crate::AdjustContext;
use crate::hostname::RHEL_NETWORK;
use imgadj_core::Result;
use imgadj_guest::{GuestSession, file_path, preserve_original};
use tracing::info;

pub const INITTAB: &str = "/etc/inittab";

/// Boots to multi-user text mode.
pub fn rhel_inittab(guest: &mut dyn GuestSession, _ctx: &AdjustContext<'_>) -> Result<()> {
    info!("==> inittab ({})", INITTAB);
    guest.aug_set(&format!("{}/id/runlevels", file_path(INITTAB)), "3")?;
    guest.aug_save()
}

/// Networking on, IPv6 off.
pub fn rhel_networking(guest: &mut dyn GuestSession, _ctx: &AdjustContext<'_>) -> Result<()> {
    info!("==> misc configuration");
    preserve_original(guest, RHEL_NETWORK)?;
    let root = file_path(RHEL_NETWORK);
    guest.aug_set(&format!("{root}/NETWORKING"), "yes")?;
    guest.aug_set(&format!("{root}/NETWORKING_IPV6"), "no")?;
    guest.aug_save()
}
