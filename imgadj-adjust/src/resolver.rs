use crate::AdjustContext;
use imgadj_core::Result;
use imgadj_guest::{GuestSession, file_path};
use tracing::info;

pub const RESOLV_CONF: &str = "/etc/resolv.conf";

/// Replaces the nameserver and search entries of `/etc/resolv.conf`.
///
/// Entries keep the given order; the first nameserver is queried first.
/// With neither list given the file is left alone.
pub fn adjust_resolv_conf(guest: &mut dyn GuestSession, ctx: &AdjustContext<'_>) -> Result<()> {
    info!("==> resolver ({})", RESOLV_CONF);
    if ctx.nameservers.is_empty() && ctx.domains.is_empty() {
        info!("  no nameserver or search domain given, skipping...");
        return Ok(());
    }

    let root = file_path(RESOLV_CONF);
    if guest.exists(RESOLV_CONF)? {
        info!("  {} exists, deleting existing entries...", RESOLV_CONF);
        guest.aug_rm(&format!("{root}/nameserver"))?;
        guest.aug_rm(&format!("{root}/search"))?;
    } else {
        info!("  {} not exists, creating...", RESOLV_CONF);
    }

    for ns in ctx.nameservers {
        append(guest, &root, "nameserver", ns)?;
    }
    for domain in ctx.domains {
        append(guest, &format!("{root}/search"), "domain", domain)?;
    }
    guest.aug_save()
}

/// Adds `label = value` after the last `label` under `parent`.
fn append(guest: &mut dyn GuestSession, parent: &str, label: &str, value: &str) -> Result<()> {
    if guest.aug_match(&format!("{parent}/{label}"))?.is_empty() {
        guest.aug_set(&format!("{parent}/{label}"), value)
    } else {
        let last = format!("{parent}/{label}[last()]");
        guest.aug_insert(&last, label, false)?;
        guest.aug_set(&last, value)
    }
}
