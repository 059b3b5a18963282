use crate::{AUG_SAVE_BACKUP, GuestSession, InspectField};
use imgadj_core::{AdjusterError, OsInfo, Result};
use tracing::{debug, info, warn};

/// Inspects the image, mounts its filesystems and opens the configuration tree.
///
/// Mount failures are logged and skipped. A guest whose type is not `linux`
/// is rejected before anything is written.
pub fn open_image(guest: &mut dyn GuestSession) -> Result<OsInfo> {
    debug!("guestfs inspect_os()");
    let roots = guest.inspect_os()?;
    let root = roots
        .first()
        .cloned()
        .ok_or_else(|| AdjusterError::UnsupportedOs {
            os: "image without an operating system".to_string(),
        })?;
    if roots.len() > 1 {
        warn!("Image has {} roots, using {}", roots.len(), root);
    }

    info!("Mounting guest (root: {})", root);
    let product_name = guest.inspect_get(&root, InspectField::ProductName)?;
    let hostname = guest.inspect_get(&root, InspectField::Hostname)?;
    info!("  Product Name: {}", product_name);
    info!("  Hostname: {}", hostname);

    let mut mountpoints = guest.inspect_get_mountpoints(&root)?;
    // Parents before children: "/" before "/boot".
    mountpoints.sort_by_key(|(mountpoint, _)| mountpoint.len());
    info!("  Mount Points: {:?}", mountpoints);
    for (mountpoint, device) in &mountpoints {
        debug!("    {} => {}", mountpoint, device);
        if let Err(e) = guest.mount(device, mountpoint) {
            warn!("{} (ignored)", e);
        }
    }

    guest.aug_init("/", AUG_SAVE_BACKUP)?;

    let os = OsInfo {
        os_type: guest.inspect_get(&root, InspectField::Type)?,
        distro: guest.inspect_get(&root, InspectField::Distro)?,
        major: parse_version(guest.inspect_get(&root, InspectField::MajorVersion)?)?,
        minor: parse_version(guest.inspect_get(&root, InspectField::MinorVersion)?)?,
        product_name,
        hostname,
    };

    if os.os_type != "linux" {
        return Err(AdjusterError::UnsupportedOs { os: os.os_type });
    }
    info!("  OS: {}", os.tag());

    if guest.exists("/sbin/load_policy")? {
        guest.sh("/sbin/load_policy")?;
        info!("SELinux policy loaded");
    }

    Ok(os)
}

fn parse_version(value: String) -> Result<u32> {
    value
        .trim()
        .parse()
        .map_err(|_| AdjusterError::guest("inspect version", format!("not a number: '{value}'")))
}

/// Flushes the tree and releases the filesystems.
pub fn close_image(guest: &mut dyn GuestSession) -> Result<()> {
    guest.aug_save()?;
    guest.aug_close()?;
    guest.sync()?;
    guest.umount_all()?;
    Ok(())
}

/// Logs the block device and mount inventory at debug level.
pub fn print_inventory(guest: &mut dyn GuestSession) -> Result<()> {
    for (label, entries) in guest.inventory()? {
        debug!("  {}: {:?}", label, entries);
    }
    Ok(())
}
