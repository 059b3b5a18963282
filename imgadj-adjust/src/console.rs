use crate::AdjustContext;
use imgadj_core::{Result, SerialConfig};
use imgadj_guest::{GuestSession, move_aside, write_preserving};
use regex::Regex;
use tracing::info;

pub const START_TTYS: &str = "/etc/init/start-ttys.conf";
pub const UPSTART_DIR: &str = "/etc/init";

/// Adds `initctl start serial` to the tty start job, before its `end script`.
pub fn serial_start_ttys(text: &str, serial: &SerialConfig) -> Result<Option<String>> {
    let configured = Regex::new(r"\s+initctl\s+start\s+serial\s+DEV=\S+\s+SPEED=[0-9]+")
        .map_err(anyhow::Error::from)?;
    if configured.is_match(text) {
        return Ok(None);
    }

    let start = format!(
        "\tinitctl start serial DEV={} SPEED={}",
        serial.device, serial.speed
    );
    let mut out = String::with_capacity(text.len() + start.len() + 1);
    for line in text.split_inclusive('\n') {
        if line.contains("end script") {
            out.push_str(&start);
            out.push('\n');
        }
        out.push_str(line);
    }
    Ok(Some(out))
}

pub fn rhel_start_ttys(guest: &mut dyn GuestSession, ctx: &AdjustContext<'_>) -> Result<()> {
    info!("==> upstart configuration ({})", START_TTYS);
    if !guest.is_file(START_TTYS)? {
        info!("  {} not found, skipping...", START_TTYS);
        return Ok(());
    }

    let text = guest.read_file(START_TTYS)?;
    match serial_start_ttys(&text, &ctx.config.serial)? {
        None => {
            info!(
                "  {} already has serial console configuration, skipping...",
                START_TTYS
            );
            Ok(())
        }
        Some(updated) => {
            move_aside(guest, START_TTYS)?;
            guest.write_file(START_TTYS, &updated)
        }
    }
}

/// Upstart job running a getty on the serial device.
pub fn getty_job(serial: &SerialConfig) -> String {
    format!(
        "start on stopped rc RUNLEVEL=[2345]\nstop on runlevel [!2345]\n\nrespawn\nexec /sbin/getty -L {} {} vt102\n",
        serial.speed, serial.device
    )
}

pub fn ubuntu_ttys0(guest: &mut dyn GuestSession, ctx: &AdjustContext<'_>) -> Result<()> {
    let conf = format!("{UPSTART_DIR}/{}.conf", ctx.config.serial.device);
    info!("==> upstart configuration ({})", conf);
    if guest.exists(&conf)? {
        info!("  {} already exists, skipping...", conf);
        return Ok(());
    }
    write_preserving(guest, &conf, &getty_job(&ctx.config.serial))
}
