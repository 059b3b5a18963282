use crate::AdjustContext;
use imgadj_core::{Result, SerialConfig};
use imgadj_guest::{GuestSession, file_path, write_preserving};
use regex::Regex;
use tracing::{debug, info};

pub const MENU_LST: &str = "/boot/grub/menu.lst";
pub const DEFAULT_GRUB: &str = "/etc/default/grub";

/// Kernel arguments that hide boot output.
const QUIET_FLAGS: &[&str] = &["rhgb", "quiet", "splash"];

/// Serial console on the default entry of a legacy grub `menu.lst`.
///
/// Each of the three pieces (kernel console argument, `serial` line,
/// `terminal` line) is only added when absent, so a second run changes nothing.
pub fn rhel_grub(guest: &mut dyn GuestSession, ctx: &AdjustContext<'_>) -> Result<()> {
    info!("==> grub configuration ({})", MENU_LST);
    let serial = &ctx.config.serial;
    let root = file_path(MENU_LST);

    let default = guest
        .aug_get(&format!("{root}/default"))?
        .and_then(|v| v.trim().parse::<usize>().ok())
        .unwrap_or(0);
    let kernel = format!("{root}/title[{}]/kernel", default + 1);
    debug!("default entry: {}", kernel);

    if guest.aug_match(&kernel)?.is_empty() {
        info!("  no kernel line in the default entry, skipping console argument");
    } else if guest.aug_match(&format!("{kernel}/console"))?.is_empty() {
        let after_root = format!("{kernel}/root");
        if !guest.aug_match(&after_root)?.is_empty() {
            guest.aug_insert(&after_root, "console", false)?;
        }
        guest.aug_set(&format!("{kernel}/console"), &serial.console_arg())?;
        for flag in QUIET_FLAGS {
            guest.aug_rm(&format!("{kernel}/{flag}"))?;
        }
    } else {
        info!("  kernel already has a console argument, skipping...");
    }

    if guest.aug_match(&format!("{root}/serial"))?.is_empty() {
        let hiddenmenu = format!("{root}/hiddenmenu");
        if !guest.aug_match(&hiddenmenu)?.is_empty() {
            guest.aug_insert(&hiddenmenu, "serial", false)?;
        }
        for (key, value) in serial_fields(serial) {
            guest.aug_set(&format!("{root}/serial/{key}"), &value)?;
        }
    }

    if guest.aug_match(&format!("{root}/terminal"))?.is_empty() {
        guest.aug_insert(&format!("{root}/serial"), "terminal", false)?;
        guest.aug_set(&format!("{root}/terminal/timeout"), "5")?;
        guest.aug_clear(&format!("{root}/terminal/serial"))?;
        guest.aug_clear(&format!("{root}/terminal/console"))?;
    }

    guest.aug_save()
}

fn serial_fields(serial: &SerialConfig) -> [(&'static str, String); 5] {
    [
        ("speed", serial.speed.to_string()),
        ("unit", serial.unit.to_string()),
        ("word", serial.word.to_string()),
        ("parity", serial.parity.clone()),
        ("stop", serial.stop.to_string()),
    ]
}

/// Serial console settings for `/etc/default/grub`.
///
/// Console arguments go at the end of `GRUB_CMDLINE_LINUX`, preceded by
/// `GRUB_TERMINAL` and `GRUB_SERIAL_COMMAND`; quiet flags leave
/// `GRUB_CMDLINE_LINUX_DEFAULT`. Returns `None` when a console argument is
/// already present.
pub fn serial_default_grub(text: &str, serial: &SerialConfig) -> Result<Option<String>> {
    let configured = Regex::new(r"(?m)^GRUB_CMDLINE_LINUX.*tty").map_err(anyhow::Error::from)?;
    if configured.is_match(text) {
        return Ok(None);
    }

    let console = format!("console=tty0 console={}", serial.console_arg());
    let terminal = [
        "GRUB_TERMINAL=serial".to_string(),
        format!("GRUB_SERIAL_COMMAND=\"{}\"", serial.serial_command()),
    ];

    let mut lines: Vec<String> = Vec::new();
    let mut found_cmdline = false;
    for line in text.lines() {
        if let Some(value) = line.strip_prefix("GRUB_CMDLINE_LINUX=") {
            found_cmdline = true;
            lines.extend(terminal.iter().cloned());
            let args = value.trim_matches('"');
            let args = if args.is_empty() {
                console.clone()
            } else {
                format!("{args} {console}")
            };
            lines.push(format!("GRUB_CMDLINE_LINUX=\"{args}\""));
        } else if let Some(value) = line.strip_prefix("GRUB_CMDLINE_LINUX_DEFAULT=") {
            let args: Vec<&str> = value
                .trim_matches('"')
                .split_whitespace()
                .filter(|arg| !QUIET_FLAGS.contains(arg))
                .collect();
            lines.push(format!("GRUB_CMDLINE_LINUX_DEFAULT=\"{}\"", args.join(" ")));
        } else {
            lines.push(line.to_string());
        }
    }
    if !found_cmdline {
        lines.extend(terminal);
        lines.push(format!("GRUB_CMDLINE_LINUX=\"{console}\""));
    }

    let mut out = lines.join("\n");
    out.push('\n');
    Ok(Some(out))
}

/// Rewrites `/etc/default/grub` and regenerates the grub menu.
pub fn ubuntu_grub(guest: &mut dyn GuestSession, ctx: &AdjustContext<'_>) -> Result<()> {
    info!("==> grub configuration ({})", DEFAULT_GRUB);
    let text = if guest.is_file(DEFAULT_GRUB)? {
        guest.read_file(DEFAULT_GRUB)?
    } else {
        String::new()
    };

    match serial_default_grub(&text, &ctx.config.serial)? {
        None => {
            info!("  grub already has serial console configuration, skipping...");
            Ok(())
        }
        Some(updated) => {
            write_preserving(guest, DEFAULT_GRUB, &updated)?;
            debug!("running update-grub...");
            guest.sh("update-grub")?;
            Ok(())
        }
    }
}
