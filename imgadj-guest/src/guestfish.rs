use crate::{GuestSession, InspectField};
use imgadj_core::{AdjusterError, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

/// Guest session backed by a `guestfish --listen` server process.
///
/// Every call is one `guestfish --remote` invocation against that server, so
/// the image stays open (and the tree keeps its pending writes) across calls.
pub struct GuestfishSession {
    binary: PathBuf,
    pid: String,
}

impl GuestfishSession {
    pub fn launch(binary: &Path, image: &Path, selinux: bool) -> Result<Self> {
        let binary = which::which(binary).map_err(|e| AdjusterError::Guest {
            operation: "locate guestfish".to_string(),
            cause: format!("{}: {e}", binary.display()),
        })?;

        info!("Starting guestfish server for {}", image.display());
        let output = Command::new(&binary)
            .arg("--listen")
            .output()
            .map_err(|e| AdjusterError::guest("guestfish --listen", e))?;

        if !output.status.success() {
            return Err(AdjusterError::guest(
                "guestfish --listen",
                String::from_utf8_lossy(&output.stderr),
            ));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let pid = parse_listen_pid(&stdout).ok_or_else(|| {
            AdjusterError::guest("guestfish --listen", format!("no PID in '{}'", stdout.trim()))
        })?;
        debug!("guestfish server pid {}", pid);

        let mut session = Self { binary, pid };
        let image = image.to_string_lossy();
        session.run(&["add-drive", &image, "readonly:false"])?;
        if selinux {
            session.run(&["set-selinux", "true"])?;
        }
        debug!("guestfs launch(): {}", image);
        session.run(&["launch"])?;
        Ok(session)
    }

    fn run(&mut self, args: &[&str]) -> Result<String> {
        let operation = args.first().copied().unwrap_or("guestfish");
        debug!("guestfish {}", args.join(" "));

        let output = Command::new(&self.binary)
            .arg(format!("--remote={}", self.pid))
            .arg("--")
            .args(args)
            .output()
            .map_err(|e| AdjusterError::guest(operation, e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AdjusterError::guest(operation, stderr.trim()));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }

    fn run_lines(&mut self, args: &[&str]) -> Result<Vec<String>> {
        Ok(self
            .run(args)?
            .lines()
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn run_bool(&mut self, args: &[&str]) -> Result<bool> {
        let out = self.run(args)?;
        match out.trim() {
            "true" => Ok(true),
            "false" => Ok(false),
            other => Err(AdjusterError::guest(
                args[0],
                format!("unexpected boolean '{other}'"),
            )),
        }
    }
}

impl Drop for GuestfishSession {
    fn drop(&mut self) {
        if let Err(e) = self.run(&["exit"]) {
            warn!("Failed to stop guestfish server {}: {}", self.pid, e);
        }
    }
}

/// Extracts `NNN` from `GUESTFISH_PID=NNN; export GUESTFISH_PID`.
pub fn parse_listen_pid(output: &str) -> Option<String> {
    let start = output.find("GUESTFISH_PID=")? + "GUESTFISH_PID=".len();
    let pid: String = output[start..]
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if pid.is_empty() { None } else { Some(pid) }
}

/// Text of a string-returning command: guestfish prints those followed
/// by one newline of its own, which is not part of the value.
pub fn string_result(output: &str) -> &str {
    output.strip_suffix('\n').unwrap_or(output)
}

/// Splits `key: value` lines as guestfish prints hashtables.
pub fn parse_hash(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter_map(|line| line.split_once(": "))
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

impl GuestSession for GuestfishSession {
    fn inspect_os(&mut self) -> Result<Vec<String>> {
        self.run_lines(&["inspect-os"])
    }

    fn inspect_get(&mut self, root: &str, field: InspectField) -> Result<String> {
        Ok(self.run(&[field.command(), root])?.trim().to_string())
    }

    fn inspect_get_mountpoints(&mut self, root: &str) -> Result<Vec<(String, String)>> {
        let out = self.run(&["inspect-get-mountpoints", root])?;
        Ok(parse_hash(&out))
    }

    fn mount(&mut self, device: &str, mountpoint: &str) -> Result<()> {
        self.run(&["mount", device, mountpoint]).map(|_| ())
    }

    fn inventory(&mut self) -> Result<Vec<(String, Vec<String>)>> {
        let mut listing = Vec::new();
        for (label, command) in [
            ("partitions", "list-partitions"),
            ("devices", "list-devices"),
            ("filesystems", "list-filesystems"),
            ("lvs", "lvs"),
            ("mounts", "mounts"),
            ("mountpoints", "mountpoints"),
        ] {
            listing.push((label.to_string(), self.run_lines(&[command])?));
        }
        Ok(listing)
    }

    fn aug_init(&mut self, root: &str, flags: u32) -> Result<()> {
        self.run(&["aug-init", root, &flags.to_string()]).map(|_| ())
    }

    fn aug_match(&mut self, path: &str) -> Result<Vec<String>> {
        self.run_lines(&["aug-match", path])
    }

    fn aug_get(&mut self, path: &str) -> Result<Option<String>> {
        if self.aug_match(path)?.is_empty() {
            return Ok(None);
        }
        let out = self.run(&["aug-get", path])?;
        Ok(Some(string_result(&out).to_string()))
    }

    fn aug_set(&mut self, path: &str, value: &str) -> Result<()> {
        self.run(&["aug-set", path, value]).map(|_| ())
    }

    fn aug_insert(&mut self, path: &str, label: &str, before: bool) -> Result<()> {
        let before = if before { "true" } else { "false" };
        self.run(&["aug-insert", path, label, before]).map(|_| ())
    }

    fn aug_rm(&mut self, path: &str) -> Result<usize> {
        let out = self.run(&["aug-rm", path])?;
        out.trim()
            .parse()
            .map_err(|e| AdjusterError::guest("aug-rm", format!("bad count '{}': {e}", out.trim())))
    }

    fn aug_clear(&mut self, path: &str) -> Result<()> {
        self.run(&["aug-clear", path]).map(|_| ())
    }

    fn aug_save(&mut self) -> Result<()> {
        self.run(&["aug-save"]).map(|_| ())
    }

    fn aug_close(&mut self) -> Result<()> {
        self.run(&["aug-close"]).map(|_| ())
    }

    fn exists(&mut self, path: &str) -> Result<bool> {
        self.run_bool(&["exists", path])
    }

    fn is_file(&mut self, path: &str) -> Result<bool> {
        self.run_bool(&["is-file", path])
    }

    fn read_file(&mut self, path: &str) -> Result<String> {
        let out = self.run(&["cat", path])?;
        Ok(string_result(&out).to_string())
    }

    fn write_file(&mut self, path: &str, content: &str) -> Result<()> {
        self.run(&["write", path, content]).map(|_| ())
    }

    fn copy(&mut self, src: &str, dest: &str) -> Result<()> {
        self.run(&["cp-a", src, dest]).map(|_| ())
    }

    fn rename(&mut self, src: &str, dest: &str) -> Result<()> {
        self.run(&["mv", src, dest]).map(|_| ())
    }

    fn sh(&mut self, command: &str) -> Result<String> {
        let out = self.run(&["sh", command])?;
        Ok(string_result(&out).to_string())
    }

    fn sync(&mut self) -> Result<()> {
        self.run(&["sync"]).map(|_| ())
    }

    fn umount_all(&mut self) -> Result<()> {
        self.run(&["umount-all"]).map(|_| ())
    }
}
