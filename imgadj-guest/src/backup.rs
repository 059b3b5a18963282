//! Pre-modification copies of guest files.
//!
//! Every file the adjuster changes keeps its original text next to it:
//! `<file>.orig` when the file is rebuilt from that copy, `<file>.adjuster_orig`
//! when it is overwritten in place or edited through the tree more than once.

use crate::GuestSession;
use imgadj_core::Result;
use tracing::debug;

pub const ORIG_SUFFIX: &str = ".orig";
pub const ADJUSTER_ORIG_SUFFIX: &str = ".adjuster_orig";

/// Moves `path` to `<path>.orig` and returns the new location.
///
/// The caller then writes the replacement at `path` from the moved copy.
pub fn move_aside(guest: &mut dyn GuestSession, path: &str) -> Result<String> {
    let orig = format!("{path}{ORIG_SUFFIX}");
    debug!("moving {} to {}", path, orig);
    guest.rename(path, &orig)?;
    Ok(orig)
}

/// Copies `path` to `<path>.adjuster_orig` unless that copy already exists.
///
/// Returns the backup path when one was made. A second call in the same run
/// leaves the first copy alone, so it keeps the pre-run text.
pub fn preserve_original(guest: &mut dyn GuestSession, path: &str) -> Result<Option<String>> {
    let orig = format!("{path}{ADJUSTER_ORIG_SUFFIX}");
    if !guest.exists(path)? || guest.exists(&orig)? {
        return Ok(None);
    }
    debug!("file ({}) exists, creating backup as {}", path, orig);
    guest.copy(path, &orig)?;
    Ok(Some(orig))
}

/// Writes `content` to `path`, keeping any previous file as `<path>.adjuster_orig`.
pub fn write_preserving(guest: &mut dyn GuestSession, path: &str, content: &str) -> Result<()> {
    preserve_original(guest, path)?;
    guest.write_file(path, content)
}
