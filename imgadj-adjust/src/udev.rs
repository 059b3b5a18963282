use crate::AdjustContext;
use imgadj_core::Result;
use imgadj_guest::{GuestSession, move_aside};
use regex::{Captures, Regex};
use std::collections::BTreeMap;
use tracing::{debug, info};

const ADDRESS_MATCH: &str = r#"(ATTR\{address\}==)"([0-9A-Fa-f:]+)""#;

/// Replaces every old MAC in `ATTR{address}=="…"` matches with its new value.
///
/// One pass over the text, so a new MAC is never substituted again.
pub fn rewrite_rules(text: &str, substitutions: &BTreeMap<String, String>) -> Result<String> {
    let pattern = Regex::new(ADDRESS_MATCH).map_err(anyhow::Error::from)?;
    let rewritten = pattern.replace_all(text, |caps: &Captures| {
        let old = caps[2].to_lowercase();
        match substitutions.get(&old) {
            Some(new) => format!("{}\"{}\"", &caps[1], new),
            None => caps[0].to_string(),
        }
    });
    Ok(rewritten.into_owned())
}

/// Points the persistent-net rules at the new MACs.
pub fn adjust_udev_rules(guest: &mut dyn GuestSession, ctx: &AdjustContext<'_>) -> Result<()> {
    let rules = ctx.config.udev_net_rules.as_str();
    info!("==> udev rules ({})", rules);

    if !guest.is_file(rules)? {
        debug!("{} is not file.", rules);
        return Ok(());
    }
    let substitutions = ctx
        .committed
        .map(|committed| committed.mac_substitutions())
        .unwrap_or_default();
    if substitutions.is_empty() {
        debug!("no MAC changes, leaving {} alone", rules);
        return Ok(());
    }
    for (old, new) in &substitutions {
        debug!("  {} => {}", old, new);
    }

    let orig = move_aside(guest, rules)?;
    let text = guest.read_file(&orig)?;
    guest.write_file(rules, &rewrite_rules(&text, &substitutions)?)
}
