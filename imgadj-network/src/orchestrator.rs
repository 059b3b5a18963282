use crate::{StagedConfig, load_adapter};
use imgadj_core::{
    CommittedInterfaces, Config, InterfaceSpecs, LogLevel, MacAllocator, MacIntent, OsFamily,
    Result, RunContext, RunLog, ordinal_name,
};
use imgadj_guest::GuestSession;
use tracing::{info, warn};

/// What the interface pass did: the committed identities plus the
/// before/after report lines, in descriptor order.
#[derive(Debug, Clone, Default)]
pub struct InterfaceOutcome {
    pub committed: CommittedInterfaces,
    pub report: Vec<String>,
}

/// New MAC for each descriptor interface, index-aligned with `descriptor_macs`.
///
/// Explicit MACs from the intents are used as given; `auto` and interfaces
/// with no intent get a generated address. Every pre-existing descriptor MAC
/// is reserved first, so no generated address reuses one.
pub fn plan_macs(
    descriptor_macs: &[String],
    specs: &InterfaceSpecs,
    allocator: &mut MacAllocator,
) -> Vec<String> {
    for mac in descriptor_macs {
        allocator.reserve(mac);
    }

    (0..descriptor_macs.len())
        .map(|i| match specs.get(&ordinal_name(i)).map(|intent| &intent.mac) {
            Some(MacIntent::Explicit(mac)) => allocator.claim(mac),
            Some(MacIntent::Auto) | None => allocator.generate(),
        })
        .collect()
}

/// Stages and commits every descriptor interface, in descriptor order.
///
/// `new_macs` comes from [`plan_macs`]. The current MAC of each identity is
/// what the guest records, falling back to the descriptor's value. Report
/// lines go to `log` before each interface is committed.
pub fn configure_interfaces(
    guest: &mut dyn GuestSession,
    family: OsFamily,
    descriptor_macs: &[String],
    specs: &InterfaceSpecs,
    new_macs: &[String],
    ctx: &RunContext,
    config: &Config,
    log: &dyn RunLog,
) -> Result<InterfaceOutcome> {
    if let Some(primary) = &ctx.primary {
        let known = (0..descriptor_macs.len()).any(|i| &ordinal_name(i) == primary);
        if !known {
            warn!(
                "Primary interface {} is not in the domain descriptor; no gateway, nameserver or search domain is written",
                primary
            );
        }
    }

    let mut outcome = InterfaceOutcome::default();
    for (i, (descriptor_mac, new_mac)) in descriptor_macs.iter().zip(new_macs).enumerate() {
        let name = ordinal_name(i);
        info!("==> {}", name);

        let mut adapter = load_adapter(family, guest, &name)?;
        adapter.stage(StagedConfig::from_intent(&name, specs.get(&name), new_mac, ctx));

        for line in adapter.describe() {
            info!("{}", line);
            log.record(LogLevel::Info, &line)?;
            outcome.report.push(line);
        }

        if adapter.has_changes() {
            adapter.commit(guest, config)?;
            log.record(LogLevel::Info, &format!("{name} committed"))?;
        } else {
            info!("no configuration requested for {}, leaving it unchanged", name);
        }

        let mut identity = adapter.identity();
        if identity.mac.is_none() {
            identity.mac = Some(descriptor_mac.to_lowercase());
        }
        outcome.committed.interfaces.push(identity);
    }
    Ok(outcome)
}
