use crate::{AdjustContext, Operation, dispatch};
use imgadj_core::{
    AdjusterError, CommittedInterfaces, Config, InterfaceSpecs, LogLevel, MacAllocator, OsFamily,
    OsInfo, Result, RunContext, RunLog, new_uuid, ordinal_name,
};
use imgadj_domain::{SyncReport, interface_macs, synchronize};
use imgadj_guest::GuestSession;
use imgadj_network::{configure_interfaces, plan_macs};
use std::path::PathBuf;
use tracing::info;

/// Everything one invocation asks for.
#[derive(Debug, Clone, Default)]
pub struct AdjustRequest {
    pub image: PathBuf,
    pub xml: PathBuf,
    /// Present when interfaces are to be reconfigured.
    pub interfaces: Option<InterfaceSpecs>,
    pub primary: Option<String>,
    pub gateway: Option<String>,
    pub nameservers: Vec<String>,
    pub domains: Vec<String>,
    pub hostname: Option<String>,
    pub serial_console: bool,
}

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub family: OsFamily,
    pub committed: Option<CommittedInterfaces>,
    pub descriptor: Option<SyncReport>,
    /// Before/after lines for every interface.
    pub report: Vec<String>,
    /// Operator-facing problems that did not stop the run.
    pub warnings: Vec<String>,
    /// Operations with no adjuster for this family.
    pub skipped: Vec<Operation>,
}

impl RunSummary {
    fn new(family: OsFamily) -> Self {
        Self {
            family,
            committed: None,
            descriptor: None,
            report: Vec::new(),
            warnings: Vec::new(),
            skipped: Vec::new(),
        }
    }

    fn step(
        &mut self,
        guest: &mut dyn GuestSession,
        operation: Operation,
        ctx: &AdjustContext<'_>,
        log: &dyn RunLog,
    ) -> Result<()> {
        log.record(LogLevel::Info, operation.as_str())?;
        if !dispatch(guest, self.family, operation, ctx)? {
            log.record(
                LogLevel::Warn,
                &format!("{operation} not defined for {}, skipped", self.family),
            )?;
            self.skipped.push(operation);
        }
        Ok(())
    }

    fn warn(&mut self, log: &dyn RunLog, warning: String) -> Result<()> {
        log.record(LogLevel::Warn, &warning)?;
        self.warnings.push(warning);
        Ok(())
    }
}

/// Applies `request` to an opened image.
///
/// Order: interfaces, udev rules, resolver, domain descriptor and misc when
/// interfaces are given; then the hostname; then the serial console pieces.
/// Nothing is retried and nothing is rolled back: an error leaves earlier
/// steps in place, and `log` already holds every step and change line up to
/// the failing one.
pub fn run(
    guest: &mut dyn GuestSession,
    os: &OsInfo,
    request: &AdjustRequest,
    config: &Config,
    log: &dyn RunLog,
) -> Result<RunSummary> {
    let family = config
        .family_for(os)
        .ok_or_else(|| AdjusterError::UnsupportedOs { os: os.tag() })?;
    info!("OS family: {} ({})", family, os.major_tag());

    let mut summary = RunSummary::new(family);
    let base = AdjustContext {
        config,
        hostname: request.hostname.as_deref(),
        nameservers: &request.nameservers,
        domains: &request.domains,
        committed: None,
    };

    if let Some(specs) = &request.interfaces {
        info!("=> adjust interfaces (img)");
        log.record(LogLevel::Info, "configure interfaces")?;
        let descriptor_macs = interface_macs(&request.xml)?;

        if let Some(primary) = &request.primary {
            let known = (0..descriptor_macs.len()).any(|i| &ordinal_name(i) == primary);
            if !known {
                summary.warn(
                    log,
                    format!(
                        "primary interface {primary} is not in {}; gateway, nameservers and search domains were not written",
                        request.xml.display()
                    ),
                )?;
            }
        }

        let mut allocator = MacAllocator::new(config.mac_prefix.clone());
        let new_macs = plan_macs(&descriptor_macs, specs, &mut allocator);
        let run_ctx = RunContext {
            primary: request.primary.clone(),
            nameservers: request.nameservers.clone(),
            search_domains: request.domains.clone(),
            gateway: request.gateway.clone(),
            os_tag: os.tag(),
        };

        let outcome = configure_interfaces(
            guest,
            family,
            &descriptor_macs,
            specs,
            &new_macs,
            &run_ctx,
            config,
            log,
        )?;
        summary.report = outcome.report;

        let ctx = AdjustContext {
            committed: Some(&outcome.committed),
            ..base
        };
        summary.step(guest, Operation::UdevRules, &ctx, log)?;
        summary.step(guest, Operation::Resolver, &ctx, log)?;

        info!("=> adjust interfaces (xml)");
        let new_macs: Vec<Option<String>> = outcome.committed.new_macs();
        log.record(LogLevel::Info, "synchronize domain descriptor")?;
        let sync = synchronize(&request.xml, &request.image, &new_uuid(), &new_macs)?;
        for line in &sync.lines {
            log.record(LogLevel::Info, line)?;
        }
        summary.descriptor = Some(sync);

        summary.step(guest, Operation::Misc, &ctx, log)?;
        summary.committed = Some(outcome.committed);
    }

    if request.hostname.is_some() {
        summary.step(guest, Operation::Hostname, &base, log)?;
    }

    if request.serial_console {
        info!("=> adjust for serial console");
        summary.step(guest, Operation::Bootloader, &base, log)?;
        summary.step(guest, Operation::InitConsole, &base, log)?;
        summary.step(guest, Operation::Inittab, &base, log)?;
    }

    Ok(summary)
}
