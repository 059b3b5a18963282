mod orchestrator;
mod rhel;
mod ubuntu;

#[cfg(test)]
mod tests;

pub use orchestrator::{InterfaceOutcome, configure_interfaces, plan_macs};
pub use rhel::RhelIfcfg;
pub use ubuntu::UbuntuIface;

use imgadj_core::{
    BootProto, Config, InterfaceIdentity, InterfaceIntent, OsFamily, Result, RunContext,
};
use imgadj_guest::GuestSession;

/// New values for one interface, recorded before anything is written.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StagedConfig {
    pub bootproto: Option<BootProto>,
    pub mac: Option<String>,
    pub uuid: Option<String>,
    pub ipaddr: Option<String>,
    pub netmask: Option<String>,
    pub primary: bool,
    pub gateway: Option<String>,
    pub nameservers: Vec<String>,
    pub domains: Vec<String>,
}

impl StagedConfig {
    /// Derives the staged values from an intent (if any) and the run context.
    ///
    /// Address and netmask are only taken for static addressing. Gateway,
    /// nameservers and search domains only go to the primary interface.
    pub fn from_intent(
        name: &str,
        intent: Option<&InterfaceIntent>,
        new_mac: &str,
        ctx: &RunContext,
    ) -> Self {
        let primary = ctx.is_primary(name);
        let mut staged = StagedConfig {
            mac: Some(new_mac.to_string()),
            primary,
            ..Default::default()
        };

        if let Some(intent) = intent {
            staged.bootproto = Some(intent.bootproto());
            if let Some((addr, mask)) = intent.static_address() {
                staged.ipaddr = Some(addr.to_string());
                staged.netmask = Some(mask.to_string());
            }
        }

        if primary {
            staged.gateway = ctx.gateway.clone();
            staged.nameservers = ctx.nameservers.clone();
            staged.domains = ctx.search_domains.clone();
        }
        staged
    }
}

/// Per-family view of one interface's configuration entry.
///
/// `load` happens in each implementation's constructor; a missing entry is
/// not an error and is created on `commit`.
pub trait InterfaceAdapter {
    fn name(&self) -> &str;

    /// Records the new values. Touches nothing in the guest.
    fn stage(&mut self, staged: StagedConfig);

    /// Whether `commit` has anything to write for the staged values.
    fn has_changes(&self) -> bool;

    /// Writes the staged values and saves the tree.
    fn commit(&mut self, guest: &mut dyn GuestSession, config: &Config) -> Result<()>;

    /// Before/after lines for the operator. Never mutates.
    fn describe(&self) -> Vec<String>;

    /// Current and staged identity of the interface.
    fn identity(&self) -> InterfaceIdentity;
}

/// Loads the adapter for `name` in the given family.
pub fn load_adapter(
    family: OsFamily,
    guest: &mut dyn GuestSession,
    name: &str,
) -> Result<Box<dyn InterfaceAdapter>> {
    Ok(match family {
        OsFamily::Rhel => Box::new(RhelIfcfg::load(guest, name)?),
        OsFamily::Ubuntu => Box::new(UbuntuIface::load(guest, name)?),
    })
}

/// Interface header line shared by both families.
fn describe_header(name: &str, primary: bool) -> String {
    format!(
        "ifconfig for {} ({})",
        name,
        if primary { "primary" } else { "not primary" }
    )
}

/// `LABEL: old => new`, or `LABEL: old (not changed)`.
fn describe_field(label: &str, old: Option<&str>, new: Option<&str>) -> String {
    let old = old.unwrap_or("-");
    match new {
        Some(new) => format!("{label:>15}: {old} => {new}"),
        None => format!("{label:>15}: {old} (not changed)"),
    }
}

fn describe_primary_extras(staged: &StagedConfig) -> Vec<String> {
    if !staged.primary {
        return Vec::new();
    }
    vec![
        format!(
            "{:>15}: {}",
            "gateway",
            staged.gateway.as_deref().unwrap_or("-")
        ),
        format!("{:>15}: {}", "nameserver", staged.nameservers.join(" ")),
        format!("{:>15}: {}", "domain", staged.domains.join(" ")),
    ]
}
