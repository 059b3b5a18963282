use crate::{
    InterfaceAdapter, StagedConfig, describe_field, describe_header, describe_primary_extras,
};
use imgadj_core::{BootProto, Config, InterfaceIdentity, Result};
use imgadj_guest::{GuestSession, file_path, preserve_original, strip_files_root};
use tracing::{debug, info, warn};

pub const INTERFACES_FILE: &str = "/etc/network/interfaces";

/// Stanza options only the primary interface carries.
const RESOLVER_KEYS: [&str; 3] = ["gateway", "dns-nameservers", "dns-search"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Current {
    method: Option<String>,
    address: Option<String>,
    netmask: Option<String>,
}

/// `iface <name>` stanza in `/etc/network/interfaces` of a Debian style guest.
///
/// Stanzas are found by scanning `iface` values, not by path, since their
/// position in the file is arbitrary.
#[derive(Debug)]
pub struct UbuntuIface {
    name: String,
    stanza: Option<String>,
    current: Current,
    staged: StagedConfig,
}

fn root() -> String {
    file_path(INTERFACES_FILE)
}

impl UbuntuIface {
    pub fn load(guest: &mut dyn GuestSession, name: &str) -> Result<Self> {
        let mut iface = Self {
            name: name.to_string(),
            stanza: None,
            current: Current::default(),
            staged: StagedConfig::default(),
        };

        for path in guest.aug_match(&format!("{}/iface", root()))? {
            if guest.aug_get(&path)?.as_deref() != Some(name) {
                continue;
            }
            debug!("found stanza for {} at {}", name, path);
            iface.current = Current {
                method: guest.aug_get(&format!("{path}/method"))?,
                address: guest.aug_get(&format!("{path}/address"))?,
                netmask: guest.aug_get(&format!("{path}/netmask"))?,
            };
            iface.stanza = Some(path);
            break;
        }
        Ok(iface)
    }

    pub fn stanza(&self) -> Option<&str> {
        self.stanza.as_deref()
    }

    /// Appends `auto <name>` and `iface <name> inet` after the last existing entries.
    fn create_stanza(&self, guest: &mut dyn GuestSession) -> Result<String> {
        let root = root();

        if guest.aug_match(&format!("{root}/auto"))?.is_empty() {
            guest.aug_set(&format!("{root}/auto/1"), &self.name)?;
        } else {
            guest.aug_insert(&format!("{root}/auto[last()]"), "auto", false)?;
            guest.aug_set(&format!("{root}/auto[last()]/1"), &self.name)?;
        }

        if !guest.aug_match(&format!("{root}/iface"))?.is_empty() {
            guest.aug_insert(&format!("{root}/iface[last()]"), "iface", false)?;
        }
        guest.aug_set(&format!("{root}/iface[last()]"), &self.name)?;
        guest.aug_set(&format!("{root}/iface[last()]/family"), "inet")?;

        guest
            .aug_match(&format!("{root}/iface[last()]"))?
            .into_iter()
            .next()
            .ok_or_else(|| imgadj_core::AdjusterError::tree(&root, "new iface stanza not found"))
    }
}

impl InterfaceAdapter for UbuntuIface {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&mut self, staged: StagedConfig) {
        self.staged = staged;
    }

    /// The hardware address is not stored in the stanza, so an interface
    /// with no intent and no primary settings has nothing to write.
    fn has_changes(&self) -> bool {
        self.staged.bootproto.is_some() || self.staged.primary
    }

    /// A stanza is only created when a method is staged; the lens rejects an
    /// `iface` without one.
    fn commit(&mut self, guest: &mut dyn GuestSession, _config: &Config) -> Result<()> {
        if self.stanza.is_none() && self.staged.bootproto.is_none() {
            warn!(
                "No stanza for {} in {} and no method requested; gateway, nameservers and search domains not written",
                self.name, INTERFACES_FILE
            );
            return Ok(());
        }

        info!("writing new configuration for {}...", self.name);
        preserve_original(guest, INTERFACES_FILE)?;

        let stanza = match &self.stanza {
            Some(path) => {
                info!("  - setting {} (exists)", strip_files_root(path));
                path.clone()
            }
            None => {
                let path = self.create_stanza(guest)?;
                info!("  - setting {} (not exists, created)", strip_files_root(&path));
                path
            }
        };

        let staged = &self.staged;
        if let Some(bootproto) = staged.bootproto {
            guest.aug_set(&format!("{stanza}/method"), bootproto.as_str())?;
            if bootproto == BootProto::Dhcp {
                for key in ["address", "netmask", "gateway"] {
                    guest.aug_rm(&format!("{stanza}/{key}"))?;
                }
            }
            if !staged.primary {
                for key in RESOLVER_KEYS {
                    guest.aug_rm(&format!("{stanza}/{key}"))?;
                }
            }
        }
        if let Some(address) = &staged.ipaddr {
            guest.aug_set(&format!("{stanza}/address"), address)?;
        }
        if let Some(netmask) = &staged.netmask {
            guest.aug_set(&format!("{stanza}/netmask"), netmask)?;
        }
        if staged.primary {
            if let Some(gateway) = &staged.gateway {
                guest.aug_set(&format!("{stanza}/gateway"), gateway)?;
            }
            if !staged.nameservers.is_empty() {
                guest.aug_set(
                    &format!("{stanza}/dns-nameservers"),
                    &staged.nameservers.join(" "),
                )?;
            }
            if !staged.domains.is_empty() {
                guest.aug_set(&format!("{stanza}/dns-search"), &staged.domains.join(" "))?;
            }
        }
        guest.aug_save()?;

        self.stanza = Some(stanza);
        Ok(())
    }

    fn describe(&self) -> Vec<String> {
        let c = &self.current;
        let s = &self.staged;
        let mut lines = vec![
            describe_header(&self.name, s.primary),
            describe_field(
                "method",
                c.method.as_deref(),
                s.bootproto.map(|b| b.as_str()),
            ),
            describe_field("address", c.address.as_deref(), s.ipaddr.as_deref()),
            describe_field("netmask", c.netmask.as_deref(), s.netmask.as_deref()),
        ];
        lines.extend(describe_primary_extras(s));
        lines
    }

    fn identity(&self) -> InterfaceIdentity {
        InterfaceIdentity {
            name: self.name.clone(),
            mac: None,
            new_mac: self.staged.mac.clone(),
            uuid: None,
            new_uuid: None,
            primary: self.staged.primary,
        }
    }
}
