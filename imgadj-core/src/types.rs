use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Placeholder accepted in the MAC and address fields of an interface description.
pub const AUTO: &str = "auto";
pub const DHCP: &str = "dhcp";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OsFamily {
    /// Red Hat style: one `ifcfg-<name>` label/value file per interface.
    Rhel,
    /// Debian style: positional stanzas in `/etc/network/interfaces`.
    Ubuntu,
}

impl std::fmt::Display for OsFamily {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OsFamily::Rhel => write!(f, "rhel"),
            OsFamily::Ubuntu => write!(f, "ubuntu"),
        }
    }
}

/// What inspection of the guest image reported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsInfo {
    pub os_type: String,
    pub distro: String,
    pub major: u32,
    pub minor: u32,
    pub product_name: String,
    pub hostname: String,
}

impl OsInfo {
    /// `type-distro-major-minor`, e.g. `linux-rhel-6-4`.
    pub fn tag(&self) -> String {
        format!(
            "{}-{}-{}-{}",
            self.os_type, self.distro, self.major, self.minor
        )
    }

    /// The tag without the minor version, e.g. `linux-rhel-6`.
    pub fn major_tag(&self) -> String {
        format!("{}-{}-{}", self.os_type, self.distro, self.major)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BootProto {
    Static,
    Dhcp,
}

impl BootProto {
    pub fn as_str(&self) -> &'static str {
        match self {
            BootProto::Static => "static",
            BootProto::Dhcp => "dhcp",
        }
    }
}

impl std::fmt::Display for BootProto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacIntent {
    Auto,
    Explicit(String),
}

impl std::fmt::Display for MacIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MacIntent::Auto => f.write_str(AUTO),
            MacIntent::Explicit(mac) => f.write_str(mac),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AddressIntent {
    Dhcp,
    Static(String),
}

impl std::fmt::Display for AddressIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AddressIntent::Dhcp => f.write_str(DHCP),
            AddressIntent::Static(addr) => f.write_str(addr),
        }
    }
}

/// Desired state for one interface, keyed by its ordinal name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceIntent {
    pub name: String,
    pub mac: MacIntent,
    pub address: AddressIntent,
    /// Kept verbatim; only meaningful for static addressing.
    pub netmask: String,
}

impl InterfaceIntent {
    pub fn bootproto(&self) -> BootProto {
        match self.address {
            AddressIntent::Dhcp => BootProto::Dhcp,
            AddressIntent::Static(_) => BootProto::Static,
        }
    }

    pub fn static_address(&self) -> Option<(&str, &str)> {
        match &self.address {
            AddressIntent::Static(addr) => Some((addr.as_str(), self.netmask.as_str())),
            AddressIntent::Dhcp => None,
        }
    }
}

impl std::fmt::Display for InterfaceIntent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}/{}", self.name, self.mac, self.address, self.netmask)
    }
}

/// Identity of one interface as read from the guest and as committed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceIdentity {
    pub name: String,
    pub mac: Option<String>,
    pub new_mac: Option<String>,
    pub uuid: Option<String>,
    pub new_uuid: Option<String>,
    pub primary: bool,
}

impl InterfaceIdentity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// Ordinal interface name for a position in the descriptor's device list.
pub fn ordinal_name(index: usize) -> String {
    format!("eth{index}")
}

/// Settings shared by every interface in one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunContext {
    pub primary: Option<String>,
    pub nameservers: Vec<String>,
    pub search_domains: Vec<String>,
    pub gateway: Option<String>,
    pub os_tag: String,
}

impl RunContext {
    pub fn is_primary(&self, name: &str) -> bool {
        self.primary.as_deref() == Some(name)
    }
}

/// Identities committed by the orchestrator, in descriptor order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommittedInterfaces {
    pub interfaces: Vec<InterfaceIdentity>,
}

impl CommittedInterfaces {
    /// Old MAC → new MAC for every interface whose MAC changed.
    pub fn mac_substitutions(&self) -> BTreeMap<String, String> {
        self.interfaces
            .iter()
            .filter_map(|iface| match (&iface.mac, &iface.new_mac) {
                (Some(old), Some(new)) if old != new => {
                    Some((old.to_lowercase(), new.to_lowercase()))
                }
                _ => None,
            })
            .collect()
    }

    pub fn new_macs(&self) -> Vec<Option<String>> {
        self.interfaces
            .iter()
            .map(|iface| iface.new_mac.clone())
            .collect()
    }

    pub fn primary(&self) -> Option<&InterfaceIdentity> {
        self.interfaces.iter().find(|iface| iface.primary)
    }
}
