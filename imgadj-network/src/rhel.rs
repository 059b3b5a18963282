use crate::{
    InterfaceAdapter, StagedConfig, describe_field, describe_header, describe_primary_extras,
};
use imgadj_core::{BootProto, Config, InterfaceIdentity, Result, new_uuid};
use imgadj_guest::{AUGSAVE_SUFFIX, GuestSession, file_path};
use tracing::{debug, info};

pub const IFCFG_DIR: &str = "/etc/sysconfig/network-scripts";

/// Keys written on every commit, whatever was requested.
const HARDENING: &[(&str, &str)] = &[
    ("NM_CONTROLLED", "no"),
    ("ONBOOT", "yes"),
    ("USERCTL", "no"),
    ("PEERDNS", "no"),
    ("IPV6INIT", "no"),
];

/// ifcfg only carries two resolvers; the full list goes to resolv.conf.
const MAX_IFCFG_DNS: usize = 2;

/// Keys only the primary interface carries.
const RESOLVER_KEYS: [&str; 4] = ["GATEWAY", "DNS1", "DNS2", "DOMAIN"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Current {
    bootproto: Option<String>,
    mac: Option<String>,
    ipaddr: Option<String>,
    netmask: Option<String>,
    uuid: Option<String>,
}

/// `ifcfg-<name>` file of a Red Hat style guest.
#[derive(Debug)]
pub struct RhelIfcfg {
    name: String,
    path: String,
    exists: bool,
    current: Current,
    staged: StagedConfig,
}

impl RhelIfcfg {
    pub fn load(guest: &mut dyn GuestSession, name: &str) -> Result<Self> {
        let path = format!("{IFCFG_DIR}/ifcfg-{name}");
        let tree_path = file_path(&path);
        debug!("loading {}", tree_path);

        let exists = !guest.aug_match(&tree_path)?.is_empty();
        let mut read = |key: &str| -> Result<Option<String>> {
            Ok(guest
                .aug_get(&format!("{tree_path}/{key}"))?
                .map(|v| unquote(&v)))
        };
        let current = Current {
            bootproto: read("BOOTPROTO")?,
            mac: read("HWADDR")?.map(|m| m.to_lowercase()),
            ipaddr: read("IPADDR")?,
            netmask: read("NETMASK")?,
            uuid: read("UUID")?,
        };

        Ok(Self {
            name: name.to_string(),
            path,
            exists,
            current,
            staged: StagedConfig::default(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    fn tree_key(&self, key: &str) -> String {
        format!("{}/{}", file_path(&self.path), key)
    }

    fn set(&self, guest: &mut dyn GuestSession, key: &str, value: &str) -> Result<()> {
        guest.aug_set(&self.tree_key(key), &quote(value))
    }

    /// `ifcfg-eth0.augsave` would be picked up as an interface file; hide it.
    fn hide_backup(&self, guest: &mut dyn GuestSession) -> Result<()> {
        let backup = format!("{}{AUGSAVE_SUFFIX}", self.path);
        if !guest.exists(&backup)? {
            return Ok(());
        }
        let hidden = format!("{IFCFG_DIR}/_ifcfg-{}{AUGSAVE_SUFFIX}", self.name);
        info!("  - renaming backup file ({} => {})", backup, hidden);
        guest.rename(&backup, &hidden)
    }
}

impl InterfaceAdapter for RhelIfcfg {
    fn name(&self) -> &str {
        &self.name
    }

    fn stage(&mut self, mut staged: StagedConfig) {
        staged.uuid.get_or_insert_with(new_uuid);
        self.staged = staged;
    }

    fn has_changes(&self) -> bool {
        true
    }

    fn commit(&mut self, guest: &mut dyn GuestSession, config: &Config) -> Result<()> {
        info!("writing new configuration for {}...", self.name);
        info!(
            "  - setting {}{}",
            self.path,
            if self.exists { "" } else { " (not exists, created)" }
        );
        let staged = self.staged.clone();

        if !self.exists {
            self.set(guest, "DEVICE", &self.name)?;
        }
        if let Some(bootproto) = staged.bootproto {
            self.set(guest, "BOOTPROTO", bootproto.as_str())?;
            if bootproto == BootProto::Dhcp {
                // A leftover static address would be requested from the DHCP server.
                for key in ["IPADDR", "NETMASK", "GATEWAY"] {
                    guest.aug_rm(&self.tree_key(key))?;
                }
            }
            if !staged.primary {
                for key in RESOLVER_KEYS {
                    guest.aug_rm(&self.tree_key(key))?;
                }
            }
        }
        if let Some(mac) = &staged.mac {
            self.set(guest, "HWADDR", mac)?;
        }
        if let Some(ipaddr) = &staged.ipaddr {
            self.set(guest, "IPADDR", ipaddr)?;
        }
        if let Some(netmask) = &staged.netmask {
            self.set(guest, "NETMASK", netmask)?;
        }
        if let Some(uuid) = &staged.uuid {
            self.set(guest, "UUID", uuid)?;
        }

        if staged.primary {
            if let Some(gateway) = &staged.gateway {
                self.set(guest, "GATEWAY", gateway)?;
            }
            for (i, ns) in staged.nameservers.iter().take(MAX_IFCFG_DNS).enumerate() {
                self.set(guest, &format!("DNS{}", i + 1), ns)?;
            }
            if staged.nameservers.len() > MAX_IFCFG_DNS {
                debug!(
                    "{} nameservers given, {} written to {}",
                    staged.nameservers.len(),
                    MAX_IFCFG_DNS,
                    self.path
                );
            }
            if !staged.domains.is_empty() {
                self.set(guest, "DOMAIN", &staged.domains.join(" "))?;
            }
        }

        for (key, value) in HARDENING {
            self.set(guest, key, value)?;
        }
        guest.aug_save()?;
        self.exists = true;

        self.hide_backup(guest)?;

        info!("  - repairing selinux labels");
        guest.sh(&format!("chcon -t {} {}", config.selinux_net_label, self.path))?;
        Ok(())
    }

    fn describe(&self) -> Vec<String> {
        let c = &self.current;
        let s = &self.staged;
        let mut lines = vec![
            describe_header(&self.name, s.primary),
            describe_field(
                "BOOTPROTO",
                c.bootproto.as_deref(),
                s.bootproto.map(|b| b.as_str()),
            ),
            describe_field("HWADDR", c.mac.as_deref(), s.mac.as_deref()),
            describe_field("IPADDR", c.ipaddr.as_deref(), s.ipaddr.as_deref()),
            describe_field("NETMASK", c.netmask.as_deref(), s.netmask.as_deref()),
            describe_field("UUID", c.uuid.as_deref(), s.uuid.as_deref()),
        ];
        lines.extend(describe_primary_extras(s));
        lines
    }

    fn identity(&self) -> InterfaceIdentity {
        InterfaceIdentity {
            name: self.name.clone(),
            mac: self.current.mac.clone(),
            new_mac: self.staged.mac.clone(),
            uuid: self.current.uuid.clone(),
            new_uuid: self.staged.uuid.clone(),
            primary: self.staged.primary,
        }
    }
}

fn quote(value: &str) -> String {
    format!("\"{value}\"")
}

fn unquote(value: &str) -> String {
    value.replace('"', "")
}
