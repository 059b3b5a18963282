use crate::types::{AUTO, AddressIntent, DHCP, InterfaceIntent, MacIntent};
use crate::{AdjusterError, Result};
use std::collections::BTreeMap;

/// Parsed `--interface` option, keyed by interface name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InterfaceSpecs {
    intents: BTreeMap<String, InterfaceIntent>,
}

impl InterfaceSpecs {
    pub fn get(&self, name: &str) -> Option<&InterfaceIntent> {
        self.intents.get(name)
    }

    pub fn len(&self) -> usize {
        self.intents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InterfaceIntent> {
        self.intents.values()
    }

    /// Comma-separated `name/mac/ipaddr/netmask` form, sorted by name.
    pub fn to_option_string(&self) -> String {
        self.intents
            .values()
            .map(|intent| intent.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Parses `eth0/auto/10.0.0.2/255.255.255.0,eth1/auto/dhcp/dhcp`.
///
/// Each descriptor must have exactly four `/`-separated fields. The MAC field
/// is lower-cased. `dhcp` in the address field switches to dynamic
/// addressing; the netmask is then kept but ignored. A later descriptor for
/// the same name replaces an earlier one.
pub fn parse_interface_option(optstr: &str) -> Result<InterfaceSpecs> {
    let mut intents = BTreeMap::new();

    for descriptor in optstr.split(',') {
        let fields: Vec<&str> = descriptor.split('/').collect();
        if fields.len() != 4 {
            return Err(AdjusterError::MalformedSpec {
                descriptor: descriptor.to_string(),
                reason: format!(
                    "expected NAME/MAC/IPADDR/NETMASK, found {} field(s)",
                    fields.len()
                ),
            });
        }

        let name = fields[0];
        if name.is_empty() {
            return Err(AdjusterError::MalformedSpec {
                descriptor: descriptor.to_string(),
                reason: "interface name is empty".to_string(),
            });
        }

        let mac = fields[1].to_lowercase();
        let mac = if mac == AUTO {
            MacIntent::Auto
        } else {
            MacIntent::Explicit(mac)
        };

        let address = if fields[2] == DHCP {
            AddressIntent::Dhcp
        } else {
            AddressIntent::Static(fields[2].to_string())
        };

        intents.insert(
            name.to_string(),
            InterfaceIntent {
                name: name.to_string(),
                mac,
                address,
                netmask: fields[3].to_string(),
            },
        );
    }

    Ok(InterfaceSpecs { intents })
}

/// Splits a comma-separated option, dropping empty items.
pub fn split_list(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}
