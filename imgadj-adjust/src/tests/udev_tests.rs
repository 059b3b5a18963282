use super::fixtures::{committed, ubuntu_guest};
use crate::AdjustContext;
use crate::udev::{adjust_udev_rules, rewrite_rules};
use imgadj_core::{Config, Result};
use imgadj_guest::GuestSession;
use std::collections::BTreeMap;

const RULES: &str = "/etc/udev/rules.d/70-persistent-net.rules";
const RULES_TEXT: &str = "# This file was automatically generated by the /lib/udev/write_net_rules\n\n# PCI device 0x1af4:0x1000 (virtio-pci)\nSUBSYSTEM==\"net\", ACTION==\"add\", DRIVERS==\"?*\", ATTR{address}==\"52:54:00:AA:AA:01\", ATTR{type}==\"1\", KERNEL==\"eth*\", NAME=\"eth0\"\n\n# PCI device 0x1af4:0x1000 (virtio-pci)\nSUBSYSTEM==\"net\", ACTION==\"add\", DRIVERS==\"?*\", ATTR{address}==\"52:54:00:aa:aa:02\", ATTR{type}==\"1\", KERNEL==\"eth*\", NAME=\"eth1\"\n";

#[test]
fn test_rewrite_rules_replaces_known_macs() -> Result<()> {
    let subs: BTreeMap<String, String> = [
        ("52:54:00:aa:aa:01".to_string(), "52:54:00:12:34:01".to_string()),
    ]
    .into_iter()
    .collect();

    let out = rewrite_rules(RULES_TEXT, &subs)?;
    assert!(out.contains("ATTR{address}==\"52:54:00:12:34:01\", ATTR{type}==\"1\", KERNEL==\"eth*\", NAME=\"eth0\""));
    assert!(out.contains("ATTR{address}==\"52:54:00:aa:aa:02\""));
    assert!(out.starts_with("# This file was automatically generated"));
    Ok(())
}

#[test]
fn test_rewrite_rules_single_pass() -> Result<()> {
    // A swap must not be undone by a second substitution.
    let subs: BTreeMap<String, String> = [
        ("52:54:00:aa:aa:01".to_string(), "52:54:00:aa:aa:02".to_string()),
        ("52:54:00:aa:aa:02".to_string(), "52:54:00:aa:aa:01".to_string()),
    ]
    .into_iter()
    .collect();

    let out = rewrite_rules(RULES_TEXT, &subs)?;
    let eth0 = out.lines().find(|l| l.contains("NAME=\"eth0\"")).unwrap_or_default();
    let eth1 = out.lines().find(|l| l.contains("NAME=\"eth1\"")).unwrap_or_default();
    assert!(eth0.contains("52:54:00:aa:aa:02"), "{eth0}");
    assert!(eth1.contains("52:54:00:aa:aa:01"), "{eth1}");
    Ok(())
}

#[test]
fn test_adjust_keeps_original() -> Result<()> {
    let mut guest = ubuntu_guest()?.with_file(RULES, RULES_TEXT);
    let config = Config::default();
    let committed = committed(&[
        ("52:54:00:aa:aa:01", "52:54:00:12:34:01"),
        ("52:54:00:aa:aa:02", "52:54:00:12:34:02"),
    ]);
    let ctx = AdjustContext {
        committed: Some(&committed),
        ..AdjustContext::new(&config)
    };

    adjust_udev_rules(&mut guest, &ctx)?;

    assert_eq!(guest.file(&format!("{RULES}.orig")), Some(RULES_TEXT));
    let rules = guest.read_file(RULES)?;
    assert!(rules.contains("52:54:00:12:34:01"));
    assert!(rules.contains("52:54:00:12:34:02"));
    assert!(!rules.contains("aa:aa"));
    Ok(())
}

#[test]
fn test_adjust_without_rules_file() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    let config = Config::default();
    let committed = committed(&[("52:54:00:aa:aa:01", "52:54:00:12:34:01")]);
    let ctx = AdjustContext {
        committed: Some(&committed),
        ..AdjustContext::new(&config)
    };
    let before = guest.file_names();

    adjust_udev_rules(&mut guest, &ctx)?;
    assert_eq!(guest.file_names(), before);
    Ok(())
}

#[test]
fn test_adjust_without_changes_leaves_file() -> Result<()> {
    let mut guest = ubuntu_guest()?.with_file(RULES, RULES_TEXT);
    let config = Config::default();

    adjust_udev_rules(&mut guest, &AdjustContext::new(&config))?;
    assert!(!guest.exists(&format!("{RULES}.orig"))?);
    assert_eq!(guest.file(RULES), Some(RULES_TEXT));
    Ok(())
}
