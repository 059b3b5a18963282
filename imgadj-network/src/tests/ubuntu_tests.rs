use crate::{InterfaceAdapter, StagedConfig, UbuntuIface};
use imgadj_core::{BootProto, Config, OsInfo, Result};
use imgadj_guest::{AUG_SAVE_BACKUP, GuestSession, MemoryGuest};

const INTERFACES: &str = "/files/etc/network/interfaces";
const INTERFACES_TEXT: &str =
    "auto lo\niface lo inet loopback\n\nauto eth0\niface eth0 inet static\n    address 192.168.1.10\n    netmask 255.255.255.0\n";

fn ubuntu_os() -> OsInfo {
    OsInfo {
        os_type: "linux".to_string(),
        distro: "ubuntu".to_string(),
        major: 12,
        minor: 4,
        product_name: "Ubuntu 12.04 LTS".to_string(),
        hostname: "template".to_string(),
    }
}

fn ubuntu_guest() -> Result<MemoryGuest> {
    let mut guest = MemoryGuest::new(ubuntu_os()).with_tree_file(
        "/etc/network/interfaces",
        INTERFACES_TEXT,
        &[
            ("auto[1]/1", "lo"),
            ("iface[1]", "lo"),
            ("iface[1]/family", "inet"),
            ("iface[1]/method", "loopback"),
            ("auto[2]/1", "eth0"),
            ("iface[2]", "eth0"),
            ("iface[2]/family", "inet"),
            ("iface[2]/method", "static"),
            ("iface[2]/address", "192.168.1.10"),
            ("iface[2]/netmask", "255.255.255.0"),
        ],
    )?;
    guest.aug_init("/", AUG_SAVE_BACKUP)?;
    Ok(guest)
}

fn staged(bootproto: BootProto, primary: bool) -> StagedConfig {
    let (ipaddr, netmask) = match bootproto {
        BootProto::Static => (Some("10.7.9.100".to_string()), Some("255.255.0.0".to_string())),
        BootProto::Dhcp => (None, None),
    };
    StagedConfig {
        bootproto: Some(bootproto),
        mac: Some("52:54:00:12:34:56".to_string()),
        ipaddr,
        netmask,
        primary,
        gateway: primary.then(|| "10.0.0.1".to_string()),
        nameservers: if primary {
            vec!["8.8.8.8".to_string(), "8.8.4.4".to_string()]
        } else {
            Vec::new()
        },
        domains: if primary {
            vec!["dept.example.com".to_string(), "example.com".to_string()]
        } else {
            Vec::new()
        },
        ..Default::default()
    }
}

#[test]
fn test_load_finds_stanza_by_value() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    let iface = UbuntuIface::load(&mut guest, "eth0")?;
    assert_eq!(iface.stanza(), Some("/files/etc/network/interfaces/iface[2]"));

    let missing = UbuntuIface::load(&mut guest, "eth1")?;
    assert_eq!(missing.stanza(), None);
    Ok(())
}

#[test]
fn test_commit_existing_primary() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    let mut iface = UbuntuIface::load(&mut guest, "eth0")?;
    iface.stage(staged(BootProto::Static, true));
    iface.commit(&mut guest, &Config::default())?;

    let value = |key: &str| guest.tree_value(&format!("{INTERFACES}/iface[2]/{key}"));
    assert_eq!(value("method").as_deref(), Some("static"));
    assert_eq!(value("address").as_deref(), Some("10.7.9.100"));
    assert_eq!(value("netmask").as_deref(), Some("255.255.0.0"));
    assert_eq!(value("gateway").as_deref(), Some("10.0.0.1"));
    assert_eq!(value("dns-nameservers").as_deref(), Some("8.8.8.8 8.8.4.4"));
    assert_eq!(
        value("dns-search").as_deref(),
        Some("dept.example.com example.com")
    );
    assert_eq!(guest.tree_matches(&format!("{INTERFACES}/iface")).len(), 2);
    Ok(())
}

#[test]
fn test_commit_creates_stanza_at_end() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    let mut iface = UbuntuIface::load(&mut guest, "eth1")?;
    iface.stage(staged(BootProto::Dhcp, false));
    iface.commit(&mut guest, &Config::default())?;

    assert_eq!(iface.stanza(), Some("/files/etc/network/interfaces/iface[3]"));
    assert_eq!(
        guest.tree_value(&format!("{INTERFACES}/iface[3]")).as_deref(),
        Some("eth1")
    );
    assert_eq!(
        guest.tree_value(&format!("{INTERFACES}/iface[3]/family")).as_deref(),
        Some("inet")
    );
    assert_eq!(
        guest.tree_value(&format!("{INTERFACES}/iface[3]/method")).as_deref(),
        Some("dhcp")
    );
    assert_eq!(
        guest.tree_value(&format!("{INTERFACES}/auto[3]/1")).as_deref(),
        Some("eth1")
    );
    assert_eq!(guest.tree_value(&format!("{INTERFACES}/iface[3]/gateway")), None);
    Ok(())
}

#[test]
fn test_commit_creates_first_stanza() -> Result<()> {
    let mut guest =
        MemoryGuest::new(ubuntu_os()).with_tree_file("/etc/network/interfaces", "", &[])?;
    guest.aug_init("/", AUG_SAVE_BACKUP)?;

    let mut iface = UbuntuIface::load(&mut guest, "eth0")?;
    iface.stage(staged(BootProto::Static, false));
    iface.commit(&mut guest, &Config::default())?;

    assert_eq!(iface.stanza(), Some("/files/etc/network/interfaces/iface"));
    assert_eq!(
        guest.tree_value(&format!("{INTERFACES}/auto/1")).as_deref(),
        Some("eth0")
    );
    assert_eq!(
        guest.tree_value(&format!("{INTERFACES}/iface/address")).as_deref(),
        Some("10.7.9.100")
    );
    Ok(())
}

#[test]
fn test_commit_dhcp_drops_static_fields() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    let mut iface = UbuntuIface::load(&mut guest, "eth0")?;
    iface.stage(staged(BootProto::Dhcp, false));
    iface.commit(&mut guest, &Config::default())?;

    assert_eq!(
        guest.tree_value(&format!("{INTERFACES}/iface[2]/method")).as_deref(),
        Some("dhcp")
    );
    assert_eq!(guest.tree_value(&format!("{INTERFACES}/iface[2]/address")), None);
    assert_eq!(guest.tree_value(&format!("{INTERFACES}/iface[2]/netmask")), None);
    Ok(())
}

#[test]
fn test_commit_non_primary_drops_former_primary_options() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    guest.aug_set(&format!("{INTERFACES}/iface[2]/gateway"), "192.168.1.1")?;
    guest.aug_set(&format!("{INTERFACES}/iface[2]/dns-nameservers"), "192.168.1.2")?;
    guest.aug_set(&format!("{INTERFACES}/iface[2]/dns-search"), "template.example.com")?;

    let mut iface = UbuntuIface::load(&mut guest, "eth0")?;
    iface.stage(staged(BootProto::Static, false));
    iface.commit(&mut guest, &Config::default())?;

    for key in ["gateway", "dns-nameservers", "dns-search"] {
        assert_eq!(
            guest.tree_value(&format!("{INTERFACES}/iface[2]/{key}")),
            None,
            "{key}"
        );
    }
    assert_eq!(
        guest.tree_value(&format!("{INTERFACES}/iface[2]/address")).as_deref(),
        Some("10.7.9.100")
    );
    Ok(())
}

#[test]
fn test_repeated_commits_keep_first_backup() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    for name in ["eth0", "eth1"] {
        let mut iface = UbuntuIface::load(&mut guest, name)?;
        iface.stage(staged(BootProto::Dhcp, false));
        iface.commit(&mut guest, &Config::default())?;
    }

    assert_eq!(
        guest.file("/etc/network/interfaces.adjuster_orig"),
        Some(INTERFACES_TEXT)
    );
    assert_eq!(
        guest.file("/etc/network/interfaces.augsave"),
        Some(INTERFACES_TEXT)
    );
    assert_eq!(guest.saves(), 2);
    Ok(())
}

#[test]
fn test_has_changes() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    let mut iface = UbuntuIface::load(&mut guest, "eth1")?;

    iface.stage(StagedConfig {
        mac: Some("52:54:00:12:34:56".to_string()),
        ..Default::default()
    });
    assert!(!iface.has_changes());

    iface.stage(StagedConfig {
        primary: true,
        ..Default::default()
    });
    assert!(iface.has_changes());
    Ok(())
}

#[test]
fn test_primary_without_method_or_stanza_writes_nothing() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    let mut iface = UbuntuIface::load(&mut guest, "eth1")?;
    iface.stage(StagedConfig {
        mac: Some("52:54:00:12:34:56".to_string()),
        primary: true,
        gateway: Some("10.0.0.1".to_string()),
        nameservers: vec!["8.8.8.8".to_string()],
        ..Default::default()
    });
    iface.commit(&mut guest, &Config::default())?;

    assert_eq!(iface.stanza(), None);
    assert_eq!(guest.tree_matches(&format!("{INTERFACES}/iface")).len(), 2);
    assert_eq!(guest.tree_matches(&format!("{INTERFACES}/auto")).len(), 2);
    assert_eq!(guest.file("/etc/network/interfaces.adjuster_orig"), None);
    assert_eq!(guest.saves(), 0);
    Ok(())
}

#[test]
fn test_primary_without_method_updates_existing_stanza() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    let mut iface = UbuntuIface::load(&mut guest, "eth0")?;
    iface.stage(StagedConfig {
        primary: true,
        gateway: Some("10.0.0.1".to_string()),
        ..Default::default()
    });
    iface.commit(&mut guest, &Config::default())?;

    let value = |key: &str| guest.tree_value(&format!("{INTERFACES}/iface[2]/{key}"));
    assert_eq!(value("method").as_deref(), Some("static"));
    assert_eq!(value("gateway").as_deref(), Some("10.0.0.1"));
    Ok(())
}

#[test]
fn test_identity_has_no_guest_mac() -> Result<()> {
    let mut guest = ubuntu_guest()?;
    let mut iface = UbuntuIface::load(&mut guest, "eth0")?;
    iface.stage(staged(BootProto::Dhcp, false));

    let identity = iface.identity();
    assert_eq!(identity.mac, None);
    assert_eq!(identity.new_mac.as_deref(), Some("52:54:00:12:34:56"));
    assert_eq!(identity.new_uuid, None);
    Ok(())
}
