use crate::StagedConfig;
use imgadj_core::{BootProto, Result, RunContext, parse_interface_option};

fn context(primary: &str) -> RunContext {
    RunContext {
        primary: Some(primary.to_string()),
        nameservers: vec!["8.8.8.8".to_string(), "8.8.4.4".to_string()],
        search_domains: vec!["example.com".to_string()],
        gateway: Some("10.0.0.1".to_string()),
        os_tag: "linux-rhel-6-4".to_string(),
    }
}

#[test]
fn test_static_primary() -> Result<()> {
    let specs = parse_interface_option("eth0/auto/10.7.9.100/255.255.0.0")?;
    let staged = StagedConfig::from_intent(
        "eth0",
        specs.get("eth0"),
        "52:54:00:00:00:01",
        &context("eth0"),
    );

    assert_eq!(staged.bootproto, Some(BootProto::Static));
    assert_eq!(staged.ipaddr.as_deref(), Some("10.7.9.100"));
    assert_eq!(staged.netmask.as_deref(), Some("255.255.0.0"));
    assert!(staged.primary);
    assert_eq!(staged.gateway.as_deref(), Some("10.0.0.1"));
    assert_eq!(staged.nameservers.len(), 2);
    assert_eq!(staged.domains, vec!["example.com".to_string()]);
    Ok(())
}

#[test]
fn test_dhcp_ignores_netmask() -> Result<()> {
    let specs = parse_interface_option("eth1/auto/dhcp/255.255.0.0")?;
    let staged = StagedConfig::from_intent(
        "eth1",
        specs.get("eth1"),
        "52:54:00:00:00:02",
        &context("eth0"),
    );

    assert_eq!(staged.bootproto, Some(BootProto::Dhcp));
    assert_eq!(staged.ipaddr, None);
    assert_eq!(staged.netmask, None);
    assert!(!staged.primary);
    assert_eq!(staged.gateway, None);
    assert!(staged.nameservers.is_empty());
    Ok(())
}

#[test]
fn test_no_intent_only_mac() {
    let staged = StagedConfig::from_intent("eth2", None, "52:54:00:00:00:03", &context("eth0"));
    assert_eq!(
        staged,
        StagedConfig {
            mac: Some("52:54:00:00:00:03".to_string()),
            ..Default::default()
        }
    );
}
