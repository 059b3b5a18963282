use crate::Cli;
use crate::adjust::request_from;
use clap::Parser;
use imgadj_core::{AdjusterError, Result};
use std::path::PathBuf;

fn parse(args: &[&str]) -> Cli {
    let mut argv = vec!["kvm-image-adjuster"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).expect("arguments should parse")
}

#[test]
fn test_image_and_xml_are_required() {
    assert!(Cli::try_parse_from(["kvm-image-adjuster", "--image=./a.img"]).is_err());
    assert!(Cli::try_parse_from(["kvm-image-adjuster", "--xml=./a.xml"]).is_err());
}

#[test]
fn test_request_from_full_command_line() -> Result<()> {
    let cli = parse(&[
        "--image=./test.img",
        "--xml=./test.xml",
        "--interface=eth0/auto/10.7.9.100/255.255.0.0,eth1/auto/dhcp/dhcp",
        "--primary=eth0",
        "--gateway=10.0.0.1",
        "--hostname=vm.example.com",
        "--nameserver=8.8.8.8,8.8.4.4",
        "--domain=dept.example.com,example.com",
        "--serial-console",
    ]);
    let request = request_from(&cli)?;

    assert_eq!(request.image, PathBuf::from("./test.img"));
    assert_eq!(request.xml, PathBuf::from("./test.xml"));
    let specs = request.interfaces.expect("interfaces parsed");
    assert_eq!(specs.len(), 2);
    assert!(specs.get("eth0").is_some());
    assert!(specs.get("eth1").is_some());
    assert_eq!(request.primary.as_deref(), Some("eth0"));
    assert_eq!(request.gateway.as_deref(), Some("10.0.0.1"));
    assert_eq!(request.nameservers, vec!["8.8.8.8", "8.8.4.4"]);
    assert_eq!(request.domains, vec!["dept.example.com", "example.com"]);
    assert_eq!(request.hostname.as_deref(), Some("vm.example.com"));
    assert!(request.serial_console);
    Ok(())
}

#[test]
fn test_request_without_interfaces() -> Result<()> {
    let cli = parse(&["--image=a.img", "--xml=a.xml", "--hostname=h"]);
    let request = request_from(&cli)?;

    assert!(request.interfaces.is_none());
    assert!(request.nameservers.is_empty());
    assert!(request.domains.is_empty());
    assert!(!request.serial_console);
    Ok(())
}

#[test]
fn test_malformed_interface_rejected_before_launch() {
    let cli = parse(&["--image=a.img", "--xml=a.xml", "--interface=eth0/auto/dhcp"]);

    match request_from(&cli) {
        Err(AdjusterError::MalformedSpec { descriptor, .. }) => {
            assert_eq!(descriptor, "eth0/auto/dhcp");
        }
        other => panic!("expected MalformedSpec, got {other:?}"),
    }
}
