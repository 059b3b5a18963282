mod adjust;
mod output;

#[cfg(test)]
mod tests;

use clap::Parser;
use imgadj_core::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const EXAMPLE: &str = "\
Example:
If you are going to set the following parameters to test.img and test.xml:
    eth0: MAC address: auto generated
          IP address: 10.7.9.100
          Netmask: 255.255.0.0
    eth1: MAC address: auto generated
          IP address: DHCP
    Default gateway: 10.0.0.1
    Hostname: vm.example.com
    DNS nameservers: 8.8.8.8, 8.8.4.4
    DNS search domains: dept.example.com, example.com
run:
    kvm-image-adjuster --image=./test.img --xml=./test.xml \\
        --interface=eth0/auto/10.7.9.100/255.255.0.0,eth1/auto/dhcp/dhcp \\
        --primary=eth0 --gateway=10.0.0.1 \\
        --hostname=vm.example.com \\
        --nameserver=8.8.8.8,8.8.4.4 \\
        --domain=dept.example.com,example.com";

#[derive(Parser, Debug)]
#[command(name = "kvm-image-adjuster")]
#[command(about = "Adjust a copied KVM guest image and its libvirt domain XML", long_about = None)]
#[command(version, after_help = EXAMPLE)]
pub struct Cli {
    #[arg(long, help = "Path of the image file")]
    image: PathBuf,

    #[arg(long, help = "Path of the libvirt domain XML file")]
    xml: PathBuf,

    #[arg(
        long,
        help = "Interfaces as IFNAME/MAC/IPADDR/NETMASK, comma separated. \
                Use \"auto\" for MAC to generate one and \"dhcp\" for IPADDR"
    )]
    interface: Option<String>,

    #[arg(long, help = "Interface that carries gateway, nameservers and search domains")]
    primary: Option<String>,

    #[arg(long, help = "Default gateway")]
    gateway: Option<String>,

    #[arg(long, help = "DNS nameservers, comma separated")]
    nameserver: Option<String>,

    #[arg(long, help = "DNS search domains, comma separated")]
    domain: Option<String>,

    #[arg(long, help = "Hostname")]
    hostname: Option<String>,

    #[arg(long, help = "Serial console configuration for \"virsh console\"")]
    serial_console: bool,

    #[arg(long, help = "Debug output")]
    debug: bool,

    #[arg(long, env = "IMGADJ_CONFIG", help = "Path to the adjuster configuration file")]
    config: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)),
        )
        .with_target(false)
        .init();

    // Load configuration
    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };

    if let Err(e) = config.and_then(|config| adjust::execute(cli, config)) {
        output::print_error(&e.to_string());
        if e.is_fatal_before_mutation() {
            output::print_info("The image and the XML file were left unchanged");
        }
        std::process::exit(1);
    }
}
