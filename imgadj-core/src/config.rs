use crate::types::{OsFamily, OsInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: String,
    /// First three octets of every generated MAC.
    pub mac_prefix: String,
    pub serial: SerialConfig,
    pub selinux_net_label: String,
    pub udev_net_rules: String,
    pub guestfish: PathBuf,
    pub supported: Vec<SupportedRelease>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub device: String,
    pub speed: u32,
    pub unit: u32,
    pub word: u32,
    pub parity: String,
    pub stop: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportedRelease {
    pub distro: String,
    pub major: u32,
    pub family: OsFamily,
}

impl SerialConfig {
    /// Kernel console argument, e.g. `ttyS0,115200n8`.
    pub fn console_arg(&self) -> String {
        let parity = match self.parity.as_str() {
            "odd" => 'o',
            "even" => 'e',
            _ => 'n',
        };
        format!("{},{}{}{}", self.device, self.speed, parity, self.word)
    }

    /// Bootloader `serial` command line.
    pub fn serial_command(&self) -> String {
        format!(
            "serial --speed={} --unit={} --word={} --parity={} --stop={}",
            self.speed, self.unit, self.word, self.parity, self.stop
        )
    }
}

impl Config {
    pub fn load() -> crate::Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    pub fn load_from(config_path: &Path) -> crate::Result<Self> {
        if config_path.exists() {
            let content = std::fs::read_to_string(config_path)?;
            let config: Config = serde_yaml::from_str(&content)
                .map_err(|e| crate::AdjusterError::ConfigError(e.to_string()))?;
            config.validate()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn state_dir() -> crate::Result<PathBuf> {
        let home = dirs::home_dir().ok_or_else(|| {
            crate::AdjusterError::ConfigError("Cannot determine home directory".to_string())
        })?;
        Ok(home.join(".imgadj"))
    }

    fn config_path() -> crate::Result<PathBuf> {
        Ok(Self::state_dir()?.join("config.yaml"))
    }

    fn validate(&self) -> crate::Result<()> {
        let octets: Vec<&str> = self.mac_prefix.split(':').collect();
        let well_formed = octets.len() == 3
            && octets
                .iter()
                .all(|o| o.len() == 2 && u8::from_str_radix(o, 16).is_ok());
        if !well_formed {
            return Err(crate::AdjusterError::ConfigError(format!(
                "mac_prefix must be three hex octets, got '{}'",
                self.mac_prefix
            )));
        }
        Ok(())
    }

    /// Which adapter family handles this guest, if any.
    pub fn family_for(&self, os: &OsInfo) -> Option<OsFamily> {
        if os.os_type != "linux" {
            return None;
        }
        self.supported
            .iter()
            .find(|release| release.distro == os.distro && release.major == os.major)
            .map(|release| release.family)
    }
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "ttyS0".to_string(),
            speed: 115200,
            unit: 0,
            word: 8,
            parity: "no".to_string(),
            stop: 1,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            mac_prefix: "52:54:00".to_string(),
            serial: SerialConfig::default(),
            selinux_net_label: "net_conf_t".to_string(),
            udev_net_rules: "/etc/udev/rules.d/70-persistent-net.rules".to_string(),
            guestfish: PathBuf::from("guestfish"),
            supported: vec![
                SupportedRelease {
                    distro: "rhel".to_string(),
                    major: 6,
                    family: OsFamily::Rhel,
                },
                SupportedRelease {
                    distro: "centos".to_string(),
                    major: 6,
                    family: OsFamily::Rhel,
                },
                SupportedRelease {
                    distro: "ubuntu".to_string(),
                    major: 12,
                    family: OsFamily::Ubuntu,
                },
            ],
        }
    }
}
