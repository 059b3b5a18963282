use imgadj_core::{AdjusterError, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::path::Path;

/// Values the synchronizer reads from a domain descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DescriptorInfo {
    pub name: Option<String>,
    pub uuid: Option<String>,
    /// `source/@file` of the first file-backed disk.
    pub disk_source: Option<String>,
    pub has_file_disk: bool,
    /// `devices/interface/mac/@address`, in document order.
    pub macs: Vec<String>,
}

pub(crate) fn element_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.name().as_ref()).to_string()
}

pub(crate) fn attribute(e: &BytesStart, key: &str) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key.as_bytes())
        .map(|attr| {
            attr.unescape_value()
                .map(|v| v.to_string())
                .unwrap_or_else(|_| String::from_utf8_lossy(&attr.value).to_string())
        })
}

pub(crate) fn is_file_disk(e: &BytesStart) -> bool {
    attribute(e, "type").as_deref() == Some("file")
        && attribute(e, "device").as_deref() == Some("disk")
}

pub(crate) fn xml_error(e: impl std::fmt::Display) -> AdjusterError {
    AdjusterError::Descriptor(format!("XML parse error: {e}"))
}

/// Reads name, UUID, disk source and interface MACs from descriptor text.
pub fn inspect_descriptor(xml: &str) -> Result<DescriptorInfo> {
    let mut info = DescriptorInfo::default();
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    // Inside the first file-backed disk.
    let mut in_file_disk = false;
    let mut seen_root = false;

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = element_name(e);
                let path = stack.join("/");
                match (path.as_str(), name.as_str()) {
                    ("", "domain") => seen_root = true,
                    ("domain/devices", "disk") if !info.has_file_disk && is_file_disk(e) => {
                        info.has_file_disk = true;
                        in_file_disk = true;
                    }
                    ("domain/devices/disk", "source") if in_file_disk => {
                        info.disk_source = attribute(e, "file");
                    }
                    ("domain/devices/interface", "mac") => {
                        if let Some(address) = attribute(e, "address") {
                            info.macs.push(address);
                        }
                    }
                    _ => {}
                }
                if matches!(event, Event::Start(_)) {
                    stack.push(name);
                } else if name == "disk" {
                    in_file_disk = false;
                }
            }
            Event::Text(ref e) => {
                let text = e.unescape().map_err(xml_error)?.to_string();
                match stack.join("/").as_str() {
                    "domain/name" => info.name = Some(text),
                    "domain/uuid" => info.uuid = Some(text),
                    _ => {}
                }
            }
            Event::End(_) => {
                if stack.pop().as_deref() == Some("disk") {
                    in_file_disk = false;
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !seen_root {
        return Err(AdjusterError::Descriptor(
            "no <domain> root element".to_string(),
        ));
    }
    Ok(info)
}

/// MAC addresses of the descriptor's interfaces, in document order.
pub fn interface_macs(path: &Path) -> Result<Vec<String>> {
    let xml = std::fs::read_to_string(path)?;
    Ok(inspect_descriptor(&xml)?.macs)
}
