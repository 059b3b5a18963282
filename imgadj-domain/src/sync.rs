use crate::BACKUP_SUFFIX;
use crate::descriptor::{
    DescriptorInfo, attribute, element_name, inspect_descriptor, is_file_disk, xml_error,
};
use imgadj_core::{AdjusterError, Result};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// New values written into a domain descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DescriptorUpdate {
    pub name: String,
    pub disk_source: String,
    pub uuid: String,
    /// Index-aligned with the descriptor's interface MACs; `None` leaves one as is.
    pub macs: Vec<Option<String>>,
}

/// What [`synchronize`] changed, as before/after lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub backup: PathBuf,
    pub before: DescriptorInfo,
    pub lines: Vec<String>,
}

fn with_attribute(e: &BytesStart, key: &str, value: &str) -> BytesStart<'static> {
    let name = element_name(e);
    let mut out = BytesStart::new(name);
    let mut replaced = false;
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key.as_bytes() {
            out.push_attribute((key, value));
            replaced = true;
        } else {
            out.push_attribute(attr);
        }
    }
    if !replaced {
        out.push_attribute((key, value));
    }
    out.into_owned()
}

fn write<'a>(writer: &mut Writer<Vec<u8>>, event: impl Into<Event<'a>>) -> Result<()> {
    writer
        .write_event(event)
        .map_err(|e| AdjusterError::Descriptor(format!("XML write error: {e}")))
}

fn write_text_element(writer: &mut Writer<Vec<u8>>, name: &str, text: &str) -> Result<()> {
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::new(text)))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

/// Applies `update` to descriptor text; everything else passes through unchanged.
///
/// A descriptor without a `<uuid>` gets one right after `<name>`.
pub fn rewrite_descriptor(xml: &str, update: &DescriptorUpdate) -> Result<String> {
    let before = inspect_descriptor(xml)?;
    if before.name.is_none() {
        return Err(AdjusterError::Descriptor("no <name> element".to_string()));
    }
    if !before.has_file_disk {
        return Err(AdjusterError::Descriptor(
            "no file-backed <disk device='disk'>".to_string(),
        ));
    }

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(false);
    let mut writer = Writer::new(Vec::new());

    let mut stack: Vec<String> = Vec::new();
    let mut replacing_text = false;
    let mut in_file_disk = false;
    let mut disk_done = false;
    let mut mac_index = 0;

    loop {
        let event = reader.read_event().map_err(xml_error)?;
        match event {
            Event::Start(ref e) | Event::Empty(ref e) => {
                let name = element_name(e);
                let empty = matches!(event, Event::Empty(_));
                let path = stack.join("/");

                match (path.as_str(), name.as_str()) {
                    ("domain", "name") | ("domain", "uuid") => {
                        let text = if name == "name" { &update.name } else { &update.uuid };
                        if empty {
                            write_text_element(&mut writer, &name, text)?;
                            if name == "name" && before.uuid.is_none() {
                                write_text_element(&mut writer, "uuid", &update.uuid)?;
                            }
                        } else {
                            write(&mut writer, Event::Start(e.to_owned()))?;
                            write(&mut writer, Event::Text(BytesText::new(text)))?;
                            replacing_text = true;
                            stack.push(name);
                        }
                        continue;
                    }
                    ("domain/devices", "disk") if !disk_done && is_file_disk(e) => {
                        in_file_disk = !empty;
                        disk_done = true;
                    }
                    ("domain/devices/disk", "source") if in_file_disk => {
                        let source = with_attribute(e, "file", &update.disk_source);
                        write(
                            &mut writer,
                            if empty { Event::Empty(source) } else { Event::Start(source) },
                        )?;
                        if !empty {
                            stack.push(name);
                        }
                        continue;
                    }
                    // Counted like `inspect_descriptor` counts them: addressed MACs only.
                    ("domain/devices/interface", "mac") if attribute(e, "address").is_some() => {
                        let new_mac = update.macs.get(mac_index).cloned().flatten();
                        mac_index += 1;
                        if let Some(mac) = new_mac.filter(|m| !m.is_empty()) {
                            let replaced = with_attribute(e, "address", &mac);
                            write(
                                &mut writer,
                                if empty { Event::Empty(replaced) } else { Event::Start(replaced) },
                            )?;
                            if !empty {
                                stack.push(name);
                            }
                            continue;
                        }
                    }
                    _ => {}
                }

                write(&mut writer, event.borrow())?;
                if !empty {
                    stack.push(name);
                }
            }
            Event::End(ref e) => {
                let name = stack.pop().unwrap_or_default();
                if name == "disk" {
                    in_file_disk = false;
                }
                replacing_text = false;
                write(&mut writer, Event::End(e.to_owned()))?;
                if name == "name" && stack.join("/") == "domain" && before.uuid.is_none() {
                    write_text_element(&mut writer, "uuid", &update.uuid)?;
                }
            }
            Event::Text(_) | Event::CData(_) if replacing_text => {}
            Event::Eof => break,
            other => write(&mut writer, other)?,
        }
    }

    String::from_utf8(writer.into_inner())
        .map_err(|e| AdjusterError::Descriptor(format!("descriptor is not UTF-8: {e}")))
}

/// Rewrites the descriptor at `xml_path` for a copied image.
///
/// The domain name becomes the descriptor's file stem and the disk source the
/// absolute path of `image`. The new document is built before anything on
/// disk changes; then the original is moved to `<xml_path>.orig` and the
/// result written at `xml_path`.
pub fn synchronize(
    xml_path: &Path,
    image: &Path,
    uuid: &str,
    macs: &[Option<String>],
) -> Result<SyncReport> {
    info!("XML configuration of libvirt ({})", xml_path.display());

    let xml = fs::read_to_string(xml_path)?;
    let name = xml_path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .ok_or_else(|| {
            AdjusterError::Descriptor(format!("no file name in {}", xml_path.display()))
        })?;
    let disk_source = std::path::absolute(image)?.to_string_lossy().to_string();

    let update = DescriptorUpdate {
        name,
        disk_source,
        uuid: uuid.to_string(),
        macs: macs.to_vec(),
    };
    let before = inspect_descriptor(&xml)?;
    let rewritten = rewrite_descriptor(&xml, &update)?;

    let new_macs: Vec<String> = before
        .macs
        .iter()
        .enumerate()
        .map(|(i, old)| match update.macs.get(i).cloned().flatten() {
            Some(new) if !new.is_empty() => new,
            _ => old.clone(),
        })
        .collect();
    let lines = vec![
        format!(
            "name: {} => {}",
            before.name.as_deref().unwrap_or("-"),
            update.name
        ),
        format!(
            "imgpath: {} => {}",
            before.disk_source.as_deref().unwrap_or("-"),
            update.disk_source
        ),
        format!(
            "uuid: {} => {}",
            before.uuid.as_deref().unwrap_or("-"),
            update.uuid
        ),
        format!("macs: {:?} => {:?}", before.macs, new_macs),
    ];
    for line in &lines {
        info!("  {}", line);
    }

    let mut backup = xml_path.as_os_str().to_owned();
    backup.push(BACKUP_SUFFIX);
    let backup = PathBuf::from(backup);
    debug!("moving {} to {}", xml_path.display(), backup.display());
    fs::rename(xml_path, &backup)?;
    fs::write(xml_path, rewritten)?;

    Ok(SyncReport {
        backup,
        before,
        lines,
    })
}
