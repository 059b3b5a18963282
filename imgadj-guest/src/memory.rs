//! Guest session held entirely in memory, for tests and dry runs.

use crate::tree::ConfigTree;
use crate::{AUGSAVE_SUFFIX, GuestSession, InspectField, file_path};
use imgadj_core::{AdjusterError, OsInfo, Result};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Files the tree parses, whether or not they exist yet.
const LENS_FILES: &[&str] = &[
    "/boot/grub/menu.lst",
    "/etc/inittab",
    "/etc/network/interfaces",
    "/etc/resolv.conf",
    "/etc/sysconfig/network",
];

/// Directories whose every entry the tree parses.
const LENS_DIRS: &[&str] = &["/etc/sysconfig/network-scripts"];

pub struct MemoryGuest {
    os: OsInfo,
    mountpoints: Vec<(String, String)>,
    failing_devices: BTreeSet<String>,
    mounted: Vec<(String, String)>,
    files: BTreeMap<String, String>,
    tree: ConfigTree,
    lens_files: BTreeSet<String>,
    lens_dirs: BTreeSet<String>,
    dirty: BTreeSet<String>,
    saves: usize,
    fail_on_save: Option<usize>,
    aug_open: bool,
    commands: Vec<String>,
    unmounted: bool,
}

impl MemoryGuest {
    pub fn new(os: OsInfo) -> Self {
        Self {
            os,
            mountpoints: vec![("/".to_string(), "/dev/sda1".to_string())],
            failing_devices: BTreeSet::new(),
            mounted: Vec::new(),
            files: BTreeMap::new(),
            tree: ConfigTree::new(),
            lens_files: LENS_FILES.iter().map(|f| f.to_string()).collect(),
            lens_dirs: LENS_DIRS.iter().map(|d| d.to_string()).collect(),
            dirty: BTreeSet::new(),
            saves: 0,
            fail_on_save: None,
            aug_open: false,
            commands: Vec::new(),
            unmounted: false,
        }
    }

    pub fn with_mountpoints(mut self, mountpoints: &[(&str, &str)]) -> Self {
        self.mountpoints = mountpoints
            .iter()
            .map(|(mp, dev)| (mp.to_string(), dev.to_string()))
            .collect();
        self
    }

    pub fn with_failing_device(mut self, device: &str) -> Self {
        self.failing_devices.insert(device.to_string());
        self
    }

    /// Makes the `nth` tree save (1-based) fail without writing anything.
    pub fn with_failing_save(mut self, nth: usize) -> Self {
        self.fail_on_save = Some(nth);
        self
    }

    pub fn with_file(mut self, path: &str, content: &str) -> Self {
        self.files.insert(path.to_string(), content.to_string());
        self
    }

    /// Registers a file the tree parses, with its text and its parsed entries.
    ///
    /// Entry paths are relative to the file's tree node, e.g. `HWADDR` or
    /// `iface[1]/method`.
    pub fn with_tree_file(
        mut self,
        path: &str,
        content: &str,
        entries: &[(&str, &str)],
    ) -> Result<Self> {
        self.files.insert(path.to_string(), content.to_string());
        self.lens_files.insert(path.to_string());
        let base = file_path(path);
        for (rel, value) in entries {
            let node = if rel.is_empty() {
                base.clone()
            } else {
                format!("{base}/{rel}")
            };
            self.tree.set(&node, Some(value))?;
        }
        Ok(self)
    }

    pub fn file(&self, path: &str) -> Option<&str> {
        self.files.get(path).map(String::as_str)
    }

    pub fn file_names(&self) -> Vec<String> {
        self.files.keys().cloned().collect()
    }

    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn mounted(&self) -> &[(String, String)] {
        &self.mounted
    }

    pub fn saves(&self) -> usize {
        self.saves
    }

    pub fn is_unmounted(&self) -> bool {
        self.unmounted
    }

    /// Direct tree read without going through the session contract.
    pub fn tree_value(&self, path: &str) -> Option<String> {
        self.tree.get(path).ok().flatten()
    }

    pub fn tree_matches(&self, path: &str) -> Vec<String> {
        self.tree.matches(path).unwrap_or_default()
    }

    /// Guest file a tree path belongs to, if a lens covers it.
    fn owner(&self, tree_path: &str) -> Option<String> {
        let rest = tree_path.strip_prefix(crate::FILES_ROOT)?;
        if let Some(file) = self
            .lens_files
            .iter()
            .find(|f| rest == f.as_str() || rest.starts_with(&format!("{f}/")))
        {
            return Some(file.clone());
        }
        self.lens_dirs.iter().find_map(|dir| {
            let name = rest.strip_prefix(&format!("{dir}/"))?.split('/').next()?;
            let name = name.split('[').next()?;
            Some(format!("{dir}/{name}"))
        })
    }

    fn touch(&mut self, tree_path: &str) {
        if let Some(file) = self.owner(tree_path) {
            self.dirty.insert(file);
        }
    }

    fn require_aug(&self, operation: &str) -> Result<()> {
        if self.aug_open {
            Ok(())
        } else {
            Err(AdjusterError::guest(operation, "configuration tree not initialised"))
        }
    }

    fn require_file(&self, path: &str, operation: &str) -> Result<()> {
        if self.files.contains_key(path) {
            Ok(())
        } else {
            Err(AdjusterError::guest(
                operation,
                format!("{path}: No such file or directory"),
            ))
        }
    }
}

impl GuestSession for MemoryGuest {
    fn inspect_os(&mut self) -> Result<Vec<String>> {
        Ok(vec!["/dev/sda1".to_string()])
    }

    fn inspect_get(&mut self, _root: &str, field: InspectField) -> Result<String> {
        Ok(match field {
            InspectField::Type => self.os.os_type.clone(),
            InspectField::Distro => self.os.distro.clone(),
            InspectField::ProductName => self.os.product_name.clone(),
            InspectField::MajorVersion => self.os.major.to_string(),
            InspectField::MinorVersion => self.os.minor.to_string(),
            InspectField::Hostname => self.os.hostname.clone(),
        })
    }

    fn inspect_get_mountpoints(&mut self, _root: &str) -> Result<Vec<(String, String)>> {
        Ok(self.mountpoints.clone())
    }

    fn mount(&mut self, device: &str, mountpoint: &str) -> Result<()> {
        if self.failing_devices.contains(device) {
            return Err(AdjusterError::guest(
                "mount",
                format!("{device} on {mountpoint}: wrong fs type"),
            ));
        }
        self.mounted
            .push((mountpoint.to_string(), device.to_string()));
        Ok(())
    }

    fn inventory(&mut self) -> Result<Vec<(String, Vec<String>)>> {
        let devices: Vec<String> = self.mountpoints.iter().map(|(_, d)| d.clone()).collect();
        Ok(vec![
            ("partitions".to_string(), devices.clone()),
            ("devices".to_string(), vec!["/dev/sda".to_string()]),
            ("filesystems".to_string(), devices),
            ("mounts".to_string(), self.mounted.iter().map(|(mp, _)| mp.clone()).collect()),
        ])
    }

    fn aug_init(&mut self, root: &str, flags: u32) -> Result<()> {
        debug!("aug-init {} {}", root, flags);
        self.aug_open = true;
        Ok(())
    }

    fn aug_match(&mut self, path: &str) -> Result<Vec<String>> {
        self.require_aug("aug-match")?;
        self.tree.matches(path)
    }

    fn aug_get(&mut self, path: &str) -> Result<Option<String>> {
        self.require_aug("aug-get")?;
        self.tree.get(path)
    }

    fn aug_set(&mut self, path: &str, value: &str) -> Result<()> {
        self.require_aug("aug-set")?;
        self.tree.set(path, Some(value))?;
        self.touch(path);
        Ok(())
    }

    fn aug_insert(&mut self, path: &str, label: &str, before: bool) -> Result<()> {
        self.require_aug("aug-insert")?;
        self.tree.insert(path, label, before)?;
        self.touch(path);
        Ok(())
    }

    fn aug_rm(&mut self, path: &str) -> Result<usize> {
        self.require_aug("aug-rm")?;
        let removed = self.tree.remove(path)?;
        if removed > 0 {
            self.touch(path);
        }
        Ok(removed)
    }

    fn aug_clear(&mut self, path: &str) -> Result<()> {
        self.require_aug("aug-clear")?;
        self.tree.set(path, None)?;
        self.touch(path);
        Ok(())
    }

    /// Backs up each changed file that existed before as `<file>.augsave`;
    /// files that did not exist are created. The first backup is never
    /// overwritten, so it holds the text the file had before the run.
    fn aug_save(&mut self) -> Result<()> {
        self.require_aug("aug-save")?;
        if self.fail_on_save == Some(self.saves + 1) {
            return Err(AdjusterError::guest("aug-save", "No space left on device"));
        }
        let dirty = std::mem::take(&mut self.dirty);
        for file in dirty {
            let backup = format!("{file}{AUGSAVE_SUFFIX}");
            match self.files.get(&file).cloned() {
                Some(original) => {
                    self.files.entry(backup).or_insert(original);
                }
                None => {
                    self.files.insert(file, String::new());
                }
            }
        }
        self.saves += 1;
        Ok(())
    }

    fn aug_close(&mut self) -> Result<()> {
        self.aug_open = false;
        Ok(())
    }

    fn exists(&mut self, path: &str) -> Result<bool> {
        let dir = format!("{}/", path.trim_end_matches('/'));
        Ok(self.files.contains_key(path) || self.files.keys().any(|f| f.starts_with(&dir)))
    }

    fn is_file(&mut self, path: &str) -> Result<bool> {
        Ok(self.files.contains_key(path))
    }

    fn read_file(&mut self, path: &str) -> Result<String> {
        self.require_file(path, "cat")?;
        Ok(self.files[path].clone())
    }

    fn write_file(&mut self, path: &str, content: &str) -> Result<()> {
        self.files.insert(path.to_string(), content.to_string());
        Ok(())
    }

    fn copy(&mut self, src: &str, dest: &str) -> Result<()> {
        self.require_file(src, "cp-a")?;
        let content = self.files[src].clone();
        self.files.insert(dest.to_string(), content);
        Ok(())
    }

    fn rename(&mut self, src: &str, dest: &str) -> Result<()> {
        self.require_file(src, "mv")?;
        if let Some(content) = self.files.remove(src) {
            self.files.insert(dest.to_string(), content);
        }
        Ok(())
    }

    fn sh(&mut self, command: &str) -> Result<String> {
        debug!("sh: {}", command);
        self.commands.push(command.to_string());
        Ok(String::new())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn umount_all(&mut self) -> Result<()> {
        self.mounted.clear();
        self.unmounted = true;
        Ok(())
    }
}
