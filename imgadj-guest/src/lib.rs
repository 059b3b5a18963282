pub mod backup;
pub mod guestfish;
pub mod inspect;
pub mod memory;
pub mod tree;


use imgadj_core::Result;

pub use backup::{move_aside, preserve_original, write_preserving};
pub use guestfish::GuestfishSession;
pub use inspect::{close_image, open_image, print_inventory};
pub use memory::MemoryGuest;

/// Flag passed to `aug_init`: keep the original file as `<file>.augsave` on save.
pub const AUG_SAVE_BACKUP: u32 = 1;

/// Suffix the configuration tree gives backups of files it rewrites.
pub const AUGSAVE_SUFFIX: &str = ".augsave";

/// Prefix of every tree path that maps onto a file.
pub const FILES_ROOT: &str = "/files";

/// One open guest image.
///
/// All access to the image goes through a single session. Tree writes are
/// buffered until `aug_save`; reads of a path are only trustworthy after the
/// writes touching it have been saved.
pub trait GuestSession {
    // inspection
    fn inspect_os(&mut self) -> Result<Vec<String>>;
    fn inspect_get(&mut self, root: &str, field: InspectField) -> Result<String>;
    fn inspect_get_mountpoints(&mut self, root: &str) -> Result<Vec<(String, String)>>;
    fn mount(&mut self, device: &str, mountpoint: &str) -> Result<()>;
    fn inventory(&mut self) -> Result<Vec<(String, Vec<String>)>>;

    // configuration tree
    fn aug_init(&mut self, root: &str, flags: u32) -> Result<()>;
    fn aug_match(&mut self, path: &str) -> Result<Vec<String>>;
    /// `None` when the path matches nothing or the node has no value.
    fn aug_get(&mut self, path: &str) -> Result<Option<String>>;
    fn aug_set(&mut self, path: &str, value: &str) -> Result<()>;
    fn aug_insert(&mut self, path: &str, label: &str, before: bool) -> Result<()>;
    fn aug_rm(&mut self, path: &str) -> Result<usize>;
    fn aug_clear(&mut self, path: &str) -> Result<()>;
    fn aug_save(&mut self) -> Result<()>;
    fn aug_close(&mut self) -> Result<()>;

    // files
    fn exists(&mut self, path: &str) -> Result<bool>;
    fn is_file(&mut self, path: &str) -> Result<bool>;
    fn read_file(&mut self, path: &str) -> Result<String>;
    fn write_file(&mut self, path: &str, content: &str) -> Result<()>;
    /// Copy preserving attributes (`cp -a`).
    fn copy(&mut self, src: &str, dest: &str) -> Result<()>;
    fn rename(&mut self, src: &str, dest: &str) -> Result<()>;

    /// Runs a command line inside the guest's root. Reserved for the few
    /// operations with no in-process equivalent (label repair, bootloader
    /// regeneration, policy load).
    fn sh(&mut self, command: &str) -> Result<String>;

    fn sync(&mut self) -> Result<()>;
    fn umount_all(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InspectField {
    Type,
    Distro,
    ProductName,
    MajorVersion,
    MinorVersion,
    Hostname,
}

impl InspectField {
    pub fn command(&self) -> &'static str {
        match self {
            InspectField::Type => "inspect-get-type",
            InspectField::Distro => "inspect-get-distro",
            InspectField::ProductName => "inspect-get-product-name",
            InspectField::MajorVersion => "inspect-get-major-version",
            InspectField::MinorVersion => "inspect-get-minor-version",
            InspectField::Hostname => "inspect-get-hostname",
        }
    }
}

/// Tree path of a guest file, e.g. `/etc/hosts` → `/files/etc/hosts`.
pub fn file_path(path: &str) -> String {
    format!("{FILES_ROOT}{path}")
}

/// Guest file a tree path lives in, e.g. `/files/etc/hosts/1` → `/etc/hosts/1`.
pub fn strip_files_root(tree_path: &str) -> &str {
    tree_path.strip_prefix(FILES_ROOT).unwrap_or(tree_path)
}
