mod descriptor;
mod sync;


pub use descriptor::{DescriptorInfo, inspect_descriptor, interface_macs};
pub use sync::{DescriptorUpdate, SyncReport, rewrite_descriptor, synchronize};

/// Suffix of the pre-edit copy kept next to the descriptor.
pub const BACKUP_SUFFIX: &str = ".orig";
