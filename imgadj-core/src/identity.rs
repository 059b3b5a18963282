use rand::Rng;
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// A random MAC under `prefix` (three colon-separated octets), lower-case.
pub fn new_mac(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let suffix: [u8; 3] = rng.r#gen();
    format!(
        "{}:{:02x}:{:02x}:{:02x}",
        prefix.to_lowercase(),
        suffix[0],
        suffix[1],
        suffix[2]
    )
}

/// A random version 4 UUID in hyphenated form.
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// Hands out MAC addresses that are unique within one run.
///
/// Every address the descriptor already declares is reserved up front, so a
/// generated address never collides with a pre-existing one.
pub struct MacAllocator {
    prefix: String,
    taken: HashSet<String>,
}

impl MacAllocator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            taken: HashSet::new(),
        }
    }

    pub fn reserve(&mut self, mac: &str) {
        self.taken.insert(mac.to_lowercase());
    }

    /// Takes an explicitly requested address. Returns it lower-cased.
    pub fn claim(&mut self, mac: &str) -> String {
        let mac = mac.to_lowercase();
        if !self.taken.insert(mac.clone()) {
            warn!("Requested MAC {} is already in use in this run", mac);
        }
        mac
    }

    pub fn generate(&mut self) -> String {
        loop {
            let mac = new_mac(&self.prefix);
            if self.taken.insert(mac.clone()) {
                debug!("Generated MAC {}", mac);
                return mac;
            }
            debug!("Generated MAC {} collides, retrying", mac);
        }
    }
}
