//! Connectivity tracking.

use std::sync::atomic::{AtomicBool, Ordering};

use crate::types::ConnectivityState;

/// Process-wide online/offline flag.
///
/// Starts online; the write path flips it offline on network failure and
/// `SyncEngine::handle_online` flips it back.
#[derive(Debug)]
pub struct Connectivity {
    online: AtomicBool,
}

impl Connectivity {
    pub fn new() -> Self {
        Self {
            online: AtomicBool::new(true),
        }
    }

    pub fn state(&self) -> ConnectivityState {
        if self.is_online() {
            ConnectivityState::Online
        } else {
            ConnectivityState::Offline
        }
    }

    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    pub fn is_offline(&self) -> bool {
        !self.is_online()
    }

    pub fn set_online(&self) {
        self.online.store(true, Ordering::SeqCst);
    }

    pub fn set_offline(&self) {
        self.online.store(false, Ordering::SeqCst);
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}
