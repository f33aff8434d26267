use std::cell::RefCell;

use crate::transport::{ClipboardWriter, Egress, TransportError};

/// Records every request instead of sending it.
#[derive(Debug)]
pub struct RecordingEgress {
    beacon_available: bool,
    online: bool,
    beacons: RefCell<Vec<(String, String)>>,
    posts: RefCell<Vec<(String, String)>>,
}

impl Default for RecordingEgress {
    fn default() -> Self {
        Self {
            beacon_available: true,
            online: true,
            beacons: RefCell::default(),
            posts: RefCell::default(),
        }
    }
}

impl RecordingEgress {
    /// A page without `navigator.sendBeacon`.
    pub fn without_beacon() -> Self {
        Self {
            beacon_available: false,
            ..Self::default()
        }
    }

    /// Every request throws.
    pub fn offline() -> Self {
        Self {
            online: false,
            ..Self::default()
        }
    }

    pub fn beacons(&self) -> Vec<(String, String)> {
        self.beacons.borrow().clone()
    }

    pub fn posts(&self) -> Vec<(String, String)> {
        self.posts.borrow().clone()
    }
}

impl Egress for RecordingEgress {
    fn beacon(&self, url: &str, body: &str) -> Result<(), TransportError> {
        if !self.beacon_available {
            return Err(TransportError::Unavailable("sendBeacon"));
        }
        if !self.online {
            return Err(TransportError::Failed("network unreachable".into()));
        }
        self.beacons.borrow_mut().push((url.into(), body.into()));
        Ok(())
    }

    fn post(&self, url: &str, body: &str) -> Result<(), TransportError> {
        if !self.online {
            return Err(TransportError::Failed("network unreachable".into()));
        }
        self.posts.borrow_mut().push((url.into(), body.into()));
        Ok(())
    }
}

/// Records clipboard writes.
#[derive(Debug)]
pub struct RecordingClipboard {
    async_available: bool,
    legacy_works: bool,
    async_writes: RefCell<Vec<String>>,
    legacy_copies: RefCell<Vec<String>>,
}

impl Default for RecordingClipboard {
    fn default() -> Self {
        Self {
            async_available: true,
            legacy_works: true,
            async_writes: RefCell::default(),
            legacy_copies: RefCell::default(),
        }
    }
}

impl RecordingClipboard {
    /// A page without `navigator.clipboard`, e.g. an insecure context.
    pub fn without_async() -> Self {
        Self {
            async_available: false,
            ..Self::default()
        }
    }

    /// Neither clipboard path works.
    pub fn broken() -> Self {
        Self {
            async_available: false,
            legacy_works: false,
            ..Self::default()
        }
    }

    pub fn async_writes(&self) -> Vec<String> {
        self.async_writes.borrow().clone()
    }

    pub fn legacy_copies(&self) -> Vec<String> {
        self.legacy_copies.borrow().clone()
    }
}

impl ClipboardWriter for RecordingClipboard {
    fn write_async(&self, text: &str) -> Result<(), TransportError> {
        if !self.async_available {
            return Err(TransportError::Unavailable("navigator.clipboard"));
        }
        self.async_writes.borrow_mut().push(text.into());
        Ok(())
    }

    fn copy_legacy(&self, text: &str) -> Result<(), TransportError> {
        if !self.legacy_works {
            return Err(TransportError::Failed("execCommand('copy') returned false".into()));
        }
        self.legacy_copies.borrow_mut().push(text.into());
        Ok(())
    }
}
