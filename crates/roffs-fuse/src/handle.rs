//! Open file handles.
//!
//! A file is read once, on `open`, and every `read` on that handle is
//! answered from the same buffer until `release`. Large files are not
//! re-read per chunk, and a file rewritten mid-read does not come back
//! with mixed content.

use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug)]
pub struct HandleTable {
    open: HashMap<u64, Arc<Vec<u8>>>,
    next: u64,
}

impl Default for HandleTable {
    fn default() -> Self {
        Self::new()
    }
}

impl HandleTable {
    pub fn new() -> Self {
        Self {
            open: HashMap::new(),
            // fh 0 is what opendir hands out; keep file handles distinct.
            next: 1,
        }
    }

    /// Store `data` under a fresh handle.
    pub fn insert(&mut self, data: Vec<u8>) -> u64 {
        let fh = self.next;
        self.next += 1;
        self.open.insert(fh, Arc::new(data));
        fh
    }

    pub fn get(&self, fh: u64) -> Option<Arc<Vec<u8>>> {
        self.open.get(&fh).cloned()
    }

    /// Drop a handle. Returns false if it was not open.
    pub fn release(&mut self, fh: u64) -> bool {
        self.open.remove(&fh).is_some()
    }

    pub fn len(&self) -> usize {
        self.open.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open.is_empty()
    }
}
