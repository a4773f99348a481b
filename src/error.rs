//! Error types for the MMU simulator.

use std::io;

use thiserror::Error;

use crate::constants::{NUM_FRAMES, NUM_PAGES, PAGE_SIZE, VA_SPACE};

/// Result type alias for MMU operations
pub type Result<T> = std::result::Result<T, MmuError>;

/// Backing store operation that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Create,
    Seek,
    Read,
    Write,
    Sync,
}

impl std::fmt::Display for StoreOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            StoreOp::Create => "create",
            StoreOp::Seek => "seek",
            StoreOp::Read => "read",
            StoreOp::Write => "write",
            StoreOp::Sync => "sync",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum MmuError {
    #[error("page number {0} out of range (max {max})", max = NUM_PAGES - 1)]
    PageOutOfRange(u32),

    #[error("frame number {0} out of range (max {max})", max = NUM_FRAMES - 1)]
    FrameOutOfRange(u32),

    #[error("offset {0} out of range (page size {size})", size = PAGE_SIZE)]
    OffsetOutOfRange(u32),

    /// A multi-byte access would run past the top of the address space
    #[error("access of {len} bytes at {start:#07x} runs past end of address space ({end:#x})", end = VA_SPACE)]
    AddressOutOfRange { start: u32, len: usize },

    /// Backing store unavailable
    #[error("backing store {op} failed for page {page:?}: {source}")]
    BackingStore {
        op: StoreOp,
        page: Option<u8>,
        #[source]
        source: io::Error,
    },

    #[error("page {0} has no frame assigned")]
    NotMapped(u8),

    #[error("frame {frame} is held by page {owner}, cannot load page {page}")]
    FrameOccupied { frame: u8, owner: u8, page: u8 },

    /// No resident page to evict. The frame table and page table disagree.
    #[error("no eviction candidate while resolving page {requested}")]
    NoVictim { requested: u8 },

    #[error("parse error: {0}")]
    Parse(String),

    /// Command input or output stream failed
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl MmuError {
    pub(crate) fn store(op: StoreOp, page: Option<u8>, source: io::Error) -> Self {
        MmuError::BackingStore { op, page, source }
    }

    /// True for errors caused by the caller passing bad arguments.
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            MmuError::PageOutOfRange(_)
                | MmuError::FrameOutOfRange(_)
                | MmuError::OffsetOutOfRange(_)
                | MmuError::AddressOutOfRange { .. }
                | MmuError::Parse(_)
        )
    }
}
