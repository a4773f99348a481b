use crate::constants::*;
use crate::error::{MmuError, Result};

/// Per-page metadata
///
/// `frame_number` is only meaningful once `mapped` is set. A page keeps its
/// frame assignment after eviction, so `present` is the only residency test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PageTableEntry {
    pub frame_number: u8,
    pub present: bool,
    pub mapped: bool,
    pub dirty: bool,
    pub referenced: bool,
    pub age: u8,
}

impl PageTableEntry {
    /// Cleared entry: unmapped, not present, all bits zero
    pub const EMPTY: PageTableEntry = PageTableEntry {
        frame_number: 0,
        present: false,
        mapped: false,
        dirty: false,
        referenced: false,
        age: 0,
    };

    /// Make a fresh entry pointing at `frame`
    pub fn new(frame: u8) -> Result<Self> {
        if frame as usize >= NUM_FRAMES {
            return Err(MmuError::FrameOutOfRange(frame as u32));
        }
        Ok(PageTableEntry {
            frame_number: frame,
            mapped: true,
            ..Self::EMPTY
        })
    }
}

/// Single-level page table, one entry per virtual page
pub struct PageTable {
    entries: Box<[PageTableEntry; NUM_PAGES]>,
}

impl PageTable {
    pub fn new() -> Self {
        PageTable {
            entries: Box::new([PageTableEntry::EMPTY; NUM_PAGES]),
        }
    }

    /// Snapshot of the entry for `page`
    #[inline]
    pub fn get(&self, page: u8) -> PageTableEntry {
        self.entries[page as usize]
    }

    /// Install an entry. The entry is always recorded as mapped.
    pub fn set(&mut self, page: u8, pte: PageTableEntry) -> Result<()> {
        if pte.frame_number as usize >= NUM_FRAMES {
            return Err(MmuError::FrameOutOfRange(pte.frame_number as u32));
        }
        self.entries[page as usize] = PageTableEntry { mapped: true, ..pte };
        Ok(())
    }

    /// Reset the entry to its zero state, returning the old value
    pub fn clear(&mut self, page: u8) -> PageTableEntry {
        std::mem::replace(&mut self.entries[page as usize], PageTableEntry::EMPTY)
    }

    #[inline]
    pub fn is_unmapped(&self, page: u8) -> bool {
        !self.entries[page as usize].mapped
    }

    #[inline]
    pub fn is_present(&self, page: u8) -> bool {
        self.entries[page as usize].present
    }

    #[inline]
    pub fn is_dirty(&self, page: u8) -> bool {
        self.entries[page as usize].dirty
    }

    #[inline]
    pub fn is_referenced(&self, page: u8) -> bool {
        self.entries[page as usize].referenced
    }

    pub fn mark_dirty(&mut self, page: u8) {
        self.entries[page as usize].dirty = true;
    }

    pub fn mark_clean(&mut self, page: u8) {
        self.entries[page as usize].dirty = false;
    }

    /// Record an access: set R and push a 1 into the top of the age counter
    pub fn mark_referenced(&mut self, page: u8) {
        let pte = &mut self.entries[page as usize];
        pte.referenced = true;
        pte.age |= AGE_REFERENCED_BIT;
    }

    /// Clock tick: clear R and decay the age counter by one bit
    pub fn mark_unreferenced(&mut self, page: u8) {
        let pte = &mut self.entries[page as usize];
        pte.referenced = false;
        pte.age >>= 1;
    }

    /// Entries in ascending page order
    pub fn iter(&self) -> impl Iterator<Item = (u8, &PageTableEntry)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(|(page, pte)| (page as u8, pte))
    }

    /// Page numbers currently resident, ascending
    pub fn resident_pages(&self) -> Vec<u8> {
        self.iter()
            .filter(|(_, pte)| pte.present)
            .map(|(page, _)| page)
            .collect()
    }
}

impl Default for PageTable {
    fn default() -> Self {
        Self::new()
    }
}
