//! Page replacement
//!
//! Aging approximates LRU: every reference ORs a 1 into the top bit of the
//! page's 8-bit age, every clock tick shifts the age right. The resident page
//! with the smallest age has gone longest without a reference.

use crate::error::{MmuError, Result};
use crate::page_table::PageTable;

/// Picks the page to evict when no frame is free
pub trait ReplacementPolicy {
    /// Choose a resident page to evict on behalf of `requested`.
    /// Must not modify the table; the caller does the eviction.
    fn choose_victim(&self, table: &PageTable, requested: u8) -> Result<u8>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct AgingPolicy;

impl ReplacementPolicy for AgingPolicy {
    fn choose_victim(&self, table: &PageTable, requested: u8) -> Result<u8> {
        // min_by_key keeps the first minimum, and iter() is in page order,
        // so ties go to the lowest page number
        table
            .iter()
            .filter(|(_, pte)| pte.present)
            .min_by_key(|(_, pte)| pte.age)
            .map(|(page, _)| page)
            .ok_or(MmuError::NoVictim { requested })
    }
}
