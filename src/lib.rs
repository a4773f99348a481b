pub mod backing_store;
pub mod command;
pub mod config;
pub mod constants;
pub mod error;
pub mod memory;
pub mod mmu;
pub mod page_table;
pub mod replacement;
pub mod session;
pub mod translation;

// Re-export commonly used items for convenience
pub use config::SimConfig;
pub use constants::*;
pub use error::{MmuError, Result};
pub use mmu::{MmuContext, MmuStats};
pub use page_table::{PageTable, PageTableEntry};
pub use translation::{PhysicalAddress, VirtualAddress};
