pub const OFFSET_BITS: u32 = 12;
pub const PAGE_BITS: u32 = 8;
pub const FRAME_BITS: u32 = 4;

pub const PAGE_SIZE: usize = 1 << OFFSET_BITS;
pub const NUM_PAGES: usize = 1 << PAGE_BITS;
pub const NUM_FRAMES: usize = 1 << FRAME_BITS;

// total bytes addressable through a virtual / physical address
pub const VA_SPACE: u32 = 1 << (PAGE_BITS + OFFSET_BITS);
pub const PA_SPACE: u32 = 1 << (FRAME_BITS + OFFSET_BITS);

pub const PM_SIZE: usize = NUM_FRAMES * PAGE_SIZE;
pub const BACKING_STORE_SIZE: u64 = (NUM_PAGES * PAGE_SIZE) as u64;

pub const OFFSET_MASK: u32 = (1 << OFFSET_BITS) - 1;
pub const PAGE_MASK: u32 = (1 << PAGE_BITS) - 1;
pub const FRAME_MASK: u32 = (1 << FRAME_BITS) - 1;

pub const PAGE_SHIFT: u32 = OFFSET_BITS;

/// Bit ORed into a page's age counter when it is referenced.
pub const AGE_REFERENCED_BIT: u8 = 1 << 7;

pub const DEFAULT_PAGEFILE: &str = "pagefile.sys";
pub const DEFAULT_TICK_INTERVAL: u32 = 8;
