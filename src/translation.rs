use crate::constants::*;
use crate::error::{MmuError, Result};
use crate::page_table::PageTable;

/// Decompose a raw virtual address into (page number, offset).
/// Bits above the 20-bit address space are ignored.
#[inline]
pub fn decode_virtual(addr: u32) -> (u8, u16) {
    let page = (addr >> PAGE_SHIFT) & PAGE_MASK;
    let offset = addr & OFFSET_MASK;
    (page as u8, offset as u16)
}

/// Compose a raw virtual address from a page number and offset
pub fn encode_virtual(page: u32, offset: u32) -> Result<u32> {
    if page > PAGE_MASK {
        return Err(MmuError::PageOutOfRange(page));
    }
    check_offset(offset)?;
    Ok((page << PAGE_SHIFT) | offset)
}

/// Decompose a raw physical address into (frame number, offset).
/// Bits above the 16-bit physical space are ignored.
#[inline]
pub fn decode_physical(addr: u32) -> (u8, u16) {
    let frame = (addr >> PAGE_SHIFT) & FRAME_MASK;
    let offset = addr & OFFSET_MASK;
    (frame as u8, offset as u16)
}

/// Compose a raw physical address from a frame number and offset
pub fn encode_physical(frame: u32, offset: u32) -> Result<u32> {
    if frame > FRAME_MASK {
        return Err(MmuError::FrameOutOfRange(frame));
    }
    check_offset(offset)?;
    Ok((frame << PAGE_SHIFT) | offset)
}

fn check_offset(offset: u32) -> Result<()> {
    if offset > OFFSET_MASK {
        return Err(MmuError::OffsetOutOfRange(offset));
    }
    Ok(())
}

/// Represents the decomposed components of a Virtual Address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VirtualAddress {
    pub va: u32,
    pub page: u8,
    pub offset: u16,
}

impl VirtualAddress {
    /// Decompose a raw VA into its components
    pub fn from_raw(va: u32) -> Self {
        let va = va & (VA_SPACE - 1);
        let (page, offset) = decode_virtual(va);
        VirtualAddress { va, page, offset }
    }

    /// Build a VA from its components, rejecting out-of-range values
    pub fn new(page: u32, offset: u32) -> Result<Self> {
        encode_virtual(page, offset).map(Self::from_raw)
    }

    /// The address `n` bytes further on, if still inside the address space
    pub fn checked_add(&self, n: u32) -> Option<Self> {
        let va = self.va.checked_add(n)?;
        (va < VA_SPACE).then(|| Self::from_raw(va))
    }
}

impl std::fmt::Display for VirtualAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "VA({:#07x}) = (page={}, offset={})", self.va, self.page, self.offset)
    }
}

/// Represents the decomposed components of a Physical Address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhysicalAddress {
    pub pa: u32,
    pub frame: u8,
    pub offset: u16,
}

impl PhysicalAddress {
    pub fn from_raw(pa: u32) -> Self {
        let pa = pa & (PA_SPACE - 1);
        let (frame, offset) = decode_physical(pa);
        PhysicalAddress { pa, frame, offset }
    }

    pub fn new(frame: u32, offset: u32) -> Result<Self> {
        encode_physical(frame, offset).map(Self::from_raw)
    }
}

impl std::fmt::Display for PhysicalAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PA({:#06x}) = (frame={}, offset={})", self.pa, self.frame, self.offset)
    }
}

/// Translate a virtual address to a physical address
///
/// # Note
/// This is a pure lookup and never faults. The frame number comes straight
/// from the PTE, so the result is stale for a page that is not present and
/// meaningless for one that was never mapped. Check `is_present` first.
pub fn translate(table: &PageTable, va: &VirtualAddress) -> PhysicalAddress {
    let frame = table.get(va.page).frame_number;
    let pa = ((frame as u32) << PAGE_SHIFT) | va.offset as u32;
    PhysicalAddress::from_raw(pa)
}
