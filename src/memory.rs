use crate::constants::*;
use crate::error::{MmuError, Result};

/// Opaque index of a physical frame handed out by the MMU.
/// Holds no borrow of the frame itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameHandle(u8);

impl FrameHandle {
    pub fn new(frame: u8) -> Result<Self> {
        check_frame(frame)?;
        Ok(FrameHandle(frame))
    }

    #[inline]
    pub fn number(&self) -> u8 {
        self.0
    }
}

fn check_frame(frame: u8) -> Result<()> {
    if frame as usize >= NUM_FRAMES {
        return Err(MmuError::FrameOutOfRange(frame as u32));
    }
    Ok(())
}

pub type Frame = [u8; PAGE_SIZE];

/// The frame pool: NUM_FRAMES page-sized byte buffers
pub struct PhysicalMemory {
    frames: Box<[Frame; NUM_FRAMES]>,
}

impl PhysicalMemory {
    /// Create a new physical memory initialized to all zeros
    pub fn new() -> Self {
        PhysicalMemory {
            frames: Box::new([[0u8; PAGE_SIZE]; NUM_FRAMES]),
        }
    }

    /// Read a byte from a frame
    #[inline]
    pub fn read(&self, frame: FrameHandle, offset: u16) -> Result<u8> {
        let offset = check_offset(offset)?;
        Ok(self.frames[frame.0 as usize][offset])
    }

    /// Write a byte to a frame
    #[inline]
    pub fn write(&mut self, frame: FrameHandle, offset: u16, value: u8) -> Result<()> {
        let offset = check_offset(offset)?;
        self.frames[frame.0 as usize][offset] = value;
        Ok(())
    }

    /// Whole-frame access for page transfers
    pub fn frame(&self, frame: FrameHandle) -> &Frame {
        &self.frames[frame.0 as usize]
    }

    pub fn frame_mut(&mut self, frame: FrameHandle) -> &mut Frame {
        &mut self.frames[frame.0 as usize]
    }

    pub fn zero_frame(&mut self, frame: FrameHandle) {
        self.frames[frame.0 as usize].fill(0);
    }
}

fn check_offset(offset: u16) -> Result<usize> {
    if offset as usize >= PAGE_SIZE {
        return Err(MmuError::OffsetOutOfRange(offset as u32));
    }
    Ok(offset as usize)
}

impl Default for PhysicalMemory {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameTableEntry {
    pub occupied: bool,
    pub owner: u8,
}

/// Tracks which frames are occupied and by which page
///
/// Kept in step with the page table by the MMU's load and evict paths.
pub struct FrameTable {
    entries: [FrameTableEntry; NUM_FRAMES],
}

impl FrameTable {
    pub fn new() -> Self {
        FrameTable {
            entries: [FrameTableEntry::default(); NUM_FRAMES],
        }
    }

    /// Lowest-numbered unoccupied frame
    pub fn find_free_frame(&self) -> Option<u8> {
        self.entries
            .iter()
            .position(|entry| !entry.occupied)
            .map(|frame| frame as u8)
    }

    pub fn mark_occupied(&mut self, frame: u8, page: u8) -> Result<()> {
        check_frame(frame)?;
        self.entries[frame as usize] = FrameTableEntry {
            occupied: true,
            owner: page,
        };
        Ok(())
    }

    pub fn mark_free(&mut self, frame: u8) -> Result<()> {
        check_frame(frame)?;
        self.entries[frame as usize] = FrameTableEntry::default();
        Ok(())
    }

    pub fn is_occupied(&self, frame: u8) -> Result<bool> {
        check_frame(frame)?;
        Ok(self.entries[frame as usize].occupied)
    }

    /// Page resident in `frame`, if any
    pub fn owner(&self, frame: u8) -> Result<Option<u8>> {
        check_frame(frame)?;
        let entry = self.entries[frame as usize];
        Ok(entry.occupied.then_some(entry.owner))
    }

    pub fn occupied_count(&self) -> usize {
        self.entries.iter().filter(|entry| entry.occupied).count()
    }

    pub fn free_count(&self) -> usize {
        NUM_FRAMES - self.occupied_count()
    }
}

impl Default for FrameTable {
    fn default() -> Self {
        Self::new()
    }
}
