//! The MMU proper: page-fault handling, eviction, loading and the
//! byte-level accesses that drive them.
//!
//! `MmuContext` owns the frame pool, the frame table and the paging file.
//! A `PageTable` belongs to one simulated process and is passed in by
//! `&mut` on every call, so there is exactly one writer at a time.

use log::{debug, info, trace};

use crate::backing_store::BackingStore;
use crate::config::SimConfig;
use crate::constants::*;
use crate::error::{MmuError, Result};
use crate::memory::{FrameHandle, FrameTable, PhysicalMemory};
use crate::page_table::{PageTable, PageTableEntry};
use crate::replacement::{AgingPolicy, ReplacementPolicy};
use crate::translation::{self, PhysicalAddress, VirtualAddress};

/// Counters kept by the MMU
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MmuStats {
    pub accesses: u64,
    pub hits: u64,
    pub page_faults: u64,
    pub evictions: u64,
    pub write_backs: u64,
    pub ticks: u64,
}

impl std::fmt::Display for MmuStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "accesses={} hits={} faults={} evictions={} write_backs={} ticks={}",
            self.accesses, self.hits, self.page_faults, self.evictions, self.write_backs, self.ticks
        )
    }
}

/// How a page fault found its frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FaultPath {
    FreeFrame,
    IdleFrame,
    Replaced { victim: u8 },
}

impl std::fmt::Display for FaultPath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FaultPath::FreeFrame => write!(f, "free frame"),
            FaultPath::IdleFrame => write!(f, "idle frame"),
            FaultPath::Replaced { victim } => write!(f, "replaced page {}", victim),
        }
    }
}

pub struct MmuContext<P: ReplacementPolicy = AgingPolicy> {
    memory: PhysicalMemory,
    frames: FrameTable,
    store: BackingStore,
    policy: P,
    tick_interval: u32,
    since_tick: u32,
    stats: MmuStats,
}

impl MmuContext<AgingPolicy> {
    /// Power on: zeroed frame pool, empty frame table, fresh paging file
    pub fn init(config: &SimConfig) -> Result<Self> {
        Self::with_policy(config, AgingPolicy)
    }
}

impl<P: ReplacementPolicy> MmuContext<P> {
    pub fn with_policy(config: &SimConfig, policy: P) -> Result<Self> {
        let store = BackingStore::create(&config.pagefile)?;
        info!(
            "mmu up: {} frames x {} bytes, {} pages, pagefile {}",
            NUM_FRAMES,
            PAGE_SIZE,
            NUM_PAGES,
            store.path().display()
        );
        Ok(MmuContext {
            memory: PhysicalMemory::new(),
            frames: FrameTable::new(),
            store,
            policy,
            tick_interval: config.tick_interval,
            since_tick: 0,
            stats: MmuStats::default(),
        })
    }

    pub fn stats(&self) -> MmuStats {
        self.stats
    }

    pub fn frame_table(&self) -> &FrameTable {
        &self.frames
    }

    pub fn memory(&self) -> &PhysicalMemory {
        &self.memory
    }

    pub fn backing_store(&mut self) -> &mut BackingStore {
        &mut self.store
    }

    /// Which frame `va` is associated with. Never faults; see
    /// [`translation::translate`].
    pub fn translate(&self, table: &PageTable, va: &VirtualAddress) -> PhysicalAddress {
        translation::translate(table, va)
    }

    /// Fault `page` in and return its frame number
    pub fn resolve(&mut self, table: &mut PageTable, page: u8) -> Result<u8> {
        let (frame, path) = if table.is_unmapped(page) {
            match self.frames.find_free_frame() {
                Some(frame) => {
                    table.set(page, PageTableEntry::new(frame)?)?;
                    (frame, FaultPath::FreeFrame)
                }
                None => self.replace(table, page)?,
            }
        } else {
            let frame = table.get(page).frame_number;
            match self.frames.owner(frame)? {
                None => (frame, FaultPath::IdleFrame),
                // already resident, nothing to fault
                Some(owner) if owner == page => {
                    table.mark_referenced(page);
                    return Ok(frame);
                }
                Some(_) => self.replace(table, page)?,
            }
        };

        self.load(table, page)?;
        self.stats.page_faults += 1;
        debug!(
            "page fault: page {} -> frame {} ({}, {} frames free)",
            page,
            frame,
            path,
            self.frames.free_count()
        );

        table.mark_referenced(page);
        Ok(frame)
    }

    /// Evict the policy's victim and remap `page` onto the freed frame
    fn replace(&mut self, table: &mut PageTable, page: u8) -> Result<(u8, FaultPath)> {
        let victim = self.policy.choose_victim(table, page)?;
        let frame = table.get(victim).frame_number;
        self.evict(table, victim)?;
        table.set(page, PageTableEntry::new(frame)?)?;
        Ok((frame, FaultPath::Replaced { victim }))
    }

    /// Fetch `page`, faulting it in if it is not resident.
    /// Every byte access goes through here.
    pub fn pte_page(&mut self, table: &mut PageTable, page: u8) -> Result<FrameHandle> {
        self.advance_clock(table);
        self.stats.accesses += 1;

        let frame = if table.is_present(page) {
            self.stats.hits += 1;
            table.mark_referenced(page);
            table.get(page).frame_number
        } else {
            self.resolve(table, page)?
        };
        FrameHandle::new(frame)
    }

    /// Write `page` back if dirty, then release its frame.
    /// The page stays mapped to the same frame but is no longer present.
    pub fn evict(&mut self, table: &mut PageTable, page: u8) -> Result<()> {
        if !table.is_present(page) {
            return Ok(());
        }
        let pte = table.get(page);
        let frame = FrameHandle::new(pte.frame_number)?;

        if pte.dirty {
            self.store.write_page(page, self.memory.frame(frame))?;
            self.stats.write_backs += 1;
        }

        table.set(page, PageTableEntry::new(pte.frame_number)?)?;
        self.memory.zero_frame(frame);
        self.frames.mark_free(pte.frame_number)?;
        self.stats.evictions += 1;

        debug!(
            "evicted page {} from frame {}{}",
            page,
            pte.frame_number,
            if pte.dirty { " (written back)" } else { "" }
        );
        Ok(())
    }

    /// Read `page` from the paging file into the frame named by its PTE
    pub fn load(&mut self, table: &mut PageTable, page: u8) -> Result<()> {
        let pte = table.get(page);
        if !pte.mapped {
            return Err(MmuError::NotMapped(page));
        }
        if pte.present {
            return Ok(());
        }
        if let Some(owner) = self.frames.owner(pte.frame_number)? {
            return Err(MmuError::FrameOccupied {
                frame: pte.frame_number,
                owner,
                page,
            });
        }

        let frame = FrameHandle::new(pte.frame_number)?;
        let mut buf = [0u8; PAGE_SIZE];
        self.store.read_page(page, &mut buf)?;
        *self.memory.frame_mut(frame) = buf;

        self.frames.mark_occupied(pte.frame_number, page)?;
        let loaded = PageTableEntry {
            present: true,
            ..PageTableEntry::new(pte.frame_number)?
        };
        table.set(page, loaded)?;
        Ok(())
    }

    /// One aging clock tick over every resident page
    pub fn tick(&mut self, table: &mut PageTable) {
        for page in table.resident_pages() {
            table.mark_unreferenced(page);
        }
        self.stats.ticks += 1;
        trace!("aging tick {}", self.stats.ticks);
    }

    fn advance_clock(&mut self, table: &mut PageTable) {
        if self.tick_interval == 0 {
            return;
        }
        self.since_tick += 1;
        if self.since_tick >= self.tick_interval {
            self.since_tick = 0;
            self.tick(table);
        }
    }

    /// Evict every resident page, writing dirty ones back
    pub fn flush_all(&mut self, table: &mut PageTable) -> Result<()> {
        for page in table.resident_pages() {
            self.evict(table, page)?;
        }
        Ok(())
    }

    /// Flush all pages and sync the paging file
    pub fn halt(&mut self, table: &mut PageTable) -> Result<MmuStats> {
        self.flush_all(table)?;
        self.store.sync()?;
        debug!("mmu halted: {}", self.stats);
        Ok(self.stats)
    }

    /// Power off. Syncs the paging file and releases the frame pool.
    pub fn destroy(mut self) -> Result<()> {
        self.store.sync()?;
        debug!("mmu destroyed");
        Ok(())
    }

    pub fn read(&mut self, table: &mut PageTable, va: VirtualAddress) -> Result<u8> {
        let frame = self.pte_page(table, va.page)?;
        let value = self.memory.read(frame, va.offset)?;
        trace!("read {:#04x} at {}", value, va);
        Ok(value)
    }

    pub fn read_n(&mut self, table: &mut PageTable, va: VirtualAddress, n: usize) -> Result<Vec<u8>> {
        check_span(va, n)?;
        let mut bytes = Vec::with_capacity(n);
        for i in 0..n as u32 {
            bytes.push(self.read(table, VirtualAddress::from_raw(va.va + i))?);
        }
        Ok(bytes)
    }

    pub fn write(&mut self, table: &mut PageTable, va: VirtualAddress, value: u8) -> Result<()> {
        let frame = self.pte_page(table, va.page)?;
        self.memory.write(frame, va.offset, value)?;
        table.mark_dirty(va.page);
        trace!("wrote {:#04x} at {}", value, va);
        Ok(())
    }

    /// Write consecutive bytes starting at `va`
    pub fn write_bytes(&mut self, table: &mut PageTable, va: VirtualAddress, bytes: &[u8]) -> Result<()> {
        check_span(va, bytes.len())?;
        for (i, &value) in bytes.iter().enumerate() {
            self.write(table, VirtualAddress::from_raw(va.va + i as u32), value)?;
        }
        Ok(())
    }

    pub fn write_word(&mut self, table: &mut PageTable, va: VirtualAddress, word: [u8; 2]) -> Result<()> {
        self.write_bytes(table, va, &word)
    }

    pub fn write_dword(&mut self, table: &mut PageTable, va: VirtualAddress, dword: [u8; 4]) -> Result<()> {
        self.write_bytes(table, va, &dword)
    }

    pub fn write_zeros(&mut self, table: &mut PageTable, va: VirtualAddress, n: usize) -> Result<()> {
        check_span(va, n)?;
        for i in 0..n as u32 {
            self.write(table, VirtualAddress::from_raw(va.va + i), 0)?;
        }
        Ok(())
    }

    /// Frame table and page table agree: every occupied frame is owned by a
    /// present page mapped to it, and every present page owns its frame.
    pub fn is_consistent(&self, table: &PageTable) -> bool {
        let frames_ok = (0..NUM_FRAMES as u8).all(|frame| match self.frames.owner(frame) {
            Ok(Some(owner)) => {
                let pte = table.get(owner);
                pte.present && pte.frame_number == frame
            }
            Ok(None) => true,
            Err(_) => false,
        });
        let pages_ok = table.iter().filter(|(_, pte)| pte.present).all(|(page, pte)| {
            pte.mapped && matches!(self.frames.owner(pte.frame_number), Ok(Some(owner)) if owner == page)
        });
        frames_ok && pages_ok
    }
}

fn check_span(va: VirtualAddress, len: usize) -> Result<()> {
    if va.va as u64 + len as u64 > VA_SPACE as u64 {
        return Err(MmuError::AddressOutOfRange { start: va.va, len });
    }
    Ok(())
}
