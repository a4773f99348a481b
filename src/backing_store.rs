//! Paging file - simulates secondary storage for demand paging
//!
//! The file is a flat array of NUM_PAGES page images; page `p` lives at
//! byte offset `p * PAGE_SIZE`. It is recreated zero-filled on every start.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, trace};

use crate::constants::*;
use crate::error::{MmuError, Result, StoreOp};

/// Byte-addressable storage that can hold the page images
pub trait PageDevice: Read + Write + Seek + Send {
    /// Make written data durable
    fn sync(&mut self) -> io::Result<()>;
}

impl PageDevice for File {
    fn sync(&mut self) -> io::Result<()> {
        self.sync_all()
    }
}

pub struct BackingStore {
    device: Box<dyn PageDevice>,
    path: PathBuf,
}

impl BackingStore {
    /// Create (or recreate) the paging file, zero-filled
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| MmuError::store(StoreOp::Create, None, e))?;

        // set_len on an empty file zero-fills
        file.set_len(BACKING_STORE_SIZE)
            .map_err(|e| MmuError::store(StoreOp::Create, None, e))?;

        debug!("created backing store {} ({} bytes)", path.display(), BACKING_STORE_SIZE);
        Ok(Self::from_device(file, path))
    }

    /// Wrap an already sized device. `path` is only used for reporting.
    pub fn from_device<D: PageDevice + 'static>(device: D, path: impl Into<PathBuf>) -> Self {
        BackingStore {
            device: Box::new(device),
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the image of `page` into `buf`
    pub fn read_page(&mut self, page: u8, buf: &mut [u8; PAGE_SIZE]) -> Result<()> {
        self.seek_to(page)?;
        self.device
            .read_exact(buf)
            .map_err(|e| MmuError::store(StoreOp::Read, Some(page), e))?;
        trace!("read page {} from backing store", page);
        Ok(())
    }

    /// Overwrite the image of `page` with `buf`
    pub fn write_page(&mut self, page: u8, buf: &[u8; PAGE_SIZE]) -> Result<()> {
        self.seek_to(page)?;
        self.device
            .write_all(buf)
            .map_err(|e| MmuError::store(StoreOp::Write, Some(page), e))?;
        trace!("wrote page {} to backing store", page);
        Ok(())
    }

    /// Flush written pages to disk
    pub fn sync(&mut self) -> Result<()> {
        self.device
            .sync()
            .map_err(|e| MmuError::store(StoreOp::Sync, None, e))
    }

    fn seek_to(&mut self, page: u8) -> Result<()> {
        let pos = page as u64 * PAGE_SIZE as u64;
        self.device
            .seek(SeekFrom::Start(pos))
            .map_err(|e| MmuError::store(StoreOp::Seek, Some(page), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_is_zero_filled_and_sized() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pagefile.sys");
        let mut store = BackingStore::create(&path).unwrap();

        assert_eq!(std::fs::metadata(&path).unwrap().len(), BACKING_STORE_SIZE);

        let mut buf = [0xFFu8; PAGE_SIZE];
        store.read_page(255, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_page_read_write() {
        let dir = TempDir::new().unwrap();
        let mut store = BackingStore::create(dir.path().join("pf")).unwrap();

        let mut page = [0u8; PAGE_SIZE];
        page[0] = 1;
        page[PAGE_SIZE - 1] = 2;
        store.write_page(7, &page).unwrap();

        let mut buf = [0u8; PAGE_SIZE];
        store.read_page(7, &mut buf).unwrap();
        assert_eq!(buf, page);

        // neighbours untouched
        store.read_page(6, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
        store.read_page(8, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_page_layout_on_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pf");
        let mut store = BackingStore::create(&path).unwrap();

        let mut page = [0u8; PAGE_SIZE];
        page[3] = 0x5A;
        store.write_page(2, &page).unwrap();
        store.sync().unwrap();

        let raw = std::fs::read(&path).unwrap();
        assert_eq!(raw.len() as u64, BACKING_STORE_SIZE);
        assert_eq!(raw[2 * PAGE_SIZE + 3], 0x5A);
        assert_eq!(raw.iter().filter(|&&b| b != 0).count(), 1);
    }

    #[test]
    fn test_recreate_discards_old_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("pf");
        {
            let mut store = BackingStore::create(&path).unwrap();
            store.write_page(0, &[9u8; PAGE_SIZE]).unwrap();
        }
        let mut store = BackingStore::create(&path).unwrap();
        let mut buf = [1u8; PAGE_SIZE];
        store.read_page(0, &mut buf).unwrap();
        assert!(buf.iter().all(|&b| b == 0));
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let dir = TempDir::new().unwrap();
        let err = BackingStore::create(dir.path().join("nope").join("pf"))
            .err()
            .unwrap();
        assert!(matches!(
            err,
            MmuError::BackingStore { op: StoreOp::Create, .. }
        ));
    }
}
