use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::Path;

use super::bfs::*;
use super::defines::*;

/// Whole-block device primitives. Buffers are always exactly one block long.
pub trait BlockDevice {
    /// Read block `block` into `buffer`.
    fn read(&mut self, block: BfsBlock, buffer: &mut [u8]) -> io::Result<()>;

    /// Program `buffer` into block `block`.
    fn prog(&mut self, block: BfsBlock, buffer: &[u8]) -> io::Result<()>;

    /// Sync the state of the underlying block device.
    fn sync(&mut self) -> io::Result<()>;
}

fn out_of_range(block: BfsBlock) -> io::Error {
    io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("block {} is past the end of the device", block),
    )
}

/// Device backed by a heap buffer; contents are lost on drop.
#[derive(Debug, Clone)]
pub struct RamBlockDevice {
    block_size: usize,
    data: Vec<u8>,
}

impl RamBlockDevice {
    pub fn new(block_size: BfsSize, block_count: BfsSize) -> Self {
        Self {
            block_size: block_size as usize,
            data: vec![0u8; block_size as usize * block_count as usize],
        }
    }

    fn range(&self, block: BfsBlock, len: usize) -> io::Result<core::ops::Range<usize>> {
        let start = block as usize * self.block_size;
        if len != self.block_size || start + len > self.data.len() {
            return Err(out_of_range(block));
        }
        Ok(start..start + len)
    }
}

impl BlockDevice for RamBlockDevice {
    fn read(&mut self, block: BfsBlock, buffer: &mut [u8]) -> io::Result<()> {
        let range = self.range(block, buffer.len())?;
        buffer.copy_from_slice(&self.data[range]);
        Ok(())
    }

    fn prog(&mut self, block: BfsBlock, buffer: &[u8]) -> io::Result<()> {
        let range = self.range(block, buffer.len())?;
        self.data[range].copy_from_slice(buffer);
        Ok(())
    }

    fn sync(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Device backed by a disk image file.
#[derive(Debug)]
pub struct FileBlockDevice {
    file: File,
    block_size: u64,
    block_count: u64,
}

impl FileBlockDevice {
    /// Create (or truncate) an image of `block_count` zeroed blocks.
    pub fn create<P: AsRef<Path>>(path: P, block_size: BfsSize, block_count: BfsSize) -> io::Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(block_size as u64 * block_count as u64)?;
        Ok(Self {
            file,
            block_size: block_size as u64,
            block_count: block_count as u64,
        })
    }

    /// Open an existing image; its length must be a whole number of blocks.
    pub fn open<P: AsRef<Path>>(path: P, block_size: BfsSize) -> io::Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = file.metadata()?.len();
        if len % block_size as u64 != 0 {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("image length {} is not a multiple of {}", len, block_size),
            ));
        }
        Ok(Self {
            file,
            block_size: block_size as u64,
            block_count: len / block_size as u64,
        })
    }

    fn seek_to(&mut self, block: BfsBlock, len: usize) -> io::Result<()> {
        if len as u64 != self.block_size || block as u64 >= self.block_count {
            return Err(out_of_range(block));
        }
        self.file.seek(SeekFrom::Start(block as u64 * self.block_size))?;
        Ok(())
    }
}

impl BlockDevice for FileBlockDevice {
    fn read(&mut self, block: BfsBlock, buffer: &mut [u8]) -> io::Result<()> {
        self.seek_to(block, buffer.len())?;
        self.file.read_exact(buffer)
    }

    fn prog(&mut self, block: BfsBlock, buffer: &[u8]) -> io::Result<()> {
        self.seek_to(block, buffer.len())?;
        self.file.write_all(buffer)
    }

    fn sync(&mut self) -> io::Result<()> {
        self.file.sync_all()
    }
}

// --- General bfs block device operations ---
// Thin wrappers that check the block number against the volume geometry.

fn bfs_bd_check(bfs: &Bfs, block: BfsBlock, len: usize) -> Result<()> {
    if block >= bfs.cfg.block_count {
        return Err(BfsError::Corrupt(format!("device block {} out of range", block)));
    }
    if len != bfs.cfg.block_size as usize {
        return Err(BfsError::Inval("block buffer length"));
    }
    Ok(())
}

pub fn bfs_bd_read(bfs: &mut Bfs, block: BfsBlock, buffer_out: &mut [u8]) -> Result<()> {
    bfs_bd_check(bfs, block, buffer_out.len())?;
    bfs_trace!("bd read dbn={}", block);
    bfs.dev.read(block, buffer_out)?;
    Ok(())
}

pub fn bfs_bd_prog(bfs: &mut Bfs, block: BfsBlock, buffer_in: &[u8]) -> Result<()> {
    bfs_bd_check(bfs, block, buffer_in.len())?;
    bfs_trace!("bd prog dbn={}", block);
    bfs.dev.prog(block, buffer_in)?;
    Ok(())
}

pub fn bfs_bd_sync(bfs: &mut Bfs) -> Result<()> {
    bfs.dev.sync()?;
    Ok(())
}
