use super::allocator::*;
use super::block_device::*;
use super::defines::*;
use super::metadata::*;
use super::oft::*;

/// Top-level bfs state: one mounted volume. Every operation takes
/// `&mut Bfs`, so calls on a volume are serialized by the borrow checker.
pub struct Bfs {
    pub(crate) cfg: BfsConfig,
    pub(crate) dev: Box<dyn BlockDevice>,
    pub(crate) inodes: Vec<BfsInode>,
    pub(crate) dir: Vec<Option<BfsDirEntry>>,
    pub(crate) free: BfsFree,
    pub(crate) oft: BfsOft,
}

impl Bfs {
    pub fn config(&self) -> &BfsConfig {
        &self.cfg
    }
}

pub fn bfs_config_validate(cfg: &BfsConfig) -> Result<()> {
    if cfg.block_size < 64 || !cfg.block_size.is_power_of_two() {
        return Err(BfsError::Inval("block_size must be a power of two of at least 64"));
    }
    if cfg.block_count == 0 || cfg.inode_count == 0 || cfg.open_max == 0 {
        return Err(BfsError::Inval("block_count, inode_count and open_max must be non-zero"));
    }
    if cfg.name_max == 0 || cfg.name_max > u8::MAX as u32 {
        return Err(BfsError::Inval("name_max must be between 1 and 255"));
    }
    if cfg.file_block_max == 0 {
        return Err(BfsError::Inval("file_block_max must be non-zero"));
    }
    if 1 + bfs_meta_blocks(cfg) >= cfg.block_count {
        return Err(BfsError::Inval("metadata leaves no data blocks"));
    }
    Ok(())
}

fn bfs_data_start(cfg: &BfsConfig) -> BfsBlock {
    BFS_SUPER_BLOCK + 1 + bfs_meta_blocks(cfg)
}

fn bfs_new(cfg: &BfsConfig, dev: Box<dyn BlockDevice>) -> Bfs {
    Bfs {
        cfg: *cfg,
        dev,
        inodes: vec![BfsInode::default(); cfg.inode_count as usize],
        dir: vec![None; cfg.inode_count as usize],
        free: bfs_free_new(cfg, bfs_data_start(cfg)),
        oft: bfs_oft_new(cfg),
    }
}

/// Initialize a fresh volume on `dev`: superblock, empty inode table,
/// empty directory, every data block free.
pub fn bfs_format(dev: Box<dyn BlockDevice>, cfg: &BfsConfig) -> Result<Bfs> {
    bfs_config_validate(cfg)?;
    let mut bfs = bfs_new(cfg, dev);

    let mut block = vec![0u8; cfg.block_size as usize];
    bfs_superblock_encode(&bfs_superblock_new(cfg), &mut block);
    bfs_bd_prog(&mut bfs, BFS_SUPER_BLOCK, &block)?;
    bfs_sync(&mut bfs)?;

    log::debug!(
        "formatted {} blocks of {} bytes, {} metadata blocks, {} data blocks",
        cfg.block_count,
        cfg.block_size,
        bfs_meta_blocks(cfg),
        bfs_fs_free(&bfs)
    );
    Ok(bfs)
}

/// Mount a volume written by [`bfs_format`]. The on-disk geometry must match
/// `cfg`; the free map is rebuilt from the inode block lists.
pub fn bfs_mount(dev: Box<dyn BlockDevice>, cfg: &BfsConfig) -> Result<Bfs> {
    bfs_config_validate(cfg)?;
    let mut bfs = bfs_new(cfg, dev);

    let mut block = vec![0u8; cfg.block_size as usize];
    bfs_bd_read(&mut bfs, BFS_SUPER_BLOCK, &mut block)?;
    let superblock = bfs_superblock_decode(&block)?;
    if superblock.magic != BFS_MAGIC {
        log::warn!("bad superblock magic {:#x}", superblock.magic);
        return Err(BfsError::Corrupt(format!("bad magic {:#x}", superblock.magic)));
    }
    if superblock != bfs_superblock_new(cfg) {
        log::warn!("superblock {:?} does not match config {:?}", superblock, cfg);
        return Err(BfsError::Corrupt("superblock geometry mismatch".to_string()));
    }

    let mut meta = Vec::with_capacity((superblock.meta_blocks * cfg.block_size) as usize);
    for i in 0..superblock.meta_blocks {
        bfs_bd_read(&mut bfs, BFS_SUPER_BLOCK + 1 + i, &mut block)?;
        meta.extend_from_slice(&block);
    }
    let (inodes, dir) = bfs_meta_decode(cfg, &meta).inspect_err(|err| log::warn!("{}", err))?;

    for inode in inodes.iter().filter(|inode| inode.in_use) {
        for &dbn in &inode.blocks {
            bfs_alloc_mark(&mut bfs.free, dbn).inspect_err(|err| log::warn!("{}", err))?;
        }
    }
    bfs.inodes = inodes;
    bfs.dir = dir;

    log::debug!(
        "mounted {} files, {} free data blocks",
        bfs.dir.iter().flatten().count(),
        bfs_fs_free(&bfs)
    );
    Ok(bfs)
}

/// Write the inode table and directory back, then sync the device.
pub fn bfs_sync(bfs: &mut Bfs) -> Result<()> {
    let meta = bfs_meta_encode(&bfs.cfg, &bfs.inodes, &bfs.dir);
    let bs = bfs.cfg.block_size as usize;
    for (i, chunk) in meta.chunks(bs).enumerate() {
        bfs_bd_prog(bfs, BFS_SUPER_BLOCK + 1 + i as BfsBlock, chunk)?;
    }
    bfs_bd_sync(bfs)?;
    log::debug!("synced {} metadata blocks", meta.len() / bs);
    Ok(())
}

/// Sync and release the volume. Open descriptors die with it.
pub fn bfs_unmount(mut bfs: Bfs) -> Result<Box<dyn BlockDevice>> {
    bfs_sync(&mut bfs)?;
    let open = bfs.oft.slots.iter().flatten().count();
    if open > 0 {
        log::debug!("unmount with {} open files", open);
    }
    Ok(bfs.dev)
}

/// Number of free data blocks.
pub fn bfs_fs_free(bfs: &Bfs) -> u32 {
    bfs_alloc_count_free(&bfs.free)
}
