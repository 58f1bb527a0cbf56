use super::bfs::*;
use super::block_device::*;
use super::defines::*;

pub fn bfs_free_new(cfg: &BfsConfig, start: BfsBlock) -> BfsFree {
    BfsFree {
        start,
        used: vec![false; cfg.block_count.saturating_sub(start) as usize],
    }
}

/// Mark `block` in use while rebuilding the free map. A block claimed twice,
/// or one outside the data region, means the metadata is corrupt.
pub fn bfs_alloc_mark(free: &mut BfsFree, block: BfsBlock) -> Result<()> {
    let index = block
        .checked_sub(free.start)
        .map(|off| off as usize)
        .filter(|&off| off < free.used.len())
        .ok_or_else(|| BfsError::Corrupt(format!("block {} outside data region", block)))?;
    if free.used[index] {
        return Err(BfsError::Corrupt(format!("block {} claimed twice", block)));
    }
    free.used[index] = true;
    Ok(())
}

pub fn bfs_alloc_count_free(free: &BfsFree) -> u32 {
    free.used.iter().filter(|used| !**used).count() as u32
}

/// Take the lowest free data block and zero it on the device.
pub fn bfs_alloc(bfs: &mut Bfs) -> Result<BfsBlock> {
    let index = bfs
        .free
        .used
        .iter()
        .position(|used| !*used)
        .ok_or(BfsError::NoSpc)?;
    let block = bfs.free.start + index as BfsBlock;

    let zeroes = vec![0u8; bfs.cfg.block_size as usize];
    bfs_bd_prog(bfs, block, &zeroes)?;
    bfs.free.used[index] = true;
    bfs_trace!("alloc dbn={}", block);
    Ok(block)
}

/// Return a data block to the free map.
pub fn bfs_alloc_release(free: &mut BfsFree, block: BfsBlock) {
    if let Some(off) = block.checked_sub(free.start) {
        if let Some(used) = free.used.get_mut(off as usize) {
            *used = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn free_map() -> BfsFree {
        let cfg = BfsConfig { block_count: 8, ..BfsConfig::default() };
        bfs_free_new(&cfg, 3)
    }

    #[test]
    fn mark_rejects_metadata_and_duplicate_blocks() {
        let mut free = free_map();
        assert_eq!(free.used.len(), 5);
        assert!(matches!(bfs_alloc_mark(&mut free, 2), Err(BfsError::Corrupt(_))));
        assert!(matches!(bfs_alloc_mark(&mut free, 8), Err(BfsError::Corrupt(_))));
        bfs_alloc_mark(&mut free, 4).unwrap();
        assert!(matches!(bfs_alloc_mark(&mut free, 4), Err(BfsError::Corrupt(_))));
        assert_eq!(bfs_alloc_count_free(&free), 4);
    }

    #[test]
    fn release_ignores_foreign_blocks() {
        let mut free = free_map();
        bfs_alloc_mark(&mut free, 7).unwrap();
        bfs_alloc_release(&mut free, 1);
        bfs_alloc_release(&mut free, 99);
        assert_eq!(bfs_alloc_count_free(&free), 4);
        bfs_alloc_release(&mut free, 7);
        assert_eq!(bfs_alloc_count_free(&free), 5);
    }
}
