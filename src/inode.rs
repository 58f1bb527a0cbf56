use super::allocator::*;
use super::bfs::*;
use super::block_device::*;
use super::defines::*;

fn bfs_inode(bfs: &Bfs, inum: BfsInum) -> Result<&BfsInode> {
    bfs.inodes
        .get(inum as usize)
        .filter(|inode| inode.in_use)
        .ok_or_else(|| BfsError::Corrupt(format!("inode {} is not allocated", inum)))
}

fn bfs_inode_mut(bfs: &mut Bfs, inum: BfsInum) -> Result<&mut BfsInode> {
    bfs.inodes
        .get_mut(inum as usize)
        .filter(|inode| inode.in_use)
        .ok_or_else(|| BfsError::Corrupt(format!("inode {} is not allocated", inum)))
}

/// Claim the lowest unused inode as an empty file.
pub fn bfs_inode_alloc(bfs: &mut Bfs) -> Result<BfsInum> {
    let inum = bfs
        .inodes
        .iter()
        .position(|inode| !inode.in_use)
        .ok_or(BfsError::NoSpc)?;
    bfs.inodes[inum] = BfsInode { in_use: true, size: 0, blocks: Vec::new() };
    Ok(inum as BfsInum)
}

pub fn bfs_get_size(bfs: &Bfs, inum: BfsInum) -> Result<BfsSize> {
    Ok(bfs_inode(bfs, inum)?.size)
}

pub fn bfs_set_size(bfs: &mut Bfs, inum: BfsInum, size: BfsSize) -> Result<()> {
    bfs_inode_mut(bfs, inum)?.size = size;
    Ok(())
}

pub fn bfs_block_count(bfs: &Bfs, inum: BfsInum) -> Result<u32> {
    Ok(bfs_inode(bfs, inum)?.blocks.len() as u32)
}

/// Translate a file block number into the device block holding it.
pub fn bfs_fbn_to_dbn(bfs: &Bfs, inum: BfsInum, fbn: BfsBlock) -> Result<BfsBlock> {
    bfs_inode(bfs, inum)?
        .blocks
        .get(fbn as usize)
        .copied()
        .ok_or_else(|| BfsError::Corrupt(format!("inode {} has no block {}", inum, fbn)))
}

/// Read file block `fbn` of inode `inum` into `buffer_out`.
pub fn bfs_read(bfs: &mut Bfs, inum: BfsInum, fbn: BfsBlock, buffer_out: &mut [u8]) -> Result<()> {
    let dbn = bfs_fbn_to_dbn(bfs, inum, fbn)?;
    bfs_bd_read(bfs, dbn, buffer_out)
}

/// Grow the block list of `inum` to at least `count` blocks. Fails with
/// `NoSpc` before allocating anything if the request cannot be met.
pub fn bfs_extend(bfs: &mut Bfs, inum: BfsInum, count: u32) -> Result<()> {
    let have = bfs_block_count(bfs, inum)?;
    if count <= have {
        return Ok(());
    }
    let wanted = count - have;
    if count > bfs.cfg.file_block_max || wanted > bfs_alloc_count_free(&bfs.free) {
        log::debug!("extend inum={} to {} blocks refused", inum, count);
        return Err(BfsError::NoSpc);
    }

    for _ in 0..wanted {
        let block = bfs_alloc(bfs)?;
        bfs_inode_mut(bfs, inum)?.blocks.push(block);
    }
    log::debug!("extended inum={} from {} to {} blocks", inum, have, count);
    Ok(())
}

/// Drop every block of `inum` and reset its size to zero.
pub fn bfs_release(bfs: &mut Bfs, inum: BfsInum) -> Result<()> {
    let blocks = core::mem::take(&mut bfs_inode_mut(bfs, inum)?.blocks);
    for block in blocks {
        bfs_alloc_release(&mut bfs.free, block);
    }
    bfs_set_size(bfs, inum, 0)
}
