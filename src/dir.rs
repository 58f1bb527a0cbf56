use super::bfs::*;
use super::defines::*;
use super::inode::*;

/// Reject names the flat directory cannot hold.
pub fn bfs_name_check(cfg: &BfsConfig, name: &str) -> Result<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') {
        return Err(BfsError::Inval("file name"));
    }
    if name.len() > cfg.name_max as usize {
        return Err(BfsError::NameTooLong);
    }
    Ok(())
}

fn bfs_dir_find(bfs: &Bfs, name: &str) -> Option<BfsInum> {
    bfs.dir
        .iter()
        .flatten()
        .find(|entry| entry.name == name)
        .map(|entry| entry.inum)
}

/// Look `name` up in the directory.
pub fn bfs_lookup_file(bfs: &Bfs, name: &str) -> Result<BfsInum> {
    bfs_name_check(&bfs.cfg, name)?;
    bfs_dir_find(bfs, name).ok_or_else(|| BfsError::NoEnt(name.to_string()))
}

/// Create `name` as an empty file. An existing file of that name is
/// truncated to zero bytes and keeps its inode.
pub fn bfs_create_file(bfs: &mut Bfs, name: &str) -> Result<BfsInum> {
    bfs_name_check(&bfs.cfg, name)?;

    if let Some(inum) = bfs_dir_find(bfs, name) {
        bfs_release(bfs, inum)?;
        log::debug!("truncated {:?} (inum={})", name, inum);
        return Ok(inum);
    }

    let slot = bfs.dir.iter().position(|entry| entry.is_none()).ok_or(BfsError::NoSpc)?;
    let inum = bfs_inode_alloc(bfs)?;
    bfs.dir[slot] = Some(BfsDirEntry { name: name.to_string(), inum });
    log::debug!("created {:?} (inum={})", name, inum);
    Ok(inum)
}
