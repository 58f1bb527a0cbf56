use super::bfs::*;
use super::defines::*;

pub fn bfs_oft_new(cfg: &BfsConfig) -> BfsOft {
    BfsOft { slots: vec![None; cfg.open_max as usize] }
}

/// Live slot behind `fd`.
pub fn bfs_get_oft(oft: &BfsOft, fd: BfsFd) -> Result<&BfsOpenFile> {
    oft.slots
        .get(fd.0 as usize)
        .and_then(|slot| slot.as_ref())
        .ok_or(BfsError::BadFd(fd.0))
}

pub fn bfs_find_oft(oft: &mut BfsOft, fd: BfsFd) -> Result<&mut BfsOpenFile> {
    oft.slots
        .get_mut(fd.0 as usize)
        .and_then(|slot| slot.as_mut())
        .ok_or(BfsError::BadFd(fd.0))
}

/// Open `inum`: reuse its live slot (one more reference, cursor untouched)
/// or take the lowest free slot with the cursor at 0.
pub fn bfs_inum_to_fd(bfs: &mut Bfs, inum: BfsInum) -> Result<BfsFd> {
    let slots = &mut bfs.oft.slots;
    if let Some(index) = slots.iter().position(|slot| matches!(slot, Some(open) if open.inum == inum)) {
        if let Some(open) = slots[index].as_mut() {
            open.refs += 1;
        }
        return Ok(BfsFd(index as u32));
    }

    let index = slots.iter().position(|slot| slot.is_none()).ok_or(BfsError::NFile)?;
    slots[index] = Some(BfsOpenFile { inum, cursor: 0, refs: 1 });
    Ok(BfsFd(index as u32))
}

/// Fail with `NFile` if opening `inum` would need a slot and none is free.
/// `None` stands for a file that does not exist yet.
pub fn bfs_oft_check_room(bfs: &Bfs, inum: Option<BfsInum>) -> Result<()> {
    let slots = &bfs.oft.slots;
    let shared = inum.is_some_and(|inum| slots.iter().flatten().any(|open| open.inum == inum));
    if shared || slots.iter().any(|slot| slot.is_none()) {
        Ok(())
    } else {
        Err(BfsError::NFile)
    }
}

pub fn bfs_fd_to_inum(bfs: &Bfs, fd: BfsFd) -> Result<BfsInum> {
    Ok(bfs_get_oft(&bfs.oft, fd)?.inum)
}

pub fn bfs_tell(bfs: &Bfs, fd: BfsFd) -> Result<BfsOff> {
    Ok(bfs_get_oft(&bfs.oft, fd)?.cursor)
}

/// Drop one reference; the slot is released when none remain.
pub fn bfs_deref_oft(bfs: &mut Bfs, fd: BfsFd) -> Result<()> {
    let open = bfs_find_oft(&mut bfs.oft, fd)?;
    open.refs -= 1;
    if open.refs == 0 {
        bfs.oft.slots[fd.0 as usize] = None;
    }
    Ok(())
}
