use super::bfs::*;
use super::block_device::*;
use super::defines::*;
use super::dir::*;
use super::inode::*;
use super::oft::*;
use super::translator::*;
use super::utils::*;

/// Open an existing file.
pub fn bfs_file_open(bfs: &mut Bfs, name: &str) -> Result<BfsFd> {
    let inum = bfs_lookup_file(bfs, name)?;
    let fd = bfs_inum_to_fd(bfs, inum)?;
    log::debug!("open {:?} inum={} fd={}", name, inum, fd.0);
    Ok(fd)
}

/// Create `name`, truncating it if it already exists, and open it. A full
/// open-file table fails the call before the directory or the file changes.
pub fn bfs_file_create(bfs: &mut Bfs, name: &str) -> Result<BfsFd> {
    bfs_name_check(&bfs.cfg, name)?;
    let existing = bfs_lookup_file(bfs, name).ok();
    bfs_oft_check_room(bfs, existing)?;

    let inum = bfs_create_file(bfs, name)?;
    let fd = bfs_inum_to_fd(bfs, inum)?;
    log::debug!("create {:?} inum={} fd={}", name, inum, fd.0);
    Ok(fd)
}

pub fn bfs_file_close(bfs: &mut Bfs, fd: BfsFd) -> Result<()> {
    bfs_deref_oft(bfs, fd)?;
    log::debug!("close fd={}", fd.0);
    Ok(())
}

pub fn bfs_file_size(bfs: &Bfs, fd: BfsFd) -> Result<BfsSize> {
    let inum = bfs_fd_to_inum(bfs, fd)?;
    bfs_get_size(bfs, inum)
}

pub fn bfs_file_tell(bfs: &Bfs, fd: BfsFd) -> Result<BfsOff> {
    bfs_tell(bfs, fd)
}

/// Move the cursor of `fd`. A negative `offset` is refused for every
/// `whence`, including `End`. Seeking never changes the file size.
pub fn bfs_file_seek(bfs: &mut Bfs, fd: BfsFd, offset: BfsSOff, whence: BfsWhence) -> Result<()> {
    if offset < 0 {
        return Err(BfsError::Inval("negative seek offset"));
    }
    bfs_seek(bfs, fd, offset as BfsOff, whence)
}

fn bfs_seek(bfs: &mut Bfs, fd: BfsFd, offset: BfsOff, whence: BfsWhence) -> Result<()> {
    let inum = bfs_fd_to_inum(bfs, fd)?;
    let base = match whence {
        BfsWhence::Set => 0,
        BfsWhence::Cur => bfs_tell(bfs, fd)?,
        BfsWhence::End => bfs_get_size(bfs, inum)?,
    };
    let cursor = base.checked_add(offset).ok_or(BfsError::Inval("seek overflow"))?;

    bfs_find_oft(&mut bfs.oft, fd)?.cursor = cursor;
    Ok(())
}

/// Read up to `buffer_out.len()` bytes at the cursor. Returns the number of
/// bytes read, short at end-of-file and zero at or past it.
pub fn bfs_file_read(bfs: &mut Bfs, fd: BfsFd, buffer_out: &mut [u8]) -> Result<BfsSize> {
    let inum = bfs_fd_to_inum(bfs, fd)?;
    let size = bfs_get_size(bfs, inum)?;
    let cursor = bfs_tell(bfs, fd)?;
    let block_size = bfs.cfg.block_size;

    // Longer buffers are clipped at end-of-file anyway.
    let numb = bfs_clamp_len(buffer_out.len());
    let span = bfs_span(cursor, numb, size, block_size);
    if span.is_empty() {
        return Ok(0);
    }

    let bs = block_size as usize;
    let first_off = span.first_off as usize;
    let mut block_buffer = vec![0u8; bs];

    if span.is_single() {
        bfs_read(bfs, inum, span.start_fbn, &mut block_buffer)?;
        let len = span.len as usize;
        buffer_out[..len].copy_from_slice(&block_buffer[first_off..first_off + len]);
        bfs_seek(bfs, fd, span.len, BfsWhence::Cur)?;
        return Ok(span.len);
    }

    let mut last_fbn = span.last_fbn;
    let tail_len = bfs_tail_len(&span, block_size) as usize;
    if tail_len == 0 {
        last_fbn -= 1;
    }

    let mut copied = 0usize;
    for fbn in span.start_fbn..=last_fbn {
        let (from, len) = if fbn == span.start_fbn {
            (first_off, bs - first_off)
        } else if fbn == span.last_fbn {
            (0, tail_len)
        } else {
            (0, bs)
        };
        bfs_read(bfs, inum, fbn, &mut block_buffer)?;
        bfs_trace!("read inum={} fbn={} off={} len={}", inum, fbn, from, len);
        buffer_out[copied..copied + len].copy_from_slice(&block_buffer[from..from + len]);
        copied += len;
    }

    debug_assert_eq!(copied, span.len as usize);
    bfs_seek(bfs, fd, span.len, BfsWhence::Cur)?;
    Ok(span.len)
}

/// Write all of `buffer_in` at the cursor, growing the file first if the
/// write ends past the current size. Returns `buffer_in.len()`.
pub fn bfs_file_write(bfs: &mut Bfs, fd: BfsFd, buffer_in: &[u8]) -> Result<BfsSize> {
    let inum = bfs_fd_to_inum(bfs, fd)?;
    let size = bfs_get_size(bfs, inum)?;
    let mut cursor = bfs_tell(bfs, fd)?;
    let block_size = bfs.cfg.block_size;

    let numb = BfsSize::try_from(buffer_in.len()).map_err(|_| BfsError::Inval("write length"))?;
    let end = cursor.checked_add(numb).ok_or(BfsError::Inval("write past maximum file size"))?;

    if end > size {
        bfs_extend(bfs, inum, bfs_growth_blocks(cursor, numb, block_size))?;
        bfs_set_size(bfs, inum, end)?;
    }

    let bs = block_size as usize;
    let mut block_buffer = vec![0u8; bs];
    let mut fbn = cursor / block_size;
    let mut remaining = numb;
    let mut written = 0usize;

    while remaining != 0 {
        let cursor_block_index = cursor - fbn * block_size;
        let trail_bytes = block_size - cursor_block_index;
        let bytes_to_write = bfs_min(trail_bytes, remaining);

        // Bytes of the block outside the written span must survive.
        bfs_read(bfs, inum, fbn, &mut block_buffer)?;
        let at = cursor_block_index as usize;
        let len = bytes_to_write as usize;
        block_buffer[at..at + len].copy_from_slice(&buffer_in[written..written + len]);

        let dbn = bfs_fbn_to_dbn(bfs, inum, fbn)?;
        bfs_bd_prog(bfs, dbn, &block_buffer)?;
        bfs_trace!("write inum={} fbn={} dbn={} off={} len={}", inum, fbn, dbn, at, len);

        bfs_seek(bfs, fd, bytes_to_write, BfsWhence::Cur)?;
        cursor = bfs_tell(bfs, fd)?;
        remaining -= bytes_to_write;
        written += len;
        fbn += 1;
    }

    Ok(numb)
}
