use super::defines::*;

impl BfsSpan {
    /// The whole request lies in one block.
    pub fn is_single(&self) -> bool {
        self.start_fbn == self.last_fbn
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// Map `len` bytes at `cursor` of a `size`-byte file onto file blocks,
/// clipping the request at end-of-file.
///
/// `last_fbn` is derived from the exclusive end byte, so a request ending
/// exactly on a block boundary names the following block; the read engine
/// drops that block through [`bfs_tail_len`].
pub fn bfs_span(cursor: BfsOff, len: BfsSize, size: BfsSize, block_size: BfsSize) -> BfsSpan {
    let start_fbn = cursor / block_size;
    let first_off = cursor - start_fbn * block_size;

    if cursor >= size {
        return BfsSpan { start_fbn, last_fbn: start_fbn, first_off, len: 0 };
    }

    let mut len = len;
    let mut last_byte = cursor.saturating_add(len);
    if last_byte > size {
        last_byte = size;
        len = size - cursor;
    }

    let mut last_fbn = last_byte / block_size;
    let file_last_fbn = size / block_size;
    if last_fbn > file_last_fbn {
        last_fbn = file_last_fbn;
    }

    BfsSpan { start_fbn, last_fbn, first_off, len }
}

/// Bytes copied out of the last block of a multi-block span. Zero means the
/// span ends on a block boundary and the last block is not touched.
pub fn bfs_tail_len(span: &BfsSpan, block_size: BfsSize) -> BfsSize {
    (span.len - (block_size - span.first_off)) % block_size
}

/// Block count requested when a write ends at `cursor + len`. Always one
/// more than the blocks the end offset falls in.
pub fn bfs_growth_blocks(cursor: BfsOff, len: BfsSize, block_size: BfsSize) -> u32 {
    (cursor + len) / block_size + 1
}
