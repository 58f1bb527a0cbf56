use super::defines::*;

/// Per-block trace logging, enabled by the `bfs_trace` feature.
macro_rules! bfs_trace {
    ($($arg:tt)*) => {
        if cfg!(feature = "bfs_trace") {
            log::trace!($($arg)*);
        }
    };
}

#[inline]
pub fn bfs_min(a: u32, b: u32) -> u32 {
    if a < b { a } else { b }
}

#[inline]
pub fn bfs_div_ceil(a: u32, b: u32) -> u32 {
    a / b + if a % b != 0 { 1 } else { 0 }
}

/// Buffer length as a byte count, saturating at the largest file offset.
#[inline]
pub fn bfs_clamp_len(len: usize) -> BfsSize {
    BfsSize::try_from(len).unwrap_or(BfsSize::MAX)
}

pub fn bfs_put_u8(buffer: &mut [u8], off: &mut usize, value: u8) {
    buffer[*off] = value;
    *off += 1;
}

pub fn bfs_put_u32(buffer: &mut [u8], off: &mut usize, value: u32) {
    buffer[*off..*off + 4].copy_from_slice(&value.to_le_bytes());
    *off += 4;
}

pub fn bfs_get_u8(buffer: &[u8], off: &mut usize) -> Result<u8> {
    let value = *buffer
        .get(*off)
        .ok_or_else(|| BfsError::Corrupt(format!("metadata truncated at byte {}", off)))?;
    *off += 1;
    Ok(value)
}

pub fn bfs_get_u32(buffer: &[u8], off: &mut usize) -> Result<u32> {
    let bytes = buffer
        .get(*off..*off + 4)
        .ok_or_else(|| BfsError::Corrupt(format!("metadata truncated at byte {}", off)))?;
    let mut word = [0u8; 4];
    word.copy_from_slice(bytes);
    *off += 4;
    Ok(u32::from_le_bytes(word))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn div_ceil_rounds_up_only_on_remainder() {
        assert_eq!(bfs_div_ceil(0, 512), 0);
        assert_eq!(bfs_div_ceil(512, 512), 1);
        assert_eq!(bfs_div_ceil(513, 512), 2);
    }

    #[test]
    fn clamp_len_saturates() {
        assert_eq!(bfs_clamp_len(600), 600);
        assert_eq!(bfs_clamp_len(usize::MAX), BfsSize::MAX);
    }

    #[test]
    fn get_past_end_is_corrupt() {
        let buffer = [1u8, 0, 0];
        let mut off = 0;
        assert!(matches!(bfs_get_u32(&buffer, &mut off), Err(BfsError::Corrupt(_))));
        assert_eq!(off, 0);
    }
}
