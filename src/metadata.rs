use super::defines::*;
use super::dir::bfs_name_check;
use super::utils::*;

// Record sizes of the metadata stream.
fn bfs_inode_record_len(cfg: &BfsConfig) -> usize {
    1 + 4 + 4 + 4 * cfg.file_block_max as usize
}

fn bfs_dir_record_len(cfg: &BfsConfig) -> usize {
    1 + 4 + 1 + cfg.name_max as usize
}

/// Blocks reserved after the superblock for the inode table and directory.
pub fn bfs_meta_blocks(cfg: &BfsConfig) -> u32 {
    let bytes = cfg.inode_count as usize * (bfs_inode_record_len(cfg) + bfs_dir_record_len(cfg));
    bfs_div_ceil(bytes as u32, cfg.block_size)
}

pub fn bfs_superblock_new(cfg: &BfsConfig) -> BfsSuperblock {
    BfsSuperblock {
        magic: BFS_MAGIC,
        version: BFS_VERSION,
        block_size: cfg.block_size,
        block_count: cfg.block_count,
        inode_count: cfg.inode_count,
        name_max: cfg.name_max,
        file_block_max: cfg.file_block_max,
        meta_blocks: bfs_meta_blocks(cfg),
    }
}

pub fn bfs_superblock_encode(superblock: &BfsSuperblock, block_out: &mut [u8]) {
    block_out.fill(0);
    let mut off = 0;
    for word in [
        superblock.magic,
        superblock.version,
        superblock.block_size,
        superblock.block_count,
        superblock.inode_count,
        superblock.name_max,
        superblock.file_block_max,
        superblock.meta_blocks,
    ] {
        bfs_put_u32(block_out, &mut off, word);
    }
}

pub fn bfs_superblock_decode(block: &[u8]) -> Result<BfsSuperblock> {
    let mut off = 0;
    Ok(BfsSuperblock {
        magic: bfs_get_u32(block, &mut off)?,
        version: bfs_get_u32(block, &mut off)?,
        block_size: bfs_get_u32(block, &mut off)?,
        block_count: bfs_get_u32(block, &mut off)?,
        inode_count: bfs_get_u32(block, &mut off)?,
        name_max: bfs_get_u32(block, &mut off)?,
        file_block_max: bfs_get_u32(block, &mut off)?,
        meta_blocks: bfs_get_u32(block, &mut off)?,
    })
}

/// Serialize the inode table followed by the directory, padded to whole
/// metadata blocks.
pub fn bfs_meta_encode(cfg: &BfsConfig, inodes: &[BfsInode], dir: &[Option<BfsDirEntry>]) -> Vec<u8> {
    let mut buffer = vec![0u8; (bfs_meta_blocks(cfg) * cfg.block_size) as usize];
    let mut off = 0;

    for inode in inodes {
        let record_end = off + bfs_inode_record_len(cfg);
        bfs_put_u8(&mut buffer, &mut off, inode.in_use as u8);
        bfs_put_u32(&mut buffer, &mut off, inode.size);
        bfs_put_u32(&mut buffer, &mut off, inode.blocks.len() as u32);
        for &block in &inode.blocks {
            bfs_put_u32(&mut buffer, &mut off, block);
        }
        off = record_end;
    }

    for entry in dir {
        let record_end = off + bfs_dir_record_len(cfg);
        if let Some(entry) = entry {
            bfs_put_u8(&mut buffer, &mut off, 1);
            bfs_put_u32(&mut buffer, &mut off, entry.inum);
            bfs_put_u8(&mut buffer, &mut off, entry.name.len() as u8);
            buffer[off..off + entry.name.len()].copy_from_slice(entry.name.as_bytes());
        }
        off = record_end;
    }

    buffer
}

fn bfs_meta_flag(buffer: &[u8], off: &mut usize, what: &str) -> Result<bool> {
    match bfs_get_u8(buffer, off)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(BfsError::Corrupt(format!("{} flag {:#x}", what, other))),
    }
}

/// Decode the metadata stream written by [`bfs_meta_encode`], checking
/// every count and reference against the volume geometry.
pub fn bfs_meta_decode(cfg: &BfsConfig, buffer: &[u8]) -> Result<(Vec<BfsInode>, Vec<Option<BfsDirEntry>>)> {
    let mut off = 0;
    let mut inodes = Vec::with_capacity(cfg.inode_count as usize);

    for inum in 0..cfg.inode_count {
        let record_end = off + bfs_inode_record_len(cfg);
        let in_use = bfs_meta_flag(buffer, &mut off, "inode")?;
        let size = bfs_get_u32(buffer, &mut off)?;
        let nblocks = bfs_get_u32(buffer, &mut off)?;
        if nblocks > cfg.file_block_max {
            return Err(BfsError::Corrupt(format!("inode {} lists {} blocks", inum, nblocks)));
        }
        let mut blocks = Vec::with_capacity(nblocks as usize);
        for _ in 0..nblocks {
            blocks.push(bfs_get_u32(buffer, &mut off)?);
        }
        if in_use && nblocks < bfs_div_ceil(size, cfg.block_size) {
            return Err(BfsError::Corrupt(format!(
                "inode {} of {} bytes holds only {} blocks",
                inum, size, nblocks
            )));
        }
        off = record_end;

        inodes.push(if in_use {
            BfsInode { in_use, size, blocks }
        } else {
            BfsInode::default()
        });
    }

    let mut dir: Vec<Option<BfsDirEntry>> = Vec::with_capacity(cfg.inode_count as usize);
    let mut named = vec![false; cfg.inode_count as usize];
    for slot in 0..cfg.inode_count {
        let record_end = off + bfs_dir_record_len(cfg);
        if !bfs_meta_flag(buffer, &mut off, "directory")? {
            dir.push(None);
            off = record_end;
            continue;
        }

        let inum = bfs_get_u32(buffer, &mut off)?;
        let name_len = bfs_get_u8(buffer, &mut off)? as usize;
        if !inodes.get(inum as usize).is_some_and(|inode| inode.in_use) {
            return Err(BfsError::Corrupt(format!("directory slot {} names free inode {}", slot, inum)));
        }
        if named[inum as usize] {
            return Err(BfsError::Corrupt(format!("directory slot {} names inode {} twice", slot, inum)));
        }
        named[inum as usize] = true;
        if name_len == 0 || name_len > cfg.name_max as usize || off + name_len > buffer.len() {
            return Err(BfsError::Corrupt(format!("directory slot {} name length {}", slot, name_len)));
        }
        let name = String::from_utf8(buffer[off..off + name_len].to_vec())
            .map_err(|_| BfsError::Corrupt(format!("directory slot {} name is not UTF-8", slot)))?;
        bfs_name_check(cfg, &name)
            .map_err(|_| BfsError::Corrupt(format!("directory slot {} has bad name {:?}", slot, name)))?;
        if dir.iter().flatten().any(|entry| entry.name == name) {
            return Err(BfsError::Corrupt(format!("directory slot {} repeats name {:?}", slot, name)));
        }
        off = record_end;

        dir.push(Some(BfsDirEntry { name, inum }));
    }

    Ok((inodes, dir))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_geometry_leaves_data_blocks() {
        let cfg = BfsConfig::default();
        // 16 * (137 + 21) bytes
        assert_eq!(bfs_meta_blocks(&cfg), 5);
        assert!(1 + bfs_meta_blocks(&cfg) < cfg.block_count);
    }

    #[test]
    fn meta_survives_encode_decode() {
        let cfg = BfsConfig { inode_count: 3, ..BfsConfig::default() };
        let inodes = vec![
            BfsInode { in_use: true, size: 600, blocks: vec![9, 10] },
            BfsInode::default(),
            BfsInode { in_use: true, size: 0, blocks: vec![] },
        ];
        let dir = vec![
            None,
            Some(BfsDirEntry { name: "alpha".to_string(), inum: 0 }),
            Some(BfsDirEntry { name: "b".to_string(), inum: 2 }),
        ];

        let buffer = bfs_meta_encode(&cfg, &inodes, &dir);
        assert_eq!(buffer.len() % cfg.block_size as usize, 0);
        let (inodes_back, dir_back) = bfs_meta_decode(&cfg, &buffer).unwrap();
        assert_eq!(inodes_back, inodes);
        assert_eq!(dir_back, dir);
    }

    #[test]
    fn directory_pointing_at_free_inode_is_corrupt() {
        let cfg = BfsConfig { inode_count: 2, ..BfsConfig::default() };
        let inodes = vec![BfsInode::default(), BfsInode::default()];
        let dir = vec![Some(BfsDirEntry { name: "ghost".to_string(), inum: 1 }), None];

        let buffer = bfs_meta_encode(&cfg, &inodes, &dir);
        assert!(matches!(bfs_meta_decode(&cfg, &buffer), Err(BfsError::Corrupt(_))));
    }

    #[test]
    fn duplicate_directory_entries_are_corrupt() {
        let cfg = BfsConfig { inode_count: 2, ..BfsConfig::default() };
        let inodes = vec![
            BfsInode { in_use: true, size: 0, blocks: vec![] },
            BfsInode { in_use: true, size: 0, blocks: vec![] },
        ];

        let same_name = vec![
            Some(BfsDirEntry { name: "twin".to_string(), inum: 0 }),
            Some(BfsDirEntry { name: "twin".to_string(), inum: 1 }),
        ];
        let buffer = bfs_meta_encode(&cfg, &inodes, &same_name);
        assert!(matches!(bfs_meta_decode(&cfg, &buffer), Err(BfsError::Corrupt(_))));

        let same_inode = vec![
            Some(BfsDirEntry { name: "one".to_string(), inum: 0 }),
            Some(BfsDirEntry { name: "two".to_string(), inum: 0 }),
        ];
        let buffer = bfs_meta_encode(&cfg, &inodes, &same_inode);
        assert!(matches!(bfs_meta_decode(&cfg, &buffer), Err(BfsError::Corrupt(_))));
    }

    #[test]
    fn unusable_directory_names_are_corrupt() {
        let cfg = BfsConfig { inode_count: 1, ..BfsConfig::default() };
        let inodes = vec![BfsInode { in_use: true, size: 0, blocks: vec![] }];
        for name in ["..", ".", "a/b"] {
            let dir = vec![Some(BfsDirEntry { name: name.to_string(), inum: 0 })];
            let buffer = bfs_meta_encode(&cfg, &inodes, &dir);
            assert!(matches!(bfs_meta_decode(&cfg, &buffer), Err(BfsError::Corrupt(_))), "{}", name);
        }
    }

    #[test]
    fn short_inode_block_list_is_corrupt() {
        let cfg = BfsConfig { inode_count: 1, ..BfsConfig::default() };
        let inodes = vec![BfsInode { in_use: true, size: 1025, blocks: vec![7, 8] }];
        let buffer = bfs_meta_encode(&cfg, &inodes, &[None]);
        assert!(matches!(bfs_meta_decode(&cfg, &buffer), Err(BfsError::Corrupt(_))));
    }
}
