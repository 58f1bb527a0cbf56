use bfs_rust::*;
use tempfile::tempdir;

fn fill(bfs: &mut Bfs, name: &str, data: &[u8]) {
    let fd = bfs_file_create(bfs, name).unwrap();
    assert_eq!(bfs_file_write(bfs, fd, data).unwrap() as usize, data.len());
    bfs_file_close(bfs, fd).unwrap();
}

fn slurp(bfs: &mut Bfs, name: &str) -> Vec<u8> {
    let fd = bfs_file_open(bfs, name).unwrap();
    let mut buffer = vec![0u8; bfs_file_size(bfs, fd).unwrap() as usize];
    let n = bfs_file_read(bfs, fd, &mut buffer).unwrap();
    assert_eq!(n as usize, buffer.len());
    bfs_file_close(bfs, fd).unwrap();
    buffer
}

#[test]
fn test_remount_ram_device() {
    let cfg = BfsConfig::default();
    let dev = RamBlockDevice::new(cfg.block_size, cfg.block_count);
    let mut bfs = bfs_format(Box::new(dev), &cfg).unwrap();

    let long: Vec<u8> = (0..3000u32).map(|i| (i % 251) as u8).collect();
    fill(&mut bfs, "long", &long);
    fill(&mut bfs, "short", b"hi");
    let free = bfs_fs_free(&bfs);

    let dev = bfs_unmount(bfs).unwrap();
    let mut bfs = bfs_mount(dev, &cfg).unwrap();
    assert_eq!(bfs_fs_free(&bfs), free);
    assert_eq!(slurp(&mut bfs, "long"), long);
    assert_eq!(slurp(&mut bfs, "short"), b"hi");
    assert!(matches!(bfs_file_open(&mut bfs, "nope"), Err(BfsError::NoEnt(_))));

    // Blocks freed before the remount stay free after it.
    fill(&mut bfs, "long", b"x");
    let dev = bfs_unmount(bfs).unwrap();
    let bfs = bfs_mount(dev, &cfg).unwrap();
    assert_eq!(bfs_fs_free(&bfs), free + 3000 / 512);
}

#[test]
fn test_remount_file_image() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bfs.img");
    let cfg = BfsConfig { block_count: 64, ..BfsConfig::default() };

    {
        let dev = FileBlockDevice::create(&path, cfg.block_size, cfg.block_count).unwrap();
        let mut bfs = bfs_format(Box::new(dev), &cfg).unwrap();
        fill(&mut bfs, "a", &[0x41; 600]);

        let fd = bfs_file_open(&mut bfs, "a").unwrap();
        bfs_file_seek(&mut bfs, fd, 590, BfsWhence::Set).unwrap();
        bfs_file_write(&mut bfs, fd, b"0123456789ABCDEF").unwrap();
        bfs_unmount(bfs).unwrap();
    }

    assert_eq!(std::fs::metadata(&path).unwrap().len(), 64 * 512);

    let dev = FileBlockDevice::open(&path, cfg.block_size).unwrap();
    let mut bfs = bfs_mount(Box::new(dev), &cfg).unwrap();
    let contents = slurp(&mut bfs, "a");
    assert_eq!(contents.len(), 606);
    assert!(contents[..590].iter().all(|&b| b == 0x41));
    assert_eq!(&contents[590..], b"0123456789ABCDEF");
}

#[test]
fn test_mount_blank_device_fails() {
    let cfg = BfsConfig::default();
    let dev = RamBlockDevice::new(cfg.block_size, cfg.block_count);
    let err = bfs_mount(Box::new(dev), &cfg).err().unwrap();
    assert!(matches!(err, BfsError::Corrupt(_)));
    assert_eq!(err.code(), -52);
}

#[test]
fn test_mount_geometry_mismatch_fails() {
    let cfg = BfsConfig::default();
    let dev = RamBlockDevice::new(cfg.block_size, cfg.block_count);
    let bfs = bfs_format(Box::new(dev), &cfg).unwrap();
    let dev = bfs_unmount(bfs).unwrap();

    let other = BfsConfig { inode_count: 8, ..cfg };
    assert!(matches!(bfs_mount(dev, &other), Err(BfsError::Corrupt(_))));
}

#[test]
fn test_mount_corrupt_metadata_fails() {
    let cfg = BfsConfig::default();
    let dev = RamBlockDevice::new(cfg.block_size, cfg.block_count);
    let mut bfs = bfs_format(Box::new(dev), &cfg).unwrap();
    fill(&mut bfs, "f", b"data");
    let mut dev = bfs_unmount(bfs).unwrap();

    // Inode 0 starts block 1; bytes 9..13 hold its first block number.
    // Point it at the superblock.
    let mut block = vec![0u8; cfg.block_size as usize];
    dev.read(1, &mut block).unwrap();
    block[9..13].copy_from_slice(&0u32.to_le_bytes());
    dev.prog(1, &block).unwrap();

    assert!(matches!(bfs_mount(dev, &cfg), Err(BfsError::Corrupt(_))));
}

#[test]
fn test_format_rejects_bad_config() {
    let cases = [
        BfsConfig { block_size: 100, ..BfsConfig::default() },
        BfsConfig { block_size: 32, ..BfsConfig::default() },
        BfsConfig { inode_count: 0, ..BfsConfig::default() },
        BfsConfig { name_max: 300, ..BfsConfig::default() },
        BfsConfig { block_count: 6, ..BfsConfig::default() },
    ];
    for cfg in cases {
        let dev = RamBlockDevice::new(512, 128);
        assert!(
            matches!(bfs_format(Box::new(dev), &cfg), Err(BfsError::Inval(_))),
            "{:?}",
            cfg
        );
    }
}
