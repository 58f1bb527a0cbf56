//! Byte-stream file I/O over a minimal single-volume block file system.
//!
//! Reads and writes of any length at any offset are translated into whole
//! block operations on a [`BlockDevice`]. Each open file carries a cursor;
//! writes past the end grow the file's block list first.
//!
//! ```
//! use bfs_rust::*;
//!
//! let cfg = BfsConfig::default();
//! let dev = RamBlockDevice::new(cfg.block_size, cfg.block_count);
//! let mut bfs = bfs_format(Box::new(dev), &cfg).unwrap();
//!
//! let fd = bfs_file_create(&mut bfs, "hello").unwrap();
//! bfs_file_write(&mut bfs, fd, b"hello, world").unwrap();
//! bfs_file_seek(&mut bfs, fd, 7, BfsWhence::Set).unwrap();
//!
//! let mut buffer = [0u8; 16];
//! let n = bfs_file_read(&mut bfs, fd, &mut buffer).unwrap();
//! assert_eq!(&buffer[..n as usize], b"world");
//! ```
//!
//! Data blocks come into use only by growing a file; the allocator is not
//! part of the public API.
//!
//! ```compile_fail
//! use bfs_rust::bfs_alloc;
//! ```

#[macro_use]
mod utils;

mod allocator;
mod bfs;
mod block_device;
mod defines;
mod dir;
mod file;
mod inode;
mod metadata;
mod oft;
mod translator;

pub use bfs::*;
pub use block_device::*;
pub use defines::*;
pub use dir::{bfs_create_file, bfs_lookup_file};
pub use file::*;
pub use inode::{bfs_block_count, bfs_extend, bfs_fbn_to_dbn, bfs_get_size, bfs_read, bfs_set_size};
pub use oft::{bfs_deref_oft, bfs_fd_to_inum, bfs_inum_to_fd, bfs_tell};
pub use translator::*;
