// --- Primitive Type Aliases ---
pub type BfsSize = u32;
pub type BfsOff = u32;
pub type BfsSOff = i32;
pub type BfsBlock = u32;
pub type BfsInum = u32;

pub type Result<T> = core::result::Result<T, BfsError>;

// --- Constants ---

/// Superblock magic, "BFS1".
pub const BFS_MAGIC: u32 = 0x4246_5331;
pub const BFS_VERSION: u32 = 1;

/// Block number of the superblock.
pub const BFS_SUPER_BLOCK: BfsBlock = 0;

pub const BFS_DEFAULT_BLOCK_SIZE: BfsSize = 512;
pub const BFS_DEFAULT_BLOCK_COUNT: BfsSize = 128;
pub const BFS_DEFAULT_INODE_COUNT: u32 = 16;
pub const BFS_DEFAULT_OPEN_MAX: u32 = 20;
pub const BFS_DEFAULT_NAME_MAX: u32 = 15;
pub const BFS_DEFAULT_FILE_BLOCK_MAX: u32 = 32;

// --- Enums ---

/// Error codes. `code()` yields the negative errno the C-style API used.
#[derive(Debug, thiserror::Error)]
pub enum BfsError {
    #[error("I/O error during device operation: {0}")]
    Io(#[from] std::io::Error),
    #[error("corrupted: {0}")]
    Corrupt(String),
    #[error("no such file: {0}")]
    NoEnt(String),
    #[error("invalid argument: {0}")]
    Inval(&'static str),
    #[error("no space left on device")]
    NoSpc,
    #[error("file name too long")]
    NameTooLong,
    #[error("bad file descriptor {0}")]
    BadFd(u32),
    #[error("too many open files")]
    NFile,
}

impl BfsError {
    pub fn code(&self) -> i32 {
        match self {
            BfsError::Io(_) => -5,
            BfsError::Corrupt(_) => -52,
            BfsError::NoEnt(_) => -2,
            BfsError::Inval(_) => -22,
            BfsError::NoSpc => -28,
            BfsError::NameTooLong => -36,
            BfsError::BadFd(_) => -9,
            BfsError::NFile => -23,
        }
    }
}

/// File seek flags.
#[repr(i32)]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum BfsWhence {
    Set = 0, // Seek relative to an absolute position
    Cur = 1, // Seek relative to the current file position
    End = 2, // Seek relative to the end of the file
}

impl TryFrom<i32> for BfsWhence {
    type Error = BfsError;

    fn try_from(raw: i32) -> Result<Self> {
        match raw {
            0 => Ok(BfsWhence::Set),
            1 => Ok(BfsWhence::Cur),
            2 => Ok(BfsWhence::End),
            _ => Err(BfsError::Inval("unknown whence")),
        }
    }
}

// --- Structs ---

/// Geometry and table limits of a volume.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BfsConfig {
    /// Bytes per block; a power of two, at least 64.
    pub block_size: BfsSize,
    /// Total blocks on the device, superblock and metadata included.
    pub block_count: BfsSize,
    /// Number of inodes, which is also the number of directory entries.
    pub inode_count: u32,
    /// Number of slots in the open-file table.
    pub open_max: u32,
    /// Longest file name in bytes.
    pub name_max: u32,
    /// Longest block list a single file may hold.
    pub file_block_max: u32,
}

impl Default for BfsConfig {
    fn default() -> Self {
        Self {
            block_size: BFS_DEFAULT_BLOCK_SIZE,
            block_count: BFS_DEFAULT_BLOCK_COUNT,
            inode_count: BFS_DEFAULT_INODE_COUNT,
            open_max: BFS_DEFAULT_OPEN_MAX,
            name_max: BFS_DEFAULT_NAME_MAX,
            file_block_max: BFS_DEFAULT_FILE_BLOCK_MAX,
        }
    }
}

/// Opaque handle into the open-file table.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct BfsFd(pub(crate) u32);

impl BfsFd {
    pub fn raw(self) -> u32 {
        self.0
    }
}

/// In-memory inode: authoritative size and block list of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BfsInode {
    pub in_use: bool,
    pub size: BfsSize,
    pub blocks: Vec<BfsBlock>,
}

/// One directory slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfsDirEntry {
    pub name: String,
    pub inum: BfsInum,
}

/// Open-file table slot.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BfsOpenFile {
    pub inum: BfsInum,
    pub cursor: BfsOff,
    pub refs: u32,
}

/// On-disk superblock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BfsSuperblock {
    pub magic: u32,
    pub version: u32,
    pub block_size: BfsSize,
    pub block_count: BfsSize,
    pub inode_count: u32,
    pub name_max: u32,
    pub file_block_max: u32,
    pub meta_blocks: u32,
}

/// Block range touched by a byte request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BfsSpan {
    pub start_fbn: BfsBlock,
    pub last_fbn: BfsBlock,
    /// Byte offset of the cursor inside `start_fbn`.
    pub first_off: BfsOff,
    /// Request length after end-of-file clipping.
    pub len: BfsSize,
}

/// Free-block map over the data region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfsFree {
    /// First data block; everything below is superblock and metadata.
    pub start: BfsBlock,
    /// `used[i]` tracks block `start + i`.
    pub used: Vec<bool>,
}

/// Open-file table; a descriptor is an index into `slots`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BfsOft {
    pub slots: Vec<Option<BfsOpenFile>>,
}
