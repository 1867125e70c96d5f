//! # wip-store
//!
//! Reference implementations of the wip store traits.
//!
//! - [`MemoryItemStore`]: in-process item store, used by the API server and
//!   tests
//! - [`FilesystemBlobStore`]: writes uploaded media under a directory and
//!   returns public URLs

pub mod filesystem;
pub mod memory;

pub use filesystem::FilesystemBlobStore;
pub use memory::MemoryItemStore;
