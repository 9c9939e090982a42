//! Tile storage: decoded textures in memory, retrieved files on disk.

mod memory;
mod store;

pub use memory::{CacheStats, MemoryTextureCache, TextureCache, DEFAULT_MEMORY_SIZE};
pub use store::{FileStore, SaveToFileProcessor};
