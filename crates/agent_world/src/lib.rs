//! World knowledge: the [`KnowledgeBase`] of learned entity facts and the
//! [`MapCache`] of scanned tiles. Both are append-mostly stores persisted
//! as JSON under a configurable data directory, loaded once at process
//! start and saved atomically on an interval and at shutdown.

pub mod knowledge_base;
pub mod map_cache;
pub mod persistence;
pub mod records;

pub use knowledge_base::KnowledgeBase;
pub use map_cache::MapCache;
