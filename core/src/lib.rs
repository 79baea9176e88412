//! # Aster Core
//!
//! Core crate for Aster engine basic utilities: generational storage,
//! thread-safe dirty flags, math aliases, and a scoped thread pool.

pub mod arena;
pub mod dirty;
pub mod math;
pub mod thread_pool;

pub use arena::{Arena, Handle};
pub use dirty::DirtyFlag;
pub use thread_pool::ThreadPool;

/// Core library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Log the core subsystem version.
pub fn init() {
    log::info!("Aster Core v{} initialized", VERSION);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }
}
