//! Bounded event window: cache state and the maintainer that keeps it.

pub mod maintainer;
pub mod memory;

pub use maintainer::{EventWindow, WindowSnapshot};
pub use memory::WindowMemory;

/// How a window computation gathered its candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowMode {
    /// Reused the cached ids without fetching new events.
    Cached,
    /// Fetched events above the watermark.
    Incremental,
    /// Rebuilt from a per-source scan.
    ColdStart,
}

impl WindowMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindowMode::Cached => "cached",
            WindowMode::Incremental => "incremental",
            WindowMode::ColdStart => "cold_start",
        }
    }
}

impl std::fmt::Display for WindowMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
