pub mod app;
pub mod compositor;
pub mod document;
pub mod event_source;
pub mod geometry;
pub mod gesture;
pub mod host;
pub mod mode;
pub mod overlay;
pub mod panic_handler;
pub mod paths;
pub mod regions;
pub mod render;
pub mod resample;
pub mod session;
pub mod settings;
pub mod viewport;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

// Re-export main app components
pub use app::{App, AppConfig, AppEvent};
pub use document::DocumentSource;
pub use mode::Mode;
