//! Viewport state and coordinate conversion

mod controller;
mod coords;

pub use controller::{Viewport, ViewportConfig};
pub use coords::CoordinateSpace;
