//! # multibar
//!
//! This crate renders one or more live-updating progress bars to a
//! terminal. Callers add units of work to a [`Progress`] container and
//! advance them from any thread; a background thread periodically
//! redraws the whole set in place, until the container is stopped and a
//! final frame is left on screen.
//!
//! The container is the coordination point: adding, removing and rendering
//! bars all serialize through it, so frames never tear even while worker
//! threads mutate bars concurrently. The bars themselves are cheap
//! [`Arc`](std::sync::Arc)-backed handles with atomic counters, so
//! advancing one never contends with rendering.
//!
//! ## Example
//! ```rust
//! use multibar::Progress;
//!
//! let progress = Progress::new();    // draws to stderr
//! let bar = progress.add_bar(100);
//! progress.start();                  // background redraw loop
//!
//! while bar.incr() {
//!     // ... a unit of work ...
//! }
//!
//! progress.stop();                   // final frame, then the loop exits
//! ```
//!
//! Ordinary output written while bars are on screen would be overwritten by
//! the next frame; route it through [`Progress::bypass`] instead and it
//! stays above the live region.
//!
//! For the common single-container case the crate also exposes a
//! process-wide default drawing to stderr: [`add_bar`], [`start`], [`stop`]
//! and friends delegate to a lazily created [`Progress`].

mod bar;
mod progress;
pub mod writer;

pub use bar::Bar;
pub use progress::{Bypass, Options, Progress, DEFAULT_REFRESH_INTERVAL};

use once_cell::sync::Lazy;

/// The process-wide default container, created on first use.
static DEFAULT: Lazy<Progress> = Lazy::new(Progress::new);

/// Adds a bar to the default container.
pub fn add_bar(total: u64) -> Bar {
    DEFAULT.add_bar(total)
}

/// Removes a bar from the default container.
pub fn remove_bar(bar: &Bar) -> bool {
    DEFAULT.remove_bar(bar)
}

/// Starts the default container's refresh loop.
pub fn start() {
    DEFAULT.start()
}

/// Stops the default container's refresh loop, drawing one final frame.
pub fn stop() {
    DEFAULT.stop()
}

/// Renders one frame of the default container.
pub fn refresh() {
    DEFAULT.refresh()
}

/// A writer whose output persists above the default container's bars.
pub fn bypass() -> Bypass<'static> {
    DEFAULT.bypass()
}
