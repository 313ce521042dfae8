//! Progress state for a single bar.

use std::fmt;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

/// Width given to bars created outside a container.
const DEFAULT_WIDTH: usize = 70;

/// One unit of trackable progress.
///
/// `Bar` is a cheap-to-clone handle: clones share the same counters, so a
/// worker thread can advance a bar while another thread renders it. The
/// counters are atomics, making every mutator `&self` and thread-safe.
///
/// Rendering goes through [`Display`](fmt::Display) and produces a single
/// line sized to the configured width, e.g. `[===>------]  42%`. The
/// rendered text is a snapshot of the counters at the moment of the call.
#[derive(Clone)]
pub struct Bar {
    inner: Arc<Inner>,
}

struct Inner {
    total: u64,
    current: AtomicU64,
    width: AtomicUsize,
}

impl Bar {
    /// Creates a bar with zero progress out of `total`.
    ///
    /// A `total` of zero is clamped to 1, so completion arithmetic is always
    /// defined and a freshly created bar is simply "not done yet".
    pub fn new(total: u64) -> Bar {
        Bar {
            inner: Arc::new(Inner {
                total: total.max(1),
                current: AtomicU64::new(0),
                width: AtomicUsize::new(DEFAULT_WIDTH),
            }),
        }
    }

    /// Sets the current value. Values past the total are clamped to it.
    pub fn set(&self, n: u64) {
        self.inner
            .current
            .store(n.min(self.inner.total), Ordering::Relaxed);
    }

    /// Advances the bar by one. Returns `false` once the bar is full, which
    /// makes `while bar.incr() { ... }` loop exactly `total` times.
    pub fn incr(&self) -> bool {
        self.inner
            .current
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
                if current < self.inner.total {
                    Some(current + 1)
                } else {
                    None
                }
            })
            .is_ok()
    }

    /// The current value.
    pub fn current(&self) -> u64 {
        self.inner.current.load(Ordering::Relaxed)
    }

    /// The total this bar counts towards.
    pub fn total(&self) -> u64 {
        self.inner.total
    }

    /// Completion as a whole number from 0 to 100.
    pub fn percent(&self) -> u64 {
        let current = self.current().min(self.inner.total);
        // u128 keeps the product exact for totals near u64::MAX.
        (100u128 * current as u128 / self.inner.total as u128) as u64
    }

    /// Whether the bar has reached its total.
    pub fn is_done(&self) -> bool {
        self.current() >= self.inner.total
    }

    /// The rendering width in characters, excluding brackets and percentage.
    pub fn width(&self) -> usize {
        self.inner.width.load(Ordering::Relaxed)
    }

    /// Sets the rendering width; takes effect on the next render.
    pub fn set_width(&self, width: usize) {
        self.inner.width.store(width, Ordering::Relaxed);
    }

    /// Whether `other` is a handle to this same bar. This is the identity
    /// the container uses for removal.
    pub fn ptr_eq(&self, other: &Bar) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Display for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let total = self.inner.total;
        let current = self.current().min(total);
        let width = self.width();

        let body = if current >= total {
            "=".repeat(width)
        } else {
            // filled < width whenever current < total, so the head fits.
            let filled = (width as u128 * current as u128 / total as u128) as usize;
            if filled == 0 {
                "-".repeat(width)
            } else {
                format!("{}>{}", "=".repeat(filled - 1), "-".repeat(width - filled))
            }
        };
        let percent = 100u128 * current as u128 / total as u128;
        write!(f, "[{}] {:3}%", body, percent)
    }
}

impl fmt::Debug for Bar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bar")
            .field("current", &self.current())
            .field("total", &self.inner.total)
            .finish()
    }
}
