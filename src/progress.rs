//! The concurrent rendering container.
//!
//! [`Progress`] owns an ordered collection of [`Bar`]s and redraws them in
//! place on a fixed interval from a background thread. Every collection and
//! configuration change goes through one coordination lock, so a frame
//! always sees a consistent collection and two frames never interleave on
//! the sink. Bar counters are *not* covered by that lock; they are atomics
//! owned by the bars themselves.

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};
use terminal_size::{terminal_size, Width};

use crate::bar::Bar;
use crate::writer::LiveWriter;

/// Default time to wait between frames of the background loop.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_millis(10);

/// Options controlling a container's rendering defaults.
pub struct Options {
    /// Width, in characters, given to newly added bars. Defaults to half
    /// the terminal width, or 70 columns when there is no terminal.
    pub width: usize,
    /// How long the background loop waits between frames.
    pub refresh_interval: Duration,
    /// Whether the sink understands ANSI control sequences. With `false`,
    /// frames are appended to the sink instead of redrawn in place.
    pub ansi: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            width: default_width(),
            refresh_interval: DEFAULT_REFRESH_INTERVAL,
            ansi: true,
        }
    }
}

fn default_width() -> usize {
    terminal_size().map(|(Width(w), _)| w as usize / 2).unwrap_or(70)
}

enum LoopState {
    Idle,
    Running {
        stop: Sender<()>,
        handle: JoinHandle<()>,
    },
    Stopped,
}

struct Inner {
    bars: Vec<Bar>,
    out: LiveWriter,
    width: usize,
    interval: Duration,
    state: LoopState,
}

/// A container that renders a collection of progress bars.
///
/// Bars are appended with [`add_bar`](Progress::add_bar) and render in
/// insertion order, one line each. [`start`](Progress::start) spawns a
/// background thread that redraws the whole set on the refresh interval;
/// [`stop`](Progress::stop) draws one final frame and joins it. A container
/// that is never started can still be rendered manually with
/// [`refresh`](Progress::refresh).
///
/// `Progress` is `Send + Sync`; share it behind an [`Arc`] (or borrow it
/// across scoped threads) and hand each worker its own [`Bar`] handle.
pub struct Progress {
    inner: Arc<Mutex<Inner>>,
}

impl Progress {
    /// Creates a container drawing to stderr with default [`Options`].
    ///
    /// ANSI redrawing is enabled only when stderr is a terminal, so piping
    /// the output degrades to plain appended frames.
    pub fn new() -> Progress {
        let ansi = atty::is(atty::Stream::Stderr);
        Progress::with_options(io::stderr(), Options { ansi, ..Options::default() })
    }

    /// Creates a container with a custom sink and options.
    ///
    /// Nothing is written to `out` until the background loop starts or
    /// [`refresh`](Progress::refresh) is called.
    pub fn with_options<W: Write + Send + 'static>(out: W, options: Options) -> Progress {
        Progress {
            inner: Arc::new(Mutex::new(Inner {
                bars: Vec::new(),
                out: LiveWriter::with_ansi(out, options.ansi),
                width: options.width,
                interval: options.refresh_interval,
                state: LoopState::Idle,
            })),
        }
    }

    /// Creates a bar with the container's current default width and appends
    /// it to the render order. The returned handle advances the bar.
    pub fn add_bar(&self, total: u64) -> Bar {
        let mut inner = self.inner.lock();
        let bar = Bar::new(total);
        bar.set_width(inner.width);
        inner.bars.push(bar.clone());
        bar
    }

    /// Detaches `bar` from the container, comparing by handle identity.
    ///
    /// Returns `false` when the bar is not (or no longer) in the collection;
    /// the remaining bars keep their order either way. Removal does not
    /// touch the bar itself, so a detached handle stays usable.
    pub fn remove_bar(&self, bar: &Bar) -> bool {
        let mut inner = self.inner.lock();
        match inner.bars.iter().position(|b| b.ptr_eq(bar)) {
            Some(i) => {
                inner.bars.remove(i);
                true
            }
            None => false,
        }
    }

    /// Handles to the bars currently in the collection, in render order.
    pub fn bars(&self) -> Vec<Bar> {
        self.inner.lock().bars.clone()
    }

    /// Replaces the output sink. The next frame goes to `out`; a frame
    /// already being written keeps the old sink.
    pub fn set_output<W: Write + Send + 'static>(&self, out: W) {
        self.inner.lock().out.set_target(out);
    }

    /// Sets the wait between frames. The background loop picks the change
    /// up for its *next* wait; a wait already in progress runs to its
    /// original length.
    pub fn set_refresh_interval(&self, interval: Duration) {
        self.inner.lock().interval = interval;
    }

    /// Sets the width given to bars added from now on. Bars already in the
    /// collection keep theirs; use [`Bar::set_width`] to resize those.
    pub fn set_width(&self, width: usize) {
        self.inner.lock().width = width;
    }

    /// Renders one frame synchronously: every bar in insertion order, one
    /// line each, flushed to the sink.
    ///
    /// This is what the background loop calls on every tick, but it does
    /// not require the loop to be running.
    pub fn refresh(&self) {
        render(&mut self.inner.lock());
    }

    /// Spawns the background refresh loop and returns immediately.
    ///
    /// Calling `start` on a container that is already running, or that has
    /// been stopped, is a misuse and a no-op; a second competing loop is
    /// never spawned.
    pub fn start(&self) {
        let mut inner = self.inner.lock();
        if !matches!(inner.state, LoopState::Idle) {
            return;
        }
        let (stop_tx, stop_rx) = mpsc::channel();
        let shared = Arc::clone(&self.inner);
        let handle = thread::spawn(move || run_loop(&shared, &stop_rx));
        inner.state = LoopState::Running {
            stop: stop_tx,
            handle,
        };
    }

    /// Signals the background loop, waits for its final frame, and joins
    /// the thread. When `stop` returns, no further frames will be written.
    ///
    /// A no-op unless the loop is running, so double-stop and
    /// stop-without-start cannot deadlock.
    pub fn stop(&self) {
        let mut inner = self.inner.lock();
        if !matches!(inner.state, LoopState::Running { .. }) {
            return;
        }
        let state = std::mem::replace(&mut inner.state, LoopState::Stopped);
        // The final frame needs the lock; release it before the handshake.
        drop(inner);
        if let LoopState::Running { stop, handle } = state {
            let _ = stop.send(());
            let _ = handle.join();
        }
    }

    /// Returns a writer for output that should persist above the bars,
    /// e.g. ordinary log lines interleaved with progress rendering.
    ///
    /// The handle holds the coordination lock, pausing frames until it is
    /// dropped; whatever it writes is not overwritten by the next frame.
    pub fn bypass(&self) -> Bypass<'_> {
        Bypass {
            inner: self.inner.lock(),
        }
    }
}

impl Default for Progress {
    fn default() -> Self {
        Progress::new()
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        // Leaves the final frame on screen, unlike an erase-on-drop.
        self.stop();
    }
}

fn run_loop(shared: &Mutex<Inner>, stop: &Receiver<()>) {
    loop {
        // Re-read on every iteration so interval changes apply to the
        // next wait, never the one in flight.
        let interval = shared.lock().interval;
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => render(&mut shared.lock()),
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                render(&mut shared.lock());
                return;
            }
        }
    }
}

fn render(inner: &mut Inner) {
    let Inner { bars, out, .. } = inner;
    for bar in bars.iter() {
        // Infallible: this only fills the frame buffer.
        let _ = writeln!(out, "{}", bar);
    }
    if let Err(e) = out.flush() {
        log::warn!("dropping progress frame: {}", e);
    }
}

/// Write access to the terminal region above the bars.
///
/// Returned by [`Progress::bypass`]; see there for the locking caveat.
pub struct Bypass<'a> {
    inner: MutexGuard<'a, Inner>,
}

impl Write for Bypass<'_> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.out.bypass_write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.out.bypass_flush()
    }
}
