//! Buffered live-region output.
//!
//! A [`LiveWriter`] collects one frame of text between flushes. Each flush
//! erases the frame drawn by the previous flush and draws the new one in its
//! place, leaving the cursor parked on the frame's first line so the cycle
//! can repeat. Output that must survive redrawing (ordinary log lines) goes
//! through [`LiveWriter::bypass_write`] and lands above the live region.
//!
//! When ANSI mode is off (the target is not a terminal, or a capture buffer
//! in tests), no control sequences are emitted and frames are appended
//! verbatim.

use std::io::{self, Write};
use std::mem;

use ansi_escapes::{CursorLeft, CursorPrevLine, EraseDown};

/// A sink that redraws its output in place.
///
/// Implements [`Write`] by buffering; nothing reaches the target until
/// [`flush`](Write::flush).
pub struct LiveWriter {
    target: Box<dyn Write + Send>,
    buf: Vec<u8>,
    ansi: bool,
    /// Whether a frame is currently on screen below the parked cursor.
    frame_drawn: bool,
}

impl LiveWriter {
    /// Wraps `target` with ANSI redrawing enabled.
    pub fn new<W: Write + Send + 'static>(target: W) -> LiveWriter {
        LiveWriter::with_ansi(target, true)
    }

    /// Wraps `target`, emitting ANSI control sequences only if `ansi` is true.
    pub fn with_ansi<W: Write + Send + 'static>(target: W, ansi: bool) -> LiveWriter {
        LiveWriter {
            target: Box::new(target),
            buf: Vec::new(),
            ansi,
            frame_drawn: false,
        }
    }

    /// Replaces the destination for subsequent flushes. Any buffered frame
    /// data and the ANSI mode are kept; the previous target is dropped with
    /// its last frame still on screen.
    pub fn set_target<W: Write + Send + 'static>(&mut self, target: W) {
        self.target = Box::new(target);
        self.frame_drawn = false;
    }

    /// Writes `buf` straight to the target, bypassing the frame buffer.
    ///
    /// The on-screen frame is erased first, so the bypassed output takes its
    /// place; the next flush redraws the frame below it. Callers should end
    /// their output with a newline, otherwise the next frame starts on the
    /// same line.
    pub fn bypass_write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.frame_drawn {
            write!(self.target, "{}", EraseDown)?;
            self.frame_drawn = false;
        }
        self.target.write(buf)
    }

    /// Flushes the target without touching the frame buffer.
    pub fn bypass_flush(&mut self) -> io::Result<()> {
        self.target.flush()
    }
}

impl Write for LiveWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(buf);
        Ok(buf.len())
    }

    /// Replaces the previously flushed frame with the buffered one.
    ///
    /// A frame that fails to reach the target is dropped, not retried.
    fn flush(&mut self) -> io::Result<()> {
        let frame = mem::take(&mut self.buf);
        if self.ansi {
            write!(self.target, "{}", EraseDown)?;
            self.target.write_all(&frame)?;
            let lines = frame.iter().filter(|b| **b == b'\n').count();
            write!(self.target, "{}", CursorLeft)?;
            for _ in 0..lines {
                write!(self.target, "{}", CursorPrevLine)?;
            }
            self.frame_drawn = true;
        } else {
            self.target.write_all(&frame)?;
        }
        self.target.flush()
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::sync::Arc;

    use ansi_escapes::{CursorLeft, CursorPrevLine, EraseDown};
    use parking_lot::Mutex;

    use super::LiveWriter;

    #[derive(Clone, Default)]
    struct Capture(Arc<Mutex<Vec<u8>>>);

    impl Capture {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().clone()).unwrap()
        }
    }

    impl Write for Capture {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    /// Plain mode appends frames without control sequences.
    #[test]
    fn plain_mode_appends_frames() {
        let cap = Capture::default();
        let mut w = LiveWriter::with_ansi(cap.clone(), false);

        writeln!(w, "one").unwrap();
        w.flush().unwrap();
        writeln!(w, "two").unwrap();
        w.flush().unwrap();

        assert_eq!(cap.contents(), "one\ntwo\n");
    }

    /// Each ANSI flush erases the previous frame and re-parks the cursor.
    #[test]
    fn ansi_flush_overwrites_previous_frame() {
        let cap = Capture::default();
        let mut w = LiveWriter::new(cap.clone());

        writeln!(w, "a\nb").unwrap();
        w.flush().unwrap();

        let expected = format!("{}a\nb\n{}{}{}", EraseDown, CursorLeft, CursorPrevLine, CursorPrevLine);
        assert_eq!(cap.contents(), expected);

        writeln!(w, "c").unwrap();
        w.flush().unwrap();

        let expected = format!(
            "{}{}c\n{}{}",
            expected, EraseDown, CursorLeft, CursorPrevLine
        );
        assert_eq!(cap.contents(), expected);
    }

    /// The frame buffer drains on flush; frames never duplicate.
    #[test]
    fn buffer_drains_between_flushes() {
        let cap = Capture::default();
        let mut w = LiveWriter::with_ansi(cap.clone(), false);

        writeln!(w, "frame").unwrap();
        w.flush().unwrap();
        w.flush().unwrap();

        assert_eq!(cap.contents(), "frame\n");
    }

    /// Bypassed output erases the frame once and is not buffered.
    #[test]
    fn bypass_erases_frame_once() {
        let cap = Capture::default();
        let mut w = LiveWriter::new(cap.clone());

        writeln!(w, "bar").unwrap();
        w.flush().unwrap();
        let after_frame = cap.contents();

        w.bypass_write(b"log 1\n").unwrap();
        w.bypass_write(b"log 2\n").unwrap();

        let expected = format!("{}{}log 1\nlog 2\n", after_frame, EraseDown);
        assert_eq!(cap.contents(), expected);
    }

    /// Swapping the target routes subsequent frames to the new sink only.
    #[test]
    fn set_target_switches_sinks() {
        let first = Capture::default();
        let second = Capture::default();
        let mut w = LiveWriter::with_ansi(first.clone(), false);

        writeln!(w, "to first").unwrap();
        w.flush().unwrap();

        w.set_target(second.clone());
        writeln!(w, "to second").unwrap();
        w.flush().unwrap();

        assert_eq!(first.contents(), "to first\n");
        assert_eq!(second.contents(), "to second\n");
    }
}
