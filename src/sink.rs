//! Output sinks for annotated frames.

use std::io::Write;

use anyhow::{Context, Result};

use crate::frame::Frame;

/// Destination for annotated frames, one per successfully processed frame.
pub trait FrameSink: Send {
    fn write_frame(&mut self, frame: &Frame) -> Result<()>;
}

/// Streams raw RGB24 bytes to stdout for a downstream transcoder or display
/// server to consume.
pub struct StdoutSink;

impl FrameSink for StdoutSink {
    fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        let stdout = std::io::stdout();
        let mut handle = stdout.lock();
        handle
            .write_all(frame.pixels())
            .context("write frame to stdout")?;
        handle.flush().context("flush stdout")?;
        Ok(())
    }
}

/// Discards frames. Used by tests and headless runs.
pub struct NullSink;

impl FrameSink for NullSink {
    fn write_frame(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}
