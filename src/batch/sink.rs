use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use parking_lot::Mutex;

use super::types::ProbeResult;

const SINK_BUFFER: usize = 64 * 1024;

/// Receives every delivered result exactly once, as it completes.
///
/// `record` runs on the batch's driving task and must not block; buffered
/// output is pushed out by `flush`, which the runner calls once per batch
/// on the blocking pool.
pub trait ResultSink: Send + Sync {
    fn record(&self, result: &ProbeResult) -> io::Result<()>;

    fn flush(&self) -> io::Result<()> {
        Ok(())
    }
}

/// Appends one JSON object per line. Lines are buffered until [`flush`](ResultSink::flush).
pub struct NdjsonSink {
    out: Mutex<BufWriter<File>>,
}

impl NdjsonSink {
    pub fn append(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            out: Mutex::new(BufWriter::with_capacity(SINK_BUFFER, file)),
        })
    }
}

impl ResultSink for NdjsonSink {
    fn record(&self, result: &ProbeResult) -> io::Result<()> {
        let line = serde_json::to_string(result).map_err(io::Error::other)?;
        writeln!(self.out.lock(), "{line}")
    }

    fn flush(&self) -> io::Result<()> {
        self.out.lock().flush()
    }
}
