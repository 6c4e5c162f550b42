// Progress reporting for the two slow phases of an upload: buffering the
// artifact into the multipart body and sending that body.
//
// `ProgressReader` and `ProgressWriter` are plain stream decorators: every
// call is forwarded untouched and only the byte count is reported to a
// `ProgressSink`. Rendering (and its throttling) belongs to the sink.

use std::io::{self, Read, Write};
use std::sync::Arc;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

/// Default redraw interval for terminal bars.
pub const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

/// Consumer of byte-count updates.
pub trait ProgressSink: Send + Sync {
    fn advance(&self, bytes: u64);
    fn finish(&self);
}

/// Creates one sink per phase, sized to the number of bytes expected.
pub trait ProgressFactory: Send + Sync {
    fn start(&self, total: u64) -> Arc<dyn ProgressSink>;
}

impl<F: ProgressFactory + ?Sized> ProgressFactory for Arc<F> {
    fn start(&self, total: u64) -> Arc<dyn ProgressSink> {
        (**self).start(total)
    }
}

impl ProgressSink for ProgressBar {
    fn advance(&self, bytes: u64) {
        self.inc(bytes);
    }

    fn finish(&self) {
        ProgressBar::finish(self);
    }
}

/// Renders byte progress bars on stderr. Redraws are rate limited by the
/// draw target, so fast writes do not flood the terminal. Nothing is drawn
/// when stderr is not a terminal.
#[derive(Debug, Clone)]
pub struct TerminalProgress {
    refresh: Duration,
}

impl TerminalProgress {
    pub fn new(refresh: Duration) -> Self {
        TerminalProgress { refresh }
    }

    fn refresh_hz(&self) -> u8 {
        let millis = self.refresh.as_millis().max(1);
        (1000 / millis).clamp(1, u8::MAX as u128) as u8
    }
}

impl Default for TerminalProgress {
    fn default() -> Self {
        Self::new(REFRESH_INTERVAL)
    }
}

impl ProgressFactory for TerminalProgress {
    fn start(&self, total: u64) -> Arc<dyn ProgressSink> {
        let style = ProgressStyle::with_template(
            "{bytes}/{total_bytes} [{bar:40}] {percent}% {bytes_per_sec} {eta}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> ");
        let bar = ProgressBar::with_draw_target(
            Some(total),
            ProgressDrawTarget::stderr_with_hz(self.refresh_hz()),
        )
        .with_style(style);
        Arc::new(bar)
    }
}

/// `Read` decorator that reports every byte read.
pub struct ProgressReader<R> {
    inner: R,
    sink: Arc<dyn ProgressSink>,
}

impl<R: Read> ProgressReader<R> {
    pub fn new(inner: R, sink: Arc<dyn ProgressSink>) -> Self {
        ProgressReader { inner, sink }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> Read for ProgressReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        if n > 0 {
            self.sink.advance(n as u64);
        } else if !buf.is_empty() {
            self.sink.finish();
        }
        Ok(n)
    }
}

/// `Write` decorator that reports every byte accepted by the inner writer.
pub struct ProgressWriter<W> {
    inner: W,
    sink: Arc<dyn ProgressSink>,
}

impl<W: Write> ProgressWriter<W> {
    pub fn new(inner: W, sink: Arc<dyn ProgressSink>) -> Self {
        ProgressWriter { inner, sink }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for ProgressWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.sink.advance(n as u64);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
