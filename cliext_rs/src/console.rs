//! Output sink shared by commands, the error reporter and the log layer.
//!
//! A [`Console`] is either the real process stdio or a set of in-memory
//! buffers. Everything the framework prints goes through one, so the test
//! harness can capture exactly what a user would see.

use std::io::{self, Write};
use std::sync::{Arc, Mutex, MutexGuard};

/// Which of the two console streams to write to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Stdout,
    Stderr,
}

#[derive(Debug, Default)]
struct Buffers {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    /// Both streams interleaved in write order.
    output: Vec<u8>,
}

/// Handle to the process console or to captured buffers. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct Console {
    capture: Option<Arc<Mutex<Buffers>>>,
}

impl Console {
    /// The real stdout/stderr.
    pub fn stdio() -> Self {
        Self { capture: None }
    }

    /// An in-memory console; read it back with [`Console::captured`].
    pub fn capturing() -> Self {
        Self {
            capture: Some(Arc::new(Mutex::new(Buffers::default()))),
        }
    }

    pub fn is_capturing(&self) -> bool {
        self.capture.is_some()
    }

    /// Writer for one stream. Writes are unbuffered on the capture side.
    pub fn stream(&self, stream: Stream) -> ConsoleStream {
        ConsoleStream {
            console: self.clone(),
            stream,
        }
    }

    /// Print `message` followed by a newline on stdout.
    pub fn echo(&self, message: &str) {
        self.write_line(Stream::Stdout, message);
    }

    /// Print `message` followed by a newline on stderr.
    pub fn echo_err(&self, message: &str) {
        self.write_line(Stream::Stderr, message);
    }

    /// Print `text` as-is on the given stream.
    pub fn write_str(&self, stream: Stream, text: &str) {
        // Console output is best effort; a closed pipe surfaces elsewhere.
        let _ = self.stream(stream).write_all(text.as_bytes());
    }

    fn write_line(&self, stream: Stream, message: &str) {
        let mut line = String::with_capacity(message.len() + 1);
        line.push_str(message);
        line.push('\n');
        self.write_str(stream, &line);
    }

    /// Snapshot of everything written so far (captured consoles only).
    pub fn captured(&self) -> Captured {
        match &self.capture {
            Some(buffers) => {
                let buffers = lock(buffers);
                Captured {
                    stdout: String::from_utf8_lossy(&buffers.stdout).into_owned(),
                    stderr: String::from_utf8_lossy(&buffers.stderr).into_owned(),
                    output: String::from_utf8_lossy(&buffers.output).into_owned(),
                }
            }
            None => Captured::default(),
        }
    }

    /// Drop captured output.
    pub fn clear(&self) {
        if let Some(buffers) = &self.capture {
            let mut buffers = lock(buffers);
            buffers.stdout.clear();
            buffers.stderr.clear();
            buffers.output.clear();
        }
    }
}

fn lock(buffers: &Arc<Mutex<Buffers>>) -> MutexGuard<'_, Buffers> {
    // A panicking writer must not hide what was captured before it.
    buffers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Text captured by a [`Console::capturing`] console.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Captured {
    pub stdout: String,
    pub stderr: String,
    pub output: String,
}

/// `io::Write` adapter for one console stream.
#[derive(Debug, Clone)]
pub struct ConsoleStream {
    console: Console,
    stream: Stream,
}

impl Write for ConsoleStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match &self.console.capture {
            Some(buffers) => {
                let mut buffers = lock(buffers);
                match self.stream {
                    Stream::Stdout => buffers.stdout.extend_from_slice(buf),
                    Stream::Stderr => buffers.stderr.extend_from_slice(buf),
                }
                buffers.output.extend_from_slice(buf);
                Ok(buf.len())
            }
            None => match self.stream {
                Stream::Stdout => io::stdout().lock().write(buf),
                Stream::Stderr => io::stderr().lock().write(buf),
            },
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match (&self.console.capture, self.stream) {
            (Some(_), _) => Ok(()),
            (None, Stream::Stdout) => io::stdout().flush(),
            (None, Stream::Stderr) => io::stderr().flush(),
        }
    }
}
