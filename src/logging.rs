//! Log output for the shim
//!
//! Every event becomes one timestamped line in the log file and on the
//! platform debug channel (`OutputDebugStringA` on Windows, stderr elsewhere
//! when `XR_EXTENSION_MASK_STDERR` is set).

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

/// Env var holding an `EnvFilter` directive for the shim's logs (default `info`)
pub const LOG_FILTER_ENV: &str = "XR_EXTENSION_MASK_LOG";

/// Env var that mirrors the log to stderr on non-Windows platforms
pub const STDERR_ENV: &str = "XR_EXTENSION_MASK_STDERR";

/// Install the shim's subscriber.
///
/// The log file is truncated. Returns false if the host process already
/// installed a global subscriber, in which case events go there instead.
pub fn init(log_path: Option<&Path>) -> bool {
    let mut open_error = None;
    let file = log_path.and_then(|path| match File::create(path) {
        Ok(file) => Some(file),
        Err(e) => {
            open_error = Some(format!("Failed to create log file `{}': {}", path.display(), e));
            None
        }
    });

    let filter =
        EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new("info"));

    // File is unbuffered: each event reaches the OS as soon as it is formatted.
    let file_layer = file.map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(Mutex::new(file))
    });

    let debug_layer = DebugChannel::enabled().then(|| {
        fmt::layer()
            .with_ansi(false)
            .with_target(false)
            .with_writer(DebugChannel)
    });

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(debug_layer);

    let installed = tracing::subscriber::set_global_default(subscriber).is_ok();

    if let Some(message) = open_error {
        tracing::warn!("{}", message);
    }

    installed
}

/// The platform debug output channel
#[derive(Debug, Clone, Copy, Default)]
pub struct DebugChannel;

impl DebugChannel {
    pub fn enabled() -> bool {
        cfg!(windows) || std::env::var_os(STDERR_ENV).is_some()
    }
}

impl<'a> MakeWriter<'a> for DebugChannel {
    type Writer = DebugChannelWriter;

    fn make_writer(&'a self) -> Self::Writer {
        DebugChannelWriter { buf: Vec::new() }
    }
}

/// Collects one formatted event and emits it on flush or drop
pub struct DebugChannelWriter {
    buf: Vec<u8>,
}

impl DebugChannelWriter {
    fn emit(&mut self) {
        if self.buf.is_empty() {
            return;
        }

        #[cfg(windows)]
        {
            self.buf.retain(|&b| b != 0);
            self.buf.push(0);
            // SAFETY: `buf` is NUL-terminated with no interior NUL.
            unsafe {
                windows_sys::Win32::System::Diagnostics::Debug::OutputDebugStringA(self.buf.as_ptr())
            };
        }

        #[cfg(not(windows))]
        {
            let _ = io::stderr().write_all(&self.buf);
        }

        self.buf.clear();
    }
}

impl Write for DebugChannelWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.emit();
        Ok(())
    }
}

impl Drop for DebugChannelWriter {
    fn drop(&mut self) {
        self.emit();
    }
}
