//! Thin I/O and capability contract, kept deliberately outside the core
//! dispatch scope beyond this read-only surface.
//!
//! `IoManager` does no rendering: it owns the writers dispatch/wrapper code
//! writes through, plus three capability booleans computed once at
//! construction. Help/version/color *rendering* is an external collaborator
//! that reads these booleans; this module never makes a layout decision.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// A shared, clonable byte sink. Used both as a test double here and as the
/// capture/tee destination in [`crate::wrapper`] — the wrapper's
/// "capture-also" mode and an app-level tee writer may need to observe the
/// same bytes.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        SharedBuffer::default()
    }

    pub fn snapshot(&self) -> Vec<u8> {
        self.0.lock().unwrap().clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Destination writers plus capability booleans, built once per
/// [`crate::model::Application`].
pub struct IoManager {
    stdout: Box<dyn Write + Send>,
    stderr: Box<dyn Write + Send>,
    pub color_enabled: bool,
    pub is_terminal: bool,
    pub virtual_terminal_enabled: bool,
}

impl IoManager {
    /// Build a manager wired to the process's real stdout/stderr, honoring
    /// `NO_COLOR`/`FORCE_COLOR`.
    pub fn stdio() -> Self {
        IoManager {
            stdout: Box::new(io::stdout()),
            stderr: Box::new(io::stderr()),
            color_enabled: detect_color_enabled(),
            is_terminal: detect_is_terminal(),
            virtual_terminal_enabled: detect_virtual_terminal(),
        }
    }

    /// Build a manager over arbitrary writers (tests, captured wrapper
    /// output, embedding applications with their own logging sink).
    pub fn with_writers(
        stdout: Box<dyn Write + Send>,
        stderr: Box<dyn Write + Send>,
        color_enabled: bool,
    ) -> Self {
        IoManager {
            stdout,
            stderr,
            color_enabled,
            is_terminal: false,
            virtual_terminal_enabled: color_enabled,
        }
    }

    pub fn stdout(&mut self) -> &mut (dyn Write + Send) {
        &mut *self.stdout
    }

    pub fn stderr(&mut self) -> &mut (dyn Write + Send) {
        &mut *self.stderr
    }
}

/// `NO_COLOR` wins over everything; `FORCE_COLOR` wins over terminal
/// detection; otherwise defer to `supports-color`.
fn detect_color_enabled() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var_os("FORCE_COLOR").is_some() {
        return true;
    }
    #[cfg(feature = "color")]
    {
        supports_color::on(supports_color::Stream::Stdout).is_some()
    }
    #[cfg(not(feature = "color"))]
    {
        false
    }
}

fn detect_is_terminal() -> bool {
    #[cfg(feature = "color")]
    {
        supports_color::on(supports_color::Stream::Stdout).is_some()
    }
    #[cfg(not(feature = "color"))]
    {
        false
    }
}

/// Platform-specific "enable virtual terminal sequences" switch (relevant on
/// legacy Windows consoles); a no-op contract on platforms that don't need
/// it, since only the *booleans* need to exist for a downstream formatter
/// to consult.
fn detect_virtual_terminal() -> bool {
    if std::env::var_os("FERROCLI_DISABLE_VIRTUAL_TERMINAL").is_some() {
        return false;
    }
    detect_color_enabled()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writers_round_trip() {
        let out = SharedBuffer::new();
        let err = SharedBuffer::new();
        let mut io = IoManager::with_writers(Box::new(out.clone()), Box::new(err.clone()), false);
        write!(io.stdout(), "hi").unwrap();
        write!(io.stderr(), "bye").unwrap();
        assert_eq!(out.snapshot(), b"hi");
        assert_eq!(err.snapshot(), b"bye");
    }
}
