#![warn(missing_docs)]
//! # balatro-advisor-capture
//!
//! ## Purpose
//! Copies a native window's rendered pixels into a [`CapturedFrame`].
//!
//! ## Responsibilities
//! - Define the backend-agnostic [`FrameGrabber`] capability.
//! - Run the scoped capture sequence over [`GdiBackend`] primitives.
//! - Expose the Win32 backend on Windows and a counting mock everywhere.
//!
//! ## Data flow
//! App passes a window title -> [`WindowCapture::grab`] resolves the window,
//! copies it off-screen, converts BGRX to RGB -> frame goes to encoding.
//!
//! ## Ownership and lifetimes
//! OS handles are local to one capture call and wrapped in drop guards.
//! Returned frames own their buffers.
//!
//! ## Error model
//! A missing window is [`CaptureError::WindowNotFound`]; everything else
//! (empty rectangle, failed drawing call) is [`CaptureError::Backend`].
//!
//! ## Known limitations
//! - If several top-level windows share the title, whichever the OS reports
//!   first is captured.
//! - Hardware-accelerated or fullscreen-exclusive surfaces may come back
//!   blank or stale, because the copy reads the window's GDI surface.

pub mod gdi;
pub mod mock;
#[cfg(windows)]
pub mod win32;

use balatro_advisor_core::CapturedFrame;
use thiserror::Error;

pub use gdi::{GdiBackend, capture_window};
pub use mock::{MockFailure, MockGdi, MockWindow, ResourceSnapshot};
#[cfg(windows)]
pub use win32::Win32Gdi;

/// Window bounding rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRect {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge (exclusive).
    pub right: i32,
    /// Bottom edge (exclusive).
    pub bottom: i32,
}

impl WindowRect {
    /// Creates a rectangle from its edges.
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Width in pixels; may be zero or negative for degenerate windows.
    pub fn width(&self) -> i32 {
        self.right.saturating_sub(self.left)
    }

    /// Height in pixels; may be zero or negative for degenerate windows.
    pub fn height(&self) -> i32 {
        self.bottom.saturating_sub(self.top)
    }
}

/// Capability to screenshot a window by title.
pub trait FrameGrabber: Send + Sync {
    /// Captures the window's current contents.
    ///
    /// # Errors
    /// Returns [`CaptureError::WindowNotFound`] when no window has exactly this
    /// title, and [`CaptureError::Backend`] on any drawing failure.
    fn grab(&self, window_title: &str) -> Result<CapturedFrame, CaptureError>;
}

/// [`FrameGrabber`] running the GDI capture sequence over backend `B`.
#[derive(Debug, Default)]
pub struct WindowCapture<B> {
    backend: B,
}

impl<B: GdiBackend> WindowCapture<B> {
    /// Wraps a backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Borrows the backend, e.g. to read mock resource counters.
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B> FrameGrabber for WindowCapture<B>
where
    B: GdiBackend + Send + Sync,
{
    fn grab(&self, window_title: &str) -> Result<CapturedFrame, CaptureError> {
        capture_window(&self.backend, window_title)
    }
}

/// Creates the grabber for the current desktop session.
///
/// # Errors
/// Returns [`CaptureError::Backend`] on platforms without a native backend.
pub fn native_frame_grabber() -> Result<Box<dyn FrameGrabber>, CaptureError> {
    #[cfg(windows)]
    {
        Ok(Box::new(WindowCapture::new(Win32Gdi)))
    }

    #[cfg(not(windows))]
    {
        Err(CaptureError::Backend(
            "window capture is currently implemented for Windows only".to_string(),
        ))
    }
}

/// Capture layer error type.
#[derive(Debug, Error)]
pub enum CaptureError {
    /// No top-level window has the requested title.
    #[error("window not found: no top-level window titled \"{0}\"")]
    WindowNotFound(String),
    /// A drawing primitive failed or the window has no area.
    #[error("capture backend failure: {0}")]
    Backend(String),
}

#[cfg(test)]
mod tests {
    //! Unit tests for capture against the mock backend.

    use super::*;

    #[test]
    fn mock_capture_matches_window_rect() {
        let grabber = WindowCapture::new(
            MockGdi::new().with_window("Balatro", WindowRect::new(100, 50, 420, 290)),
        );
        let frame = grabber.grab("Balatro").expect("capture should work");
        assert_eq!(frame.width(), 320);
        assert_eq!(frame.height(), 240);
        assert_eq!(frame.rgb().len(), 320 * 240 * 3);
        assert_eq!(grabber.backend().resources().live(), 0);
    }

    #[test]
    fn title_match_is_case_sensitive() {
        let grabber =
            WindowCapture::new(MockGdi::new().with_window("Balatro", WindowRect::new(0, 0, 4, 4)));
        assert!(matches!(
            grabber.grab("balatro"),
            Err(CaptureError::WindowNotFound(_))
        ));
    }

    #[test]
    fn empty_rect_is_a_backend_error() {
        let grabber = WindowCapture::new(
            MockGdi::new().with_window("Minimized", WindowRect::new(10, 10, 10, 300)),
        );
        assert!(matches!(
            grabber.grab("Minimized"),
            Err(CaptureError::Backend(_))
        ));
        assert_eq!(grabber.backend().resources().acquired, 0);
    }

    #[cfg(not(windows))]
    #[test]
    fn native_grabber_reports_unsupported_platform() {
        assert!(matches!(
            native_frame_grabber(),
            Err(CaptureError::Backend(_))
        ));
    }
}
