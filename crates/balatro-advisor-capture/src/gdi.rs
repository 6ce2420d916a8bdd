//! Scoped window capture over GDI-style drawing primitives.
//!
//! [`GdiBackend`] exposes the individual OS calls. [`capture_window`] runs the
//! capture sequence and wraps each acquired handle in a guard, so every exit
//! path releases what was acquired, in reverse order.

use std::time::Instant;

use balatro_advisor_core::CapturedFrame;
use tracing::{debug, warn};

use crate::{CaptureError, WindowRect};

/// Primitive drawing operations needed to copy one window off-screen.
///
/// Release methods cannot fail from the caller's point of view; backends log
/// release failures instead of returning them.
pub trait GdiBackend {
    /// Top-level window handle.
    type Window: Copy;
    /// Device context handle.
    type Dc: Copy;
    /// Bitmap handle.
    type Bitmap: Copy;
    /// Object that was selected into a DC before a bitmap replaced it.
    type Selection: Copy;

    /// Finds a top-level window by exact, case-sensitive title.
    fn find_window(&self, title: &str) -> Option<Self::Window>;

    /// Reads the window's bounding rectangle in screen coordinates.
    fn window_rect(&self, window: Self::Window) -> Result<WindowRect, CaptureError>;

    /// Acquires the DC covering the whole window, including the frame.
    fn window_dc(&self, window: Self::Window) -> Result<Self::Dc, CaptureError>;

    /// Releases a DC obtained from [`GdiBackend::window_dc`].
    fn release_window_dc(&self, window: Self::Window, dc: Self::Dc);

    /// Creates a memory DC compatible with `dc`.
    fn create_compatible_dc(&self, dc: Self::Dc) -> Result<Self::Dc, CaptureError>;

    /// Deletes a memory DC.
    fn delete_dc(&self, dc: Self::Dc);

    /// Creates a bitmap compatible with `dc`.
    fn create_compatible_bitmap(
        &self,
        dc: Self::Dc,
        width: i32,
        height: i32,
    ) -> Result<Self::Bitmap, CaptureError>;

    /// Deletes a bitmap. The bitmap must not be selected into any DC.
    fn delete_bitmap(&self, bitmap: Self::Bitmap);

    /// Selects `bitmap` into `dc` and returns the object it replaced.
    fn select_bitmap(
        &self,
        dc: Self::Dc,
        bitmap: Self::Bitmap,
    ) -> Result<Self::Selection, CaptureError>;

    /// Puts back the object replaced by [`GdiBackend::select_bitmap`].
    fn restore_selection(&self, dc: Self::Dc, previous: Self::Selection);

    /// Copies `width x height` pixels from `source` to `destination` (SRCCOPY).
    fn bit_blt(
        &self,
        destination: Self::Dc,
        source: Self::Dc,
        width: i32,
        height: i32,
    ) -> Result<(), CaptureError>;

    /// Reads the bitmap as top-down 32-bit BGRX rows.
    fn read_bgrx(
        &self,
        dc: Self::Dc,
        bitmap: Self::Bitmap,
        width: i32,
        height: i32,
    ) -> Result<Vec<u8>, CaptureError>;
}

struct WindowDcGuard<'a, B: GdiBackend> {
    backend: &'a B,
    window: B::Window,
    dc: B::Dc,
}

impl<'a, B: GdiBackend> WindowDcGuard<'a, B> {
    fn acquire(backend: &'a B, window: B::Window) -> Result<Self, CaptureError> {
        let dc = backend.window_dc(window)?;
        Ok(Self {
            backend,
            window,
            dc,
        })
    }
}

impl<B: GdiBackend> Drop for WindowDcGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.release_window_dc(self.window, self.dc);
    }
}

struct MemoryDcGuard<'a, B: GdiBackend> {
    backend: &'a B,
    dc: B::Dc,
}

impl<'a, B: GdiBackend> MemoryDcGuard<'a, B> {
    fn create(backend: &'a B, compatible_with: B::Dc) -> Result<Self, CaptureError> {
        let dc = backend.create_compatible_dc(compatible_with)?;
        Ok(Self { backend, dc })
    }
}

impl<B: GdiBackend> Drop for MemoryDcGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.delete_dc(self.dc);
    }
}

struct BitmapGuard<'a, B: GdiBackend> {
    backend: &'a B,
    bitmap: B::Bitmap,
}

impl<'a, B: GdiBackend> BitmapGuard<'a, B> {
    fn create(
        backend: &'a B,
        compatible_with: B::Dc,
        width: i32,
        height: i32,
    ) -> Result<Self, CaptureError> {
        let bitmap = backend.create_compatible_bitmap(compatible_with, width, height)?;
        Ok(Self { backend, bitmap })
    }
}

impl<B: GdiBackend> Drop for BitmapGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.delete_bitmap(self.bitmap);
    }
}

struct SelectionGuard<'a, B: GdiBackend> {
    backend: &'a B,
    dc: B::Dc,
    previous: B::Selection,
}

impl<'a, B: GdiBackend> SelectionGuard<'a, B> {
    fn select(backend: &'a B, dc: B::Dc, bitmap: B::Bitmap) -> Result<Self, CaptureError> {
        let previous = backend.select_bitmap(dc, bitmap)?;
        Ok(Self {
            backend,
            dc,
            previous,
        })
    }
}

impl<B: GdiBackend> Drop for SelectionGuard<'_, B> {
    fn drop(&mut self) {
        self.backend.restore_selection(self.dc, self.previous);
    }
}

/// Captures the current contents of the window titled `title`.
///
/// # Errors
/// - [`CaptureError::WindowNotFound`] when no window has that exact title.
/// - [`CaptureError::Backend`] when the rectangle is empty or any drawing
///   primitive fails.
///
/// # Resource handling
/// Nothing acquired here outlives the call, whether it succeeds or fails.
pub fn capture_window<B: GdiBackend>(
    backend: &B,
    title: &str,
) -> Result<CapturedFrame, CaptureError> {
    let started = Instant::now();
    let result = capture_window_inner(backend, title);

    match &result {
        Ok(frame) => debug!(
            title,
            width = frame.width(),
            height = frame.height(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "window captured"
        ),
        Err(error) => warn!(title, error = %error, "window capture failed"),
    }

    result
}

fn capture_window_inner<B: GdiBackend>(
    backend: &B,
    title: &str,
) -> Result<CapturedFrame, CaptureError> {
    let window = backend
        .find_window(title)
        .ok_or_else(|| CaptureError::WindowNotFound(title.to_string()))?;

    let rect = backend.window_rect(window)?;
    let (width, height) = (rect.width(), rect.height());
    if width <= 0 || height <= 0 {
        return Err(CaptureError::Backend(format!(
            "window \"{title}\" has an empty rectangle ({width}x{height})"
        )));
    }

    // Drop order releases the bitmap, then the memory DC, then the window DC.
    let window_dc = WindowDcGuard::acquire(backend, window)?;
    let memory_dc = MemoryDcGuard::create(backend, window_dc.dc)?;
    let bitmap = BitmapGuard::create(backend, window_dc.dc, width, height)?;

    {
        let _selection = SelectionGuard::select(backend, memory_dc.dc, bitmap.bitmap)?;
        backend.bit_blt(memory_dc.dc, window_dc.dc, width, height)?;
    }

    // The bitmap is deselected before its bits are read.
    let bgrx = backend.read_bgrx(memory_dc.dc, bitmap.bitmap, width, height)?;

    CapturedFrame::from_bgrx(width as u32, height as u32, &bgrx)
        .map_err(|error| CaptureError::Backend(format!("bitmap conversion failed: {error}")))
}
