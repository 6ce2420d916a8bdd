//! In-memory GDI backend for tests and CI.
//!
//! Windows live in a registry owned by the mock. Every handle the capture
//! algorithm acquires is counted, so tests can assert that a capture left no
//! live handles behind.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::gdi::GdiBackend;
use crate::{CaptureError, WindowRect};

/// One registered fake window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockWindow {
    /// Exact title used for lookup.
    pub title: String,
    /// Bounding rectangle in screen coordinates.
    pub rect: WindowRect,
    /// Colour every captured pixel will have.
    pub fill_rgb: [u8; 3],
}

/// Primitive that should fail on the next capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockFailure {
    /// Rectangle query fails.
    WindowRect,
    /// Window DC cannot be acquired.
    WindowDc,
    /// Memory DC cannot be created.
    CompatibleDc,
    /// Bitmap cannot be created.
    CompatibleBitmap,
    /// Bitmap cannot be selected into the memory DC.
    SelectBitmap,
    /// Bit-block transfer fails.
    BitBlt,
    /// Bitmap bits cannot be read.
    ReadBits,
}

/// Resource counters at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ResourceSnapshot {
    /// Window DCs not yet released.
    pub window_dcs: usize,
    /// Memory DCs not yet deleted.
    pub memory_dcs: usize,
    /// Bitmaps not yet deleted.
    pub bitmaps: usize,
    /// Selections not yet restored.
    pub selections: usize,
    /// Total handles ever acquired.
    pub acquired: usize,
    /// Release calls for a handle kind with nothing live.
    pub invalid_releases: usize,
}

impl ResourceSnapshot {
    /// Sum of all live handles.
    pub fn live(&self) -> usize {
        self.window_dcs + self.memory_dcs + self.bitmaps + self.selections
    }
}

/// Opaque mock window handle (index into the registry).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockWindowHandle(usize);

/// Mock device context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockDc {
    id: u64,
    fill_rgb: [u8; 3],
}

/// Mock bitmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockBitmap {
    id: u64,
    width: i32,
    height: i32,
}

/// Mock "previously selected object".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockSelection {
    dc_id: u64,
}

/// Deterministic [`GdiBackend`] with leak accounting.
#[derive(Debug, Default)]
pub struct MockGdi {
    windows: Vec<MockWindow>,
    failure: Option<MockFailure>,
    next_id: AtomicU64,
    window_dcs: AtomicUsize,
    memory_dcs: AtomicUsize,
    bitmaps: AtomicUsize,
    selections: AtomicUsize,
    acquired: AtomicUsize,
    invalid_releases: AtomicUsize,
}

impl MockGdi {
    /// Creates a backend with no windows.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a mid-grey window.
    pub fn with_window(self, title: impl Into<String>, rect: WindowRect) -> Self {
        self.with_filled_window(title, rect, [128, 128, 128])
    }

    /// Registers a window whose pixels all have colour `fill_rgb`.
    pub fn with_filled_window(
        mut self,
        title: impl Into<String>,
        rect: WindowRect,
        fill_rgb: [u8; 3],
    ) -> Self {
        self.windows.push(MockWindow {
            title: title.into(),
            rect,
            fill_rgb,
        });
        self
    }

    /// Makes `failure` fail on every capture.
    pub fn failing_at(mut self, failure: MockFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    /// Current resource counters.
    pub fn resources(&self) -> ResourceSnapshot {
        ResourceSnapshot {
            window_dcs: self.window_dcs.load(Ordering::SeqCst),
            memory_dcs: self.memory_dcs.load(Ordering::SeqCst),
            bitmaps: self.bitmaps.load(Ordering::SeqCst),
            selections: self.selections.load(Ordering::SeqCst),
            acquired: self.acquired.load(Ordering::SeqCst),
            invalid_releases: self.invalid_releases.load(Ordering::SeqCst),
        }
    }

    fn check(&self, step: MockFailure) -> Result<(), CaptureError> {
        if self.failure == Some(step) {
            return Err(CaptureError::Backend(format!("mock {step:?} failure")));
        }
        Ok(())
    }

    fn acquire(&self, counter: &AtomicUsize) -> u64 {
        counter.fetch_add(1, Ordering::SeqCst);
        self.acquired.fetch_add(1, Ordering::SeqCst);
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn release(&self, counter: &AtomicUsize) {
        let released =
            counter.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |live| live.checked_sub(1));
        if released.is_err() {
            self.invalid_releases.fetch_add(1, Ordering::SeqCst);
        }
    }
}

impl GdiBackend for MockGdi {
    type Window = MockWindowHandle;
    type Dc = MockDc;
    type Bitmap = MockBitmap;
    type Selection = MockSelection;

    fn find_window(&self, title: &str) -> Option<Self::Window> {
        self.windows
            .iter()
            .position(|window| window.title == title)
            .map(MockWindowHandle)
    }

    fn window_rect(&self, window: Self::Window) -> Result<WindowRect, CaptureError> {
        self.check(MockFailure::WindowRect)?;
        self.windows
            .get(window.0)
            .map(|window| window.rect)
            .ok_or_else(|| CaptureError::Backend("stale mock window handle".to_string()))
    }

    fn window_dc(&self, window: Self::Window) -> Result<Self::Dc, CaptureError> {
        self.check(MockFailure::WindowDc)?;
        let fill_rgb = self
            .windows
            .get(window.0)
            .map(|window| window.fill_rgb)
            .ok_or_else(|| CaptureError::Backend("stale mock window handle".to_string()))?;
        let id = self.acquire(&self.window_dcs);
        Ok(MockDc { id, fill_rgb })
    }

    fn release_window_dc(&self, _window: Self::Window, _dc: Self::Dc) {
        self.release(&self.window_dcs);
    }

    fn create_compatible_dc(&self, dc: Self::Dc) -> Result<Self::Dc, CaptureError> {
        self.check(MockFailure::CompatibleDc)?;
        let id = self.acquire(&self.memory_dcs);
        Ok(MockDc {
            id,
            fill_rgb: dc.fill_rgb,
        })
    }

    fn delete_dc(&self, _dc: Self::Dc) {
        self.release(&self.memory_dcs);
    }

    fn create_compatible_bitmap(
        &self,
        _dc: Self::Dc,
        width: i32,
        height: i32,
    ) -> Result<Self::Bitmap, CaptureError> {
        self.check(MockFailure::CompatibleBitmap)?;
        let id = self.acquire(&self.bitmaps);
        Ok(MockBitmap { id, width, height })
    }

    fn delete_bitmap(&self, _bitmap: Self::Bitmap) {
        self.release(&self.bitmaps);
    }

    fn select_bitmap(
        &self,
        dc: Self::Dc,
        _bitmap: Self::Bitmap,
    ) -> Result<Self::Selection, CaptureError> {
        self.check(MockFailure::SelectBitmap)?;
        self.acquire(&self.selections);
        Ok(MockSelection { dc_id: dc.id })
    }

    fn restore_selection(&self, dc: Self::Dc, previous: Self::Selection) {
        if previous.dc_id != dc.id {
            self.invalid_releases.fetch_add(1, Ordering::SeqCst);
        }
        self.release(&self.selections);
    }

    fn bit_blt(
        &self,
        _destination: Self::Dc,
        _source: Self::Dc,
        _width: i32,
        _height: i32,
    ) -> Result<(), CaptureError> {
        self.check(MockFailure::BitBlt)
    }

    fn read_bgrx(
        &self,
        dc: Self::Dc,
        bitmap: Self::Bitmap,
        width: i32,
        height: i32,
    ) -> Result<Vec<u8>, CaptureError> {
        self.check(MockFailure::ReadBits)?;
        if self.selections.load(Ordering::SeqCst) != 0 {
            return Err(CaptureError::Backend(
                "bitmap is still selected into a device context".to_string(),
            ));
        }
        if bitmap.width != width || bitmap.height != height {
            return Err(CaptureError::Backend(format!(
                "mock bitmap {} is {}x{}, read requested {width}x{height}",
                bitmap.id, bitmap.width, bitmap.height
            )));
        }

        let [r, g, b] = dc.fill_rgb;
        let pixels = (width as usize) * (height as usize);
        let mut bgrx = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            bgrx.extend_from_slice(&[b, g, r, 0xFF]);
        }
        Ok(bgrx)
    }
}
