//! Win32 GDI implementation of [`GdiBackend`].

use std::ffi::c_void;
use std::ptr::null;

use tracing::warn;
use windows_sys::Win32::Foundation::{GetLastError, HWND, RECT};
use windows_sys::Win32::Graphics::Gdi::{
    BI_RGB, BITMAPINFO, BITMAPINFOHEADER, BitBlt, CreateCompatibleBitmap, CreateCompatibleDC,
    DIB_RGB_COLORS, DeleteDC, DeleteObject, GetDIBits, GetWindowDC, HBITMAP, HDC, HGDI_ERROR,
    HGDIOBJ, ReleaseDC, SRCCOPY, SelectObject,
};
use windows_sys::Win32::UI::WindowsAndMessaging::{FindWindowW, GetWindowRect};

use crate::gdi::GdiBackend;
use crate::{CaptureError, WindowRect};

/// GDI backend backed by the live desktop session.
#[derive(Debug, Clone, Copy, Default)]
pub struct Win32Gdi;

impl GdiBackend for Win32Gdi {
    type Window = HWND;
    type Dc = HDC;
    type Bitmap = HBITMAP;
    type Selection = HGDIOBJ;

    fn find_window(&self, title: &str) -> Option<Self::Window> {
        let title_wide = to_wide(title);
        let hwnd = unsafe {
            // Safety:
            // - Null class name matches any class.
            // - `title_wide` is NUL-terminated and outlives the call.
            FindWindowW(null(), title_wide.as_ptr())
        };
        (!hwnd.is_null()).then_some(hwnd)
    }

    fn window_rect(&self, window: Self::Window) -> Result<WindowRect, CaptureError> {
        let mut rect = RECT {
            left: 0,
            top: 0,
            right: 0,
            bottom: 0,
        };
        let ok = unsafe {
            // Safety:
            // - `rect` is a valid out-pointer for the duration of the call.
            GetWindowRect(window, &mut rect)
        };
        if ok == 0 {
            return Err(last_error("GetWindowRect"));
        }

        Ok(WindowRect {
            left: rect.left,
            top: rect.top,
            right: rect.right,
            bottom: rect.bottom,
        })
    }

    fn window_dc(&self, window: Self::Window) -> Result<Self::Dc, CaptureError> {
        let dc = unsafe {
            // Safety:
            // - `window` came from `FindWindowW`; a stale handle yields null.
            GetWindowDC(window)
        };
        if dc.is_null() {
            return Err(last_error("GetWindowDC"));
        }
        Ok(dc)
    }

    fn release_window_dc(&self, window: Self::Window, dc: Self::Dc) {
        let released = unsafe {
            // Safety:
            // - `dc` was returned by `GetWindowDC(window)` and is released once.
            ReleaseDC(window, dc)
        };
        if released == 0 {
            warn!("ReleaseDC reported failure");
        }
    }

    fn create_compatible_dc(&self, dc: Self::Dc) -> Result<Self::Dc, CaptureError> {
        let memory_dc = unsafe {
            // Safety:
            // - `dc` is a live window DC owned by the caller.
            CreateCompatibleDC(dc)
        };
        if memory_dc.is_null() {
            return Err(last_error("CreateCompatibleDC"));
        }
        Ok(memory_dc)
    }

    fn delete_dc(&self, dc: Self::Dc) {
        let deleted = unsafe {
            // Safety:
            // - `dc` was created by `CreateCompatibleDC` and is deleted once.
            DeleteDC(dc)
        };
        if deleted == 0 {
            warn!("DeleteDC reported failure");
        }
    }

    fn create_compatible_bitmap(
        &self,
        dc: Self::Dc,
        width: i32,
        height: i32,
    ) -> Result<Self::Bitmap, CaptureError> {
        let bitmap = unsafe {
            // Safety:
            // - `dc` is the live window DC; dimensions are positive.
            CreateCompatibleBitmap(dc, width, height)
        };
        if bitmap.is_null() {
            return Err(last_error("CreateCompatibleBitmap"));
        }
        Ok(bitmap)
    }

    fn delete_bitmap(&self, bitmap: Self::Bitmap) {
        let deleted = unsafe {
            // Safety:
            // - The bitmap is no longer selected into any DC at this point.
            DeleteObject(bitmap as HGDIOBJ)
        };
        if deleted == 0 {
            warn!("DeleteObject reported failure for capture bitmap");
        }
    }

    fn select_bitmap(
        &self,
        dc: Self::Dc,
        bitmap: Self::Bitmap,
    ) -> Result<Self::Selection, CaptureError> {
        let previous = unsafe {
            // Safety:
            // - `dc` is a memory DC and `bitmap` is compatible with it.
            SelectObject(dc, bitmap as HGDIOBJ)
        };
        if previous.is_null() || previous == HGDI_ERROR {
            return Err(last_error("SelectObject"));
        }
        Ok(previous)
    }

    fn restore_selection(&self, dc: Self::Dc, previous: Self::Selection) {
        unsafe {
            // Safety:
            // - `previous` was returned by `SelectObject` on the same DC.
            SelectObject(dc, previous);
        }
    }

    fn bit_blt(
        &self,
        destination: Self::Dc,
        source: Self::Dc,
        width: i32,
        height: i32,
    ) -> Result<(), CaptureError> {
        let ok = unsafe {
            // Safety:
            // - Both DCs are live; the destination has a bitmap of at least
            //   `width x height` selected.
            BitBlt(destination, 0, 0, width, height, source, 0, 0, SRCCOPY)
        };
        if ok == 0 {
            return Err(last_error("BitBlt"));
        }
        Ok(())
    }

    fn read_bgrx(
        &self,
        dc: Self::Dc,
        bitmap: Self::Bitmap,
        width: i32,
        height: i32,
    ) -> Result<Vec<u8>, CaptureError> {
        let mut info: BITMAPINFO = unsafe {
            // Safety:
            // - Zeroed `BITMAPINFO` is a valid baseline before header assignment.
            std::mem::zeroed()
        };
        info.bmiHeader = BITMAPINFOHEADER {
            biSize: std::mem::size_of::<BITMAPINFOHEADER>() as u32,
            biWidth: width,
            // Negative height requests top-down row order.
            biHeight: -height,
            biPlanes: 1,
            biBitCount: 32,
            biCompression: BI_RGB,
            ..unsafe {
                // Safety:
                // - Remaining fields are optional for BI_RGB destination buffers.
                std::mem::zeroed()
            }
        };

        let mut bgrx = vec![0_u8; (width as usize) * (height as usize) * 4];
        let lines = unsafe {
            // Safety:
            // - `bgrx` holds exactly `height` rows of `width` 32-bit pixels;
            //   32bpp rows need no padding.
            // - `bitmap` is deselected, as GetDIBits requires.
            GetDIBits(
                dc,
                bitmap,
                0,
                height as u32,
                bgrx.as_mut_ptr() as *mut c_void,
                &mut info,
                DIB_RGB_COLORS,
            )
        };
        if lines == 0 {
            return Err(last_error("GetDIBits"));
        }
        if lines != height {
            return Err(CaptureError::Backend(format!(
                "GetDIBits copied {lines} of {height} rows"
            )));
        }

        Ok(bgrx)
    }
}

fn last_error(call: &str) -> CaptureError {
    let code = unsafe {
        // Safety:
        // - Reads the calling thread's last-error value.
        GetLastError()
    };
    CaptureError::Backend(format!("{call} failed (os error {code})"))
}

fn to_wide(value: &str) -> Vec<u16> {
    value.encode_utf16().chain(std::iter::once(0)).collect()
}
