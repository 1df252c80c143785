//! Win32 glue for the settings-dialog preview pane: the saver window is
//! reparented into the pane Windows hands us and resized to its client area.

#[cfg(target_os = "windows")]
pub use windows_impl::{client_size, embed_into};

#[cfg(target_os = "windows")]
mod windows_impl {
    use anyhow::{bail, Context};
    use raw_window_handle::{HasWindowHandle, RawWindowHandle};
    use std::ffi::c_void;
    use windows::Win32::{
        Foundation::{HWND, RECT},
        UI::WindowsAndMessaging::{
            GetClientRect, GetWindowLongPtrW, MoveWindow, SetParent, SetWindowLongPtrW, GWL_STYLE,
            WS_CHILD,
        },
    };

    /// Client-area size of the preview pane, which becomes the drawable area.
    pub fn client_size(parent: isize) -> anyhow::Result<(i32, i32)> {
        let parent = HWND(parent as *mut c_void);
        let mut rect = RECT::default();
        unsafe {
            GetClientRect(parent, &mut rect).context("GetClientRect on the preview pane failed")?;
        }
        Ok((rect.right - rect.left, rect.bottom - rect.top))
    }

    /// Makes our window a child of the preview pane so it closes with the
    /// settings dialog, then fills the pane's client area.
    pub fn embed_into(parent: isize, window: &dyn HasWindowHandle) -> anyhow::Result<()> {
        let handle = window
            .window_handle()
            .context("saver window handle unavailable")?;
        let hwnd = match handle.as_raw() {
            RawWindowHandle::Win32(handle) => HWND(handle.hwnd.get() as *mut c_void),
            _ => bail!("saver window is not a Win32 window"),
        };
        let parent = HWND(parent as *mut c_void);

        let (width, height);
        unsafe {
            SetParent(hwnd, Some(parent)).context("SetParent into the preview pane failed")?;

            let style = GetWindowLongPtrW(hwnd, GWL_STYLE);
            SetWindowLongPtrW(hwnd, GWL_STYLE, style | WS_CHILD.0 as isize);

            let mut rect = RECT::default();
            GetClientRect(parent, &mut rect).context("GetClientRect on the preview pane failed")?;
            width = rect.right - rect.left;
            height = rect.bottom - rect.top;

            MoveWindow(hwnd, 0, 0, width, height, true)
                .context("MoveWindow into the preview pane failed")?;
        }

        log::info!("embedded into preview pane ({width}x{height})");
        Ok(())
    }
}
