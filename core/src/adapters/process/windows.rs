//! Graceful close of GUI processes through their main window.

use tracing::debug;
use windows::Win32::Foundation::{BOOL, FALSE, HWND, LPARAM, TRUE, WPARAM};
use windows::Win32::UI::WindowsAndMessaging::{
    EnumWindows, GetWindow, GetWindowThreadProcessId, IsWindowVisible, PostMessageW, GW_OWNER,
    WM_CLOSE,
};

struct WindowSearch {
    pid: u32,
    window: Option<HWND>,
}

unsafe extern "system" fn find_main_window(hwnd: HWND, lparam: LPARAM) -> BOOL {
    let search = &mut *(lparam.0 as *mut WindowSearch);

    let mut owner_pid = 0u32;
    GetWindowThreadProcessId(hwnd, Some(&mut owner_pid));
    if owner_pid != search.pid || !IsWindowVisible(hwnd).as_bool() {
        return TRUE;
    }

    // Owned windows are dialogs and tool windows, not the main window
    let owned = GetWindow(hwnd, GW_OWNER)
        .ok()
        .is_some_and(|owner| !owner.is_invalid());
    if owned {
        return TRUE;
    }

    search.window = Some(hwnd);
    FALSE
}

/// Post WM_CLOSE to the visible top-level unowned window of `pid`.
///
/// Returns false when the process has no such window or posting failed.
pub(super) fn close_main_window(pid: u32) -> bool {
    let mut search = WindowSearch { pid, window: None };

    // EnumWindows reports an error when the callback stops early
    let _ = unsafe {
        EnumWindows(
            Some(find_main_window),
            LPARAM(&mut search as *mut WindowSearch as isize),
        )
    };

    let Some(hwnd) = search.window else {
        debug!(pid = pid, "No main window found");
        return false;
    };

    match unsafe { PostMessageW(hwnd, WM_CLOSE, WPARAM(0), LPARAM(0)) } {
        Ok(()) => {
            debug!(pid = pid, "Posted WM_CLOSE to main window");
            true
        }
        Err(e) => {
            debug!(pid = pid, error = %e, "Failed to post WM_CLOSE");
            false
        }
    }
}
