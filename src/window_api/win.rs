use std::sync::Arc;

use anyhow::Result;
use tracing::error;
use windows::Win32::UI::WindowsAndMessaging::{GetForegroundWindow, GetWindowTextW};

use super::WindowPoller;

#[tracing::instrument]
pub fn poll_active_title() -> Result<Option<Arc<str>>> {
    let window = unsafe { GetForegroundWindow() };
    if window.is_invalid() {
        return Ok(None);
    }

    let mut text: [u16; 512] = [0; 512];
    let len = unsafe { GetWindowTextW(window, &mut text) };
    if len <= 0 {
        // Windows reports no text both for titleless windows and during
        // desktop transitions. Either way there is nothing to classify.
        return Ok(None);
    }
    Ok(Some(String::from_utf16_lossy(&text[..len as usize]).into()))
}

pub struct WindowsWindowPoller {}

impl WindowsWindowPoller {
    pub fn new() -> Self {
        Self {}
    }
}

impl Default for WindowsWindowPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowPoller for WindowsWindowPoller {
    fn poll_title(&mut self) -> Result<Option<Arc<str>>> {
        poll_active_title().inspect_err(|e| error!("Failed to get active window {e:?}"))
    }
}
