//! Contains logic for querying the focused window in different environments.
//! [GenericWindowPoller] is the main artifact of this module that abstracts
//! the operations.

#[cfg(feature = "win")]
pub mod win;
#[cfg(feature = "x11")]
pub mod x11;

#[cfg(feature = "win")]
extern crate windows;

#[cfg(feature = "x11")]
extern crate xcb;

use std::sync::Arc;

use anyhow::Result;

/// Intended to serve as a contract windows and linux systems must implement.
///
/// `Ok(None)` means no window currently has focus or the focused window
/// carries no text. An error means the query itself failed. The engine treats
/// both outcomes as an idle cycle.
#[cfg_attr(test, mockall::automock)]
pub trait WindowPoller: Send {
    fn poll_title(&mut self) -> Result<Option<Arc<str>>>;
}

/// Serves as a cross-compatible [WindowPoller] implementation.
pub struct GenericWindowPoller {
    inner: Box<dyn WindowPoller>,
}

impl GenericWindowPoller {
    pub fn new() -> Result<Self> {
        cfg_if::cfg_if! {
            if #[cfg(feature = "win")] {
                use win::WindowsWindowPoller;
                Ok(Self {
                    inner: Box::new(WindowsWindowPoller::new()),
                })
            }
            else if #[cfg(feature = "x11")] {
                use x11::X11WindowPoller;
                Ok(Self {
                    inner: Box::new(X11WindowPoller::new()?),
                })
            }
            else {
                // This runtime error is needed to allow the project to be compiled for during testing.
                unimplemented!("No window backend was specified")
            }
        }
    }
}

impl WindowPoller for GenericWindowPoller {
    fn poll_title(&mut self) -> Result<Option<Arc<str>>> {
        self.inner.poll_title()
    }
}
