//! Browser Launch
//!
//! Opens the authorization URL in the user's default browser.

/// Browser launcher interface (for dependency injection).
#[cfg_attr(test, mockall::automock)]
pub trait BrowserLauncher: Send + Sync {
    /// Open `url` in a browser.
    fn open(&self, url: &str) -> std::io::Result<()>;
}

/// Launcher backed by the platform's default URL handler.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) -> std::io::Result<()> {
        open::that(url)
    }
}
