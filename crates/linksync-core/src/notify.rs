//! Host-environment capabilities the core hands off to: system
//! notifications, "open URL", and the clipboard. Each is a seam so the three
//! host surfaces (and tests) can plug in their own implementation.

use crate::error::CoreError;

/// A visible notification surfaced for a freshly ingested item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    /// Inbox item id, so a click can be routed back to the item.
    pub item_id: String,
    pub title: String,
    pub body: String,
    pub link: Option<String>,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Fallback notifier for hosts without a notification surface.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        tracing::info!(
            "notification [{}]: {} - {}",
            notification.item_id,
            notification.title,
            notification.body
        );
    }
}

pub trait UrlOpener: Send + Sync {
    /// Focus an existing matching view or open a new one; the host decides.
    fn open_url(&self, url: &str) -> Result<(), CoreError>;
}

/// Opens URLs through the platform launcher.
pub struct SystemUrlOpener;

impl UrlOpener for SystemUrlOpener {
    fn open_url(&self, url: &str) -> Result<(), CoreError> {
        use std::process::Command;

        #[cfg(target_os = "macos")]
        let cmd = "open";
        #[cfg(target_os = "windows")]
        let cmd = "explorer";
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let cmd = "xdg-open";

        Command::new(cmd)
            .arg(url)
            .spawn()
            .map_err(|e| CoreError::Host(format!("Failed to open URL: {}", e)))?;
        Ok(())
    }
}

pub trait ClipboardSink: Send + Sync {
    fn copy_text(&self, text: &str) -> Result<(), CoreError>;
}

/// System clipboard via arboard.
pub struct SystemClipboard;

impl ClipboardSink for SystemClipboard {
    fn copy_text(&self, text: &str) -> Result<(), CoreError> {
        let mut clipboard = arboard::Clipboard::new()
            .map_err(|e| CoreError::Host(format!("Clipboard unavailable: {}", e)))?;
        clipboard
            .set_text(text.to_string())
            .map_err(|e| CoreError::Host(format!("Clipboard write failed: {}", e)))?;
        Ok(())
    }
}
