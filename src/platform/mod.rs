// Accessbar platform paths
// Resolves where the durable preference store lives on each OS.

use std::path::PathBuf;

#[cfg(target_os = "linux")]
mod linux;

#[cfg(target_os = "macos")]
mod macos;

#[cfg(target_os = "windows")]
mod windows;

/// Returns the platform-specific data directory for the widget's durable store.
///
/// - **Linux**: `$XDG_DATA_HOME/accessbar` or `~/.local/share/accessbar`
/// - **macOS**: `~/Library/Application Support/Accessbar`
/// - **Windows**: `%APPDATA%/Accessbar`
/// - elsewhere: `./accessbar`
pub fn get_data_dir() -> PathBuf {
    #[cfg(target_os = "linux")]
    {
        linux::get_data_dir()
    }
    #[cfg(target_os = "macos")]
    {
        macos::get_data_dir()
    }
    #[cfg(target_os = "windows")]
    {
        windows::get_data_dir()
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
    {
        PathBuf::from("accessbar")
    }
}
