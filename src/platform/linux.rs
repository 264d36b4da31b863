use std::env;
use std::path::PathBuf;

/// `$XDG_DATA_HOME/accessbar` if set, otherwise `~/.local/share/accessbar`.
pub fn get_data_dir() -> PathBuf {
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join("accessbar"),
        _ => {
            let home = env::var("HOME").unwrap_or_else(|_| String::from("/tmp"));
            PathBuf::from(home).join(".local").join("share").join("accessbar")
        }
    }
}
