use std::path::PathBuf;

/// Directory name used under the XDG config and cache roots.
pub const APP_DIR: &str = "gitsync";

/// Returns the user's home directory from the HOME environment variable.
pub fn home_dir() -> Option<PathBuf> {
    non_empty_env("HOME").map(PathBuf::from)
}

/// Returns $XDG_CACHE_HOME/gitsync, falling back to ~/.cache/gitsync.
/// Empty values are treated as unset per XDG Base Directory Specification.
pub fn app_cache_dir() -> Option<PathBuf> {
    xdg_dir("XDG_CACHE_HOME", ".cache").map(|dir| dir.join(APP_DIR))
}

/// Returns $XDG_CONFIG_HOME/gitsync, falling back to ~/.config/gitsync.
pub fn app_config_dir() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", ".config").map(|dir| dir.join(APP_DIR))
}

fn xdg_dir(var: &str, home_fallback: &str) -> Option<PathBuf> {
    if let Some(xdg) = non_empty_env(var) {
        return Some(PathBuf::from(xdg));
    }
    home_dir().map(|home| home.join(home_fallback))
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.is_empty())
}
