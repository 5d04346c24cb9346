//! Centralized reader for GITSYNC_* environment variables.
//!
//! Environment variable names are defined as private constants here;
//! external code accesses values through the `EnvVars` struct.

const TOKEN: &str = "GITSYNC_TOKEN";
const LOG: &str = "GITSYNC_LOG";

/// Snapshot of all GITSYNC_* environment variables at load time.
pub struct EnvVars {
    /// Token supplied inline; stored in the keyring before use.
    pub token: Option<String>,

    /// Log filter directive (e.g. "debug", "gitsync=trace").
    pub log: Option<String>,
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

impl EnvVars {
    /// Read all GITSYNC_* environment variables from the current process.
    pub fn load() -> Self {
        Self {
            token: non_empty_var(TOKEN),
            log: non_empty_var(LOG),
        }
    }
}
