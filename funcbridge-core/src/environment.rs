//! Process environment mutation, behind a trait so tests never touch the
//! real process state.
use std::collections::HashMap;
use std::io;

/// The process-level side effects of an environment reload.
pub trait Environment: Send + Sync {
    /// Replaces the whole variable set with `variables`.
    fn reload(&self, variables: &HashMap<String, String>);

    /// Changes the process working directory.
    fn change_directory(&self, directory: &str) -> io::Result<()>;
}

/// [`Environment`] backed by the real process.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn reload(&self, variables: &HashMap<String, String>) {
        let existing: Vec<_> = std::env::vars_os().map(|(key, _)| key).collect();
        for key in existing {
            // SAFETY: reload runs on the dispatch task while no invocation
            // is reading the environment.
            unsafe { std::env::remove_var(key) };
        }
        for (key, value) in variables {
            // SAFETY: as above.
            unsafe { std::env::set_var(key, value) };
        }
    }

    fn change_directory(&self, directory: &str) -> io::Result<()> {
        std::env::set_current_dir(directory)
    }
}
