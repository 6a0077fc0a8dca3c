//! Shared helpers for tests that touch the process environment

use std::sync::{Mutex, MutexGuard, PoisonError};

// Global mutex to ensure env-dependent tests run sequentially
static ENV_LOCK: Mutex<()> = Mutex::new(());

pub(crate) fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Helper to safely set environment variables for a test
pub(crate) struct EnvGuard {
    vars_to_restore: Vec<(String, Option<String>)>,
}

impl EnvGuard {
    pub(crate) fn new() -> Self {
        Self {
            vars_to_restore: Vec::new(),
        }
    }

    /// Record `key` so it is restored on drop, without changing it
    pub(crate) fn track(&mut self, key: &str) {
        let original = std::env::var(key).ok();
        self.vars_to_restore.push((key.to_string(), original));
    }

    pub(crate) fn set(&mut self, key: &str, value: &str) {
        self.track(key);
        unsafe {
            std::env::set_var(key, value);
        }
    }

    pub(crate) fn remove(&mut self, key: &str) {
        self.track(key);
        unsafe {
            std::env::remove_var(key);
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        // Restore in reverse so the first recorded original wins
        for (key, original_value) in self.vars_to_restore.iter().rev() {
            unsafe {
                match original_value {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
    }
}
