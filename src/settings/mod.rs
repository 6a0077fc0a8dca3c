//! Settings storage
//!
//! [`Settings`] is the resolved, ordered key/value map handed to callers.
//! Each key holds an [`Entry`], which tags the value as plain or sensitive.

mod entry;
mod map;

pub use entry::Entry;
pub use map::Settings;
pub(crate) use map::env_text;
