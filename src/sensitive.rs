//! Sensitive value wrapper
//!
//! A [`Sensitive`] flags a settings value as secret. Reading it through
//! [`Settings`](crate::Settings) is transparent; only the explicit masking
//! path ([`Sensitive::mask`], [`Settings::masked`](crate::Settings::masked))
//! hides it.

use std::fmt;

use crate::error::{EnvError, Result};

/// Number of asterisks produced by [`Sensitive::mask`] unless overridden
pub const DEFAULT_MASK_WIDTH: usize = 10;

/// A value that must be masked on export.
///
/// `Display` forwards to the wrapped value; formatting is not an
/// export path. Use [`Sensitive::mask`] for anything that leaves the process.
#[derive(Clone, PartialEq)]
pub struct Sensitive<T> {
    value: T,
    mask_width: usize,
}

impl<T> Sensitive<T> {
    /// Wrap `value` with the default mask width
    pub fn new(value: T) -> Self {
        Self {
            value,
            mask_width: DEFAULT_MASK_WIDTH,
        }
    }

    /// Wrap `value` with a custom mask width.
    ///
    /// # Errors
    ///
    /// Returns [`EnvError::InvalidArgument`] if `mask_width` is zero.
    pub fn with_mask_width(value: T, mask_width: usize) -> Result<Self> {
        if mask_width == 0 {
            return Err(EnvError::invalid_argument(
                "mask width must be greater than 0",
            ));
        }
        Ok(Self { value, mask_width })
    }

    /// Wrap a new value under the same masking policy as `self`
    pub(crate) fn rewrap<U>(&self, value: U) -> Sensitive<U> {
        Sensitive {
            value,
            mask_width: self.mask_width,
        }
    }

    /// A string of `mask_width` asterisks
    pub fn mask(&self) -> String {
        "*".repeat(self.mask_width)
    }

    pub fn mask_width(&self) -> usize {
        self.mask_width
    }

    /// Borrow the wrapped value
    pub fn inner(&self) -> &T {
        &self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T: fmt::Display> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.value.fmt(f)
    }
}

impl<T: fmt::Debug> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Sensitive").field(&self.value).finish()
    }
}
