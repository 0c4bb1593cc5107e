// Copyright 2026 the Subduction Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Handles for renderer-owned objects.
//!
//! A [`Uid`] is an opaque non-zero integer that names one entry in one of the
//! renderer's tables. Handles are issued by a [`UidAllocator`] from a
//! monotonically increasing counter that wraps around and skips zero, so a
//! handle is unique until the counter has gone all the way round.
//!
//! Holding a `Uid` never keeps the object it names alive. Every access goes
//! back through the owning table, and a handle whose entry has been removed
//! simply fails to resolve.

use core::fmt;
use core::num::NonZeroU32;

/// An opaque, non-zero handle to a renderer-owned object.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Uid(NonZeroU32);

impl Uid {
    /// Returns the raw handle value (for diagnostics only).
    #[inline]
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0.get()
    }

    /// Reconstructs a handle from a raw value, or `None` for zero.
    #[inline]
    #[must_use]
    pub const fn from_raw(raw: u32) -> Option<Self> {
        match NonZeroU32::new(raw) {
            Some(v) => Some(Self(v)),
            None => None,
        }
    }
}

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Uid({})", self.0)
    }
}

/// Issues [`Uid`]s from a wrapping counter.
#[derive(Clone, Debug)]
pub struct UidAllocator {
    next: NonZeroU32,
}

impl Default for UidAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl UidAllocator {
    /// Creates an allocator whose first handle is `1`.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(1)
    }

    /// Creates an allocator whose first handle is `raw`.
    ///
    /// A `raw` of zero is treated as one.
    #[inline]
    #[must_use]
    pub const fn starting_at(raw: u32) -> Self {
        let next = match NonZeroU32::new(raw) {
            Some(v) => v,
            None => NonZeroU32::MIN,
        };
        Self { next }
    }

    /// Returns the next handle.
    ///
    /// The counter wraps at `u32::MAX` and skips zero.
    #[must_use]
    pub fn assign(&mut self) -> Uid {
        let uid = Uid(self.next);
        self.next = NonZeroU32::new(self.next.get().wrapping_add(1)).unwrap_or(NonZeroU32::MIN);
        uid
    }

    /// Returns the handle the next call to [`assign`](Self::assign) will
    /// produce, without consuming it.
    #[inline]
    #[must_use]
    pub const fn peek(&self) -> Uid {
        Uid(self.next)
    }
}
