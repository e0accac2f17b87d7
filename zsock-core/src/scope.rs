//! Scoped acquisition with release on every exit path.
//!
//! [`Scoped`] holds a resource together with the closure that releases it.
//! The release runs exactly once: when the guard is dropped on normal return,
//! when `?` propagates an error out of the scope, when a future holding the
//! guard is cancelled, and during unwinding.
//!
//! # Example
//!
//! ```rust
//! use zsock_core::scope::with_resource;
//!
//! let mut released = Vec::new();
//! let out: Result<usize, ()> = with_resource(
//!     || Ok(vec![1usize, 2, 3]),
//!     |v| released.push(v.len()),
//!     |v| Ok(v.iter().sum()),
//! );
//! assert_eq!(out, Ok(6));
//! assert_eq!(released, vec![3]);
//! ```

use std::ops::{Deref, DerefMut};

/// RAII guard that releases its resource when dropped.
pub struct Scoped<R, F>
where
    F: FnOnce(R),
{
    inner: Option<(R, F)>,
}

impl<R, F> Scoped<R, F>
where
    F: FnOnce(R),
{
    /// Take ownership of `resource`; `release` runs when the guard drops.
    #[inline]
    pub fn new(resource: R, release: F) -> Self {
        Self {
            inner: Some((resource, release)),
        }
    }

    /// Release now instead of at end of scope.
    #[inline]
    pub fn release(mut self) {
        if let Some((resource, release)) = self.inner.take() {
            release(resource);
        }
    }

    /// Hand the resource back without releasing it.
    #[inline]
    pub fn into_inner(mut self) -> R {
        match self.inner.take() {
            Some((resource, _)) => resource,
            None => unreachable!("scoped resource already released"),
        }
    }
}

impl<R, F> Deref for Scoped<R, F>
where
    F: FnOnce(R),
{
    type Target = R;

    fn deref(&self) -> &R {
        match &self.inner {
            Some((resource, _)) => resource,
            None => unreachable!("scoped resource already released"),
        }
    }
}

impl<R, F> DerefMut for Scoped<R, F>
where
    F: FnOnce(R),
{
    fn deref_mut(&mut self) -> &mut R {
        match &mut self.inner {
            Some((resource, _)) => resource,
            None => unreachable!("scoped resource already released"),
        }
    }
}

impl<R, F> Drop for Scoped<R, F>
where
    F: FnOnce(R),
{
    fn drop(&mut self) {
        if let Some((resource, release)) = self.inner.take() {
            release(resource);
        }
    }
}

/// Run `body` with an acquired resource, releasing it on every exit path.
///
/// If `acquire` fails nothing is released and its error is returned.
pub fn with_resource<R, T, E, A, F, B>(acquire: A, release: F, body: B) -> Result<T, E>
where
    A: FnOnce() -> Result<R, E>,
    F: FnOnce(R),
    B: FnOnce(&mut R) -> Result<T, E>,
{
    let mut guard = Scoped::new(acquire()?, release);
    body(&mut guard)
}
