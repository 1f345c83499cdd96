use std::borrow::Cow;

use thiserror::Error;

/// An error from the `rommeta` crate.
///
/// Not every reader treats every kind as fatal. The tag block scanners stop
/// early and hand back what they found so far when the data runs out, while
/// the image decoder never returns a partial image.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MetaError {
  /// The magic bytes didn't match, this isn't a format we read.
  #[error("not a supported format")]
  NotSupported,

  /// The data ended before a declared length was satisfied.
  #[error("unexpected end of data: {0}")]
  Truncated(Cow<'static, str>),

  /// A value was outside of the range the format allows.
  #[error("malformed data: {0}")]
  Malformed(Cow<'static, str>),

  /// A declared size went past one of the hard ceilings, checked before any
  /// allocation happens.
  #[error("{what} is {actual}, the limit is {limit}")]
  ResourceLimitExceeded {
    /// What was being measured.
    what: &'static str,
    /// The declared value.
    actual: u64,
    /// The ceiling it went past.
    limit: u64,
  },

  /// The allocator couldn't give us enough space.
  #[error("allocation failed")]
  Alloc,

  /// The byte source failed.
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
}

impl From<std::collections::TryReserveError> for MetaError {
  #[inline]
  fn from(_: std::collections::TryReserveError) -> Self {
    Self::Alloc
  }
}

/// Shorthand for results from this crate.
pub type MetaResult<T> = Result<T, MetaError>;

#[inline]
pub(crate) fn truncated(msg: impl Into<Cow<'static, str>>) -> MetaError {
  MetaError::Truncated(msg.into())
}

#[inline]
pub(crate) fn malformed(msg: impl Into<Cow<'static, str>>) -> MetaError {
  MetaError::Malformed(msg.into())
}
