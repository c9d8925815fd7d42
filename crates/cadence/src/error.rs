// Copyright (c) The Cadence Project Authors.
// Licensed under the MIT License.

use std::time::Duration;

/// A specialized [`Result`][std::result::Result] type for conductor
/// operations.
pub type Result<T> = std::result::Result<T, Error>;

/// An error returned by a [`Conductor`][crate::Conductor] operation.
///
/// The concrete failure is intentionally opaque; match on the rendered
/// message for diagnostics and treat the value itself as "the operation did
/// not happen".
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct Error(#[from] ErrorKind);

#[derive(Debug, thiserror::Error)]
pub(crate) enum ErrorKind {
    #[error("period {period:?} is not a positive multiple of the base period {base:?}")]
    PeriodMismatch { period: Duration, base: Duration },

    #[error("the roster can only change while the conductor is paused")]
    NotPaused,

    #[error("no registered unit matches the given key")]
    UnknownUnit,
}

impl Error {
    pub(crate) fn period_mismatch(period: Duration, base: Duration) -> Self {
        Self(ErrorKind::PeriodMismatch { period, base })
    }

    pub(crate) fn not_paused() -> Self {
        Self(ErrorKind::NotPaused)
    }

    pub(crate) fn unknown_unit() -> Self {
        Self(ErrorKind::UnknownUnit)
    }

    #[cfg(test)]
    pub(crate) fn kind(&self) -> &ErrorKind {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assert_types() {
        static_assertions::assert_impl_all!(Error: Send, Sync, std::error::Error);
    }

    #[test]
    fn messages_are_rendered() {
        let err = Error::period_mismatch(Duration::from_millis(250), Duration::from_millis(100));
        assert_eq!(
            err.to_string(),
            "period 250ms is not a positive multiple of the base period 100ms"
        );

        assert_eq!(
            Error::not_paused().to_string(),
            "the roster can only change while the conductor is paused"
        );

        assert_eq!(
            Error::unknown_unit().to_string(),
            "no registered unit matches the given key"
        );
    }
}
