use std::fmt::Display;

use tracing::warn;

/// Result of a read that never fails outward: either fresh data or the
/// documented fallback together with what went wrong.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome<T> {
    Fresh(T),
    Degraded { value: T, cause: String },
}

impl<T> Outcome<T> {
    pub fn degraded(value: T, cause: impl Into<String>) -> Self {
        Outcome::Degraded {
            value,
            cause: cause.into(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Outcome::Degraded { .. })
    }

    pub fn cause(&self) -> Option<&str> {
        match self {
            Outcome::Fresh(_) => None,
            Outcome::Degraded { cause, .. } => Some(cause),
        }
    }

    pub fn value(&self) -> &T {
        match self {
            Outcome::Fresh(value) | Outcome::Degraded { value, .. } => value,
        }
    }

    pub fn into_inner(self) -> T {
        match self {
            Outcome::Fresh(value) | Outcome::Degraded { value, .. } => value,
        }
    }

    /// Transforms the carried value. A degraded outcome stays degraded.
    pub fn map<U, F>(self, f: F) -> Outcome<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            Outcome::Fresh(value) => Outcome::Fresh(f(value)),
            Outcome::Degraded { value, cause } => Outcome::Degraded {
                value: f(value),
                cause,
            },
        }
    }
}

impl<T: Default> Outcome<T> {
    /// Logs the failure under `context` and falls back to `T::default()`.
    pub fn recover<E: Display>(result: Result<T, E>, context: &str) -> Self {
        match result {
            Ok(value) => Outcome::Fresh(value),
            Err(err) => {
                warn!("{context} failed, returning fallback: {err}");
                Outcome::degraded(T::default(), format!("{context}: {err}"))
            }
        }
    }
}
