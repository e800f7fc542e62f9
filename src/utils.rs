//! Small helpers shared across the crate: logging setup and a couple of
//! fluent combinators used by the config/builder types.

use log::{error, LevelFilter};

/// Initialize [env_logger] at the given level.
///
/// This is a thin wrapper so callers (the CLI, doc examples, tests) don't
/// need to depend on `env_logger` directly.
pub fn activate_logging(log_level: LevelFilter) {
    let _ = env_logger::Builder::new()
        .filter_level(log_level)
        .try_init();
}

/// Log the `Err` variant of a `Result` at `error` level, without consuming
/// the result.
///
/// Useful in builder chains where a failure should be visible in the logs
/// but handled (or ignored) by the caller rather than panicking.
pub trait LogOnErr<T, E> {
    fn log_on_err(self) -> Self;
}

impl<T, E: std::fmt::Display> LogOnErr<T, E> for Result<T, E> {
    fn log_on_err(self) -> Self {
        if let Err(ref e) = self {
            error!("{}", e);
        }
        self
    }
}

/// Run a closure to produce a default when an `Option` is `None`, otherwise
/// pass the existing value through.
///
/// Reads more naturally than `unwrap_or_else` in config builders where the
/// "else" branch does more than construct a plain default, e.g. logging that
/// a fallback was used.
pub trait IfNoneThen<T> {
    fn if_none_then(self, f: impl FnOnce() -> Option<T>) -> Option<T>;
}

impl<T> IfNoneThen<T> for Option<T> {
    fn if_none_then(self, f: impl FnOnce() -> Option<T>) -> Option<T> {
        match self {
            Some(v) => Some(v),
            None => f(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_on_err_passes_through_ok() {
        let res: Result<i32, String> = Ok(5);
        assert_eq!(res.log_on_err().unwrap(), 5);
    }

    #[test]
    fn log_on_err_passes_through_err() {
        let res: Result<i32, String> = Err("boom".to_string());
        assert!(res.log_on_err().is_err());
    }

    #[test]
    fn if_none_then_uses_fallback_only_when_none() {
        assert_eq!(Some(1).if_none_then(|| Some(2)), Some(1));
        assert_eq!(None.if_none_then(|| Some(2)), Some(2));
    }
}
