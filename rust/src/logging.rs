//! Verbosity-gated logging for the simulator and scheduling policies.
//!
//! Nothing is formatted when the level is below the threshold, so a silent
//! run pays only for an integer comparison per call site.
//! - 0: SILENT (only errors)
//! - 1: CHANGES (assignments, completions, clock advances)
//! - 2: CHECKS (each dispatch attempt and why it was skipped)
//! - 3: DEBUG (policy internals: split points, fallbacks, promotion draws)

pub const VERBOSITY_SILENT: u8 = 0;
pub const VERBOSITY_CHANGES: u8 = 1;
pub const VERBOSITY_CHECKS: u8 = 2;
pub const VERBOSITY_DEBUG: u8 = 3;

/// Clamp an arbitrary user-supplied level into the supported range.
pub fn clamp_verbosity(level: u8) -> u8 {
    level.min(VERBOSITY_DEBUG)
}

/// Log at CHANGES level (verbosity >= 1).
#[macro_export]
macro_rules! log_changes {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHANGES {
            eprintln!($($arg)*);
        }
    };
}

/// Log at CHECKS level (verbosity >= 2).
#[macro_export]
macro_rules! log_checks {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_CHECKS {
            eprintln!($($arg)*);
        }
    };
}

/// Log at DEBUG level (verbosity >= 3).
#[macro_export]
macro_rules! log_debug {
    ($verbosity:expr, $($arg:tt)*) => {
        if $verbosity >= $crate::logging::VERBOSITY_DEBUG {
            eprintln!($($arg)*);
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_verbosity() {
        assert_eq!(clamp_verbosity(0), VERBOSITY_SILENT);
        assert_eq!(clamp_verbosity(2), VERBOSITY_CHECKS);
        assert_eq!(clamp_verbosity(200), VERBOSITY_DEBUG);
    }

    #[test]
    fn test_log_macros_silent() {
        let verbosity = VERBOSITY_SILENT;
        log_changes!(verbosity, "assigned {}", "a");
        log_checks!(verbosity, "skipped {}", "b");
        log_debug!(verbosity, "split at {}", 3);
    }
}
