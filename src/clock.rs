//! Calendar access for fee calculation
//!
//! Rental fees depend on whether an item was published in the current year.
//! The catalog asks a [`Clock`] for that year instead of reading system time
//! directly, so the year can be pinned.

use chrono::Datelike;

/// Source of the current calendar year
pub trait Clock {
    /// Returns the current calendar year (e.g. 2024)
    fn current_year(&self) -> i32;
}

/// Clock backed by the local system time
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_year(&self) -> i32 {
        chrono::Local::now().year()
    }
}

/// Clock that always reports the same year
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClock(pub i32);

impl Clock for FixedClock {
    fn current_year(&self) -> i32 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock() {
        assert_eq!(FixedClock(1999).current_year(), 1999);
    }

    #[test]
    fn test_system_clock_matches_chrono() {
        assert_eq!(SystemClock.current_year(), chrono::Local::now().year());
    }
}
