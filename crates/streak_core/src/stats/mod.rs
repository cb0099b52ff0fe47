//! Derived statistics over completion logs.
//!
//! # Responsibility
//! - Turn sparse completion logs into streaks, rates and heatmap data.
//!
//! # Invariants
//! - Every function is pure and total: no I/O, no clock reads, no panics;
//!   degenerate inputs yield zero-valued results.
//! - Every rate/percentage lies in `[0, 100]`.

pub mod overall;
pub mod streak;

/// Integer percentage of `part / whole`, rounded half up; 0 when `whole == 0`.
pub fn percent(part: u32, whole: u32) -> u8 {
    if whole == 0 {
        return 0;
    }
    let part = u64::from(part.min(whole));
    let whole = u64::from(whole);
    // floor(x + 0.5) with x = 100 * part / whole, in integers.
    let rounded = (part * 200 + whole) / (whole * 2);
    u8::try_from(rounded).unwrap_or(100)
}

/// Length of the run of `true` values at the end of `flags`.
pub(crate) fn trailing_run<I>(flags: I) -> u32
where
    I: DoubleEndedIterator<Item = bool>,
{
    let mut run = 0u32;
    for flag in flags.rev() {
        if !flag {
            break;
        }
        run = run.saturating_add(1);
    }
    run
}

/// Length of the longest run of `true` values in `flags`.
pub(crate) fn longest_run<I>(flags: I) -> u32
where
    I: IntoIterator<Item = bool>,
{
    let mut longest = 0u32;
    let mut current = 0u32;
    for flag in flags {
        if flag {
            current = current.saturating_add(1);
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

#[cfg(test)]
mod tests {
    use super::{longest_run, percent, trailing_run};

    #[test]
    fn percent_rounds_half_up_and_guards_zero() {
        assert_eq!(percent(0, 0), 0);
        assert_eq!(percent(1, 2), 50);
        assert_eq!(percent(1, 8), 13);
        assert_eq!(percent(1, 3), 33);
        assert_eq!(percent(2, 3), 67);
        assert_eq!(percent(7, 7), 100);
        assert_eq!(percent(9, 7), 100);
    }

    #[test]
    fn runs_count_trailing_and_longest() {
        let flags = [true, true, true, false, true];
        assert_eq!(trailing_run(flags.into_iter()), 1);
        assert_eq!(longest_run(flags), 3);
        assert_eq!(trailing_run([false].into_iter()), 0);
        assert_eq!(longest_run(Vec::<bool>::new()), 0);
    }
}
