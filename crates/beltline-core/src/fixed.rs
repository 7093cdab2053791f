use fixed::types::I32F32;

/// Q32.32 fixed-point: 32 integer bits, 32 fractional bits.
pub type Fixed64 = I32F32;

/// Ticks are the atomic unit of simulation time.
pub type Ticks = u64;

/// Convert an f64 to Fixed64. Use only for initialization, never in sim loop.
#[inline]
pub fn f64_to_fixed64(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

/// Convert Fixed64 to f64. Use only for display and snapshots.
#[inline]
pub fn fixed64_to_f64(v: Fixed64) -> f64 {
    v.to_num::<f64>()
}

/// Convert an f64 that may come from outside the simulation (frame timers,
/// operator input). Returns `None` for NaN, infinities, and values outside
/// the Q32.32 range instead of panicking.
#[inline]
pub fn try_f64_to_fixed64(v: f64) -> Option<Fixed64> {
    if v.is_finite() {
        Fixed64::checked_from_num(v)
    } else {
        None
    }
}

/// Checked division for Fixed64 that returns None on zero divisor.
#[inline]
pub fn checked_div_64(a: Fixed64, b: Fixed64) -> Option<Fixed64> {
    a.checked_div(b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed64_fraction_of_belt() {
        let gap = f64_to_fixed64(10.0);
        let length = f64_to_fixed64(80.0);
        let frac = checked_div_64(gap, length).unwrap();
        assert_eq!(fixed64_to_f64(frac), 0.125);
    }

    #[test]
    fn fixed64_checked_div_by_zero() {
        let a = f64_to_fixed64(1.0);
        let zero = f64_to_fixed64(0.0);
        assert!(checked_div_64(a, zero).is_none());
    }

    #[test]
    fn try_convert_rejects_non_finite() {
        assert!(try_f64_to_fixed64(f64::NAN).is_none());
        assert!(try_f64_to_fixed64(f64::INFINITY).is_none());
        assert!(try_f64_to_fixed64(1e300).is_none());
        assert_eq!(try_f64_to_fixed64(0.5), Some(f64_to_fixed64(0.5)));
    }

    #[test]
    fn fixed64_determinism() {
        let a = f64_to_fixed64(0.3 / 80.0);
        let b = f64_to_fixed64(0.3 / 80.0);
        assert_eq!(a * f64_to_fixed64(3.0), b * f64_to_fixed64(3.0));
    }
}
