//! Numeric helpers shared by the rating and reward formulas

/// Round to the nearest integer, halves toward positive infinity.
///
/// `2.5 -> 3`, `-16.5 -> -16`. Every reward and rating formula rounds this way.
pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_half_up_positive() {
        assert_eq!(round_half_up(2.5), 3);
        assert_eq!(round_half_up(2.49), 2);
        assert_eq!(round_half_up(16.0), 16);
    }

    #[test]
    fn test_round_half_up_negative() {
        assert_eq!(round_half_up(-16.5), -16);
        assert_eq!(round_half_up(-16.51), -17);
        assert_eq!(round_half_up(-0.4), 0);
    }
}
