//! Assertion helpers for timing values.

/// Assert that `actual` is within `tolerance` of `expected`.
pub fn assert_approx_eq(actual: f64, expected: f64, tolerance: f64, msg: &str) {
    let diff = (actual - expected).abs();
    assert!(
        diff <= tolerance,
        "{}: expected {} (±{}), got {} (diff: {})",
        msg,
        expected,
        tolerance,
        actual,
        diff
    );
}

/// Assert that two delta sequences match element-wise within `tolerance`.
pub fn assert_deltas_approx_eq(actual: &[f64], expected: &[f64], tolerance: f64, msg: &str) {
    assert_eq!(
        actual.len(),
        expected.len(),
        "{}: expected {} deltas {:?}, got {:?}",
        msg,
        expected.len(),
        expected,
        actual
    );
    for (index, (a, e)) in actual.iter().zip(expected).enumerate() {
        assert_approx_eq(*a, *e, tolerance, &format!("{} - delta {}", msg, index));
    }
}

/// Assert that `values` never decrease.
pub fn assert_monotonic(values: &[f64], msg: &str) {
    for pair in values.windows(2) {
        assert!(
            pair[1] >= pair[0],
            "{}: {} followed {} in {:?}",
            msg,
            pair[1],
            pair[0],
            values
        );
    }
}
