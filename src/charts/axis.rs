/// Padding added to each side, as a share of the data extent.
pub const PADDING_PERCENT: f64 = 0.05;

/// A bound this close to zero (relative) is left unpadded.
pub const ZERO_RTOL: f64 = 1e-3;

const ZERO_ATOL: f64 = 1e-8;

/// Min/max axis bounds for `values`, padded for aesthetics.
///
/// Each side is widened by `padding_percent` of the extent unless it is within
/// `zero_rtol` of zero, so axes that start at zero stay there. Non-finite
/// values are ignored; `None` if nothing finite remains.
pub fn axis_bounds(values: &[f64], padding_percent: f64, zero_rtol: f64) -> Option<(f64, f64)> {
    let mut finite = values.iter().copied().filter(|v| v.is_finite());
    let first = finite.next()?;
    let (mut min_bound, mut max_bound) =
        finite.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v)));

    let padding = (max_bound - min_bound) * padding_percent;
    if !is_close_to_zero(min_bound, zero_rtol) {
        min_bound -= padding;
    }
    if !is_close_to_zero(max_bound, zero_rtol) {
        max_bound += padding;
    }
    Some((min_bound, max_bound))
}

// allclose(0, x): |0 - x| <= atol + rtol * |x|
fn is_close_to_zero(x: f64, rtol: f64) -> bool {
    x.abs() <= ZERO_ATOL + rtol * x.abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_both_sides_by_extent() {
        let (lo, hi) = axis_bounds(&[10.0, 20.0, 30.0], PADDING_PERCENT, ZERO_RTOL).unwrap();
        assert!((lo - 9.0).abs() < 1e-9);
        assert!((hi - 31.0).abs() < 1e-9);
    }

    #[test]
    fn zero_bound_is_not_padded() {
        let (lo, hi) = axis_bounds(&[0.0, 100.0], PADDING_PERCENT, ZERO_RTOL).unwrap();
        assert_eq!(lo, 0.0);
        assert!((hi - 105.0).abs() < 1e-9);
    }

    #[test]
    fn non_finite_values_are_ignored() {
        assert_eq!(axis_bounds(&[f64::NAN, f64::INFINITY], 0.05, 1e-3), None);
        assert_eq!(axis_bounds(&[], 0.05, 1e-3), None);
        let (lo, hi) = axis_bounds(&[f64::NAN, 5.0], 0.05, 1e-3).unwrap();
        assert_eq!((lo, hi), (5.0, 5.0));
    }
}
