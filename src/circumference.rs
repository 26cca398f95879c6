//! Circumference estimation from front widths and side depths.
//!
//! Body cross-sections are modeled as ellipses whose axes are the front
//! width and the side depth. Without a side view the circumferences fall
//! back to population ratios of height.

use std::f64::consts::PI;

use crate::anthropometry::{Gender, RatioTable};
use crate::measurement::{MeasurementKey, MeasurementSet, Warning};

/// Perimeter of an ellipse with semi-axes `a` and `b` (Ramanujan's second approximation).
///
/// Returns 0 for non-positive or non-finite axes.
pub fn ellipse_circumference(a: f64, b: f64) -> f64 {
    if !(a.is_finite() && b.is_finite()) || a <= 0.0 || b <= 0.0 {
        return 0.0;
    }
    let h = ((a - b) * (a - b)) / ((a + b) * (a + b));
    PI * (a + b) * (1.0 + 3.0 * h / (10.0 + (4.0 - 3.0 * h).sqrt()))
}

/// Circumference of a cross-section with the given full width and depth.
pub fn cross_section_circumference(width: f64, depth: f64) -> f64 {
    ellipse_circumference(width / 2.0, depth / 2.0)
}

/// Estimate every circumference key.
///
/// Regions with both a front width and a positive side depth use the ellipse
/// model. All others take `height * expected ratio` from the ratio table;
/// a missing side view as a whole produces a [`Warning::MissingSideView`].
pub fn estimate(
    front_widths: &MeasurementSet,
    side_depths: Option<&MeasurementSet>,
    height: f64,
    gender: Gender,
) -> (MeasurementSet, Vec<Warning>) {
    let table = RatioTable::for_gender(gender);
    let mut warnings = Vec::new();
    if side_depths.is_none() {
        tracing::warn!("no side view, circumferences from population ratios");
        warnings.push(Warning::MissingSideView);
    }

    let mut out = MeasurementSet::new();
    for key in MeasurementKey::CIRCUMFERENCES {
        let width = front_widths.get(key).unwrap_or(0.0);
        let depth = side_depths.and_then(|d| d.get(key)).unwrap_or(0.0);

        let value = if width > 0.0 && depth > 0.0 {
            cross_section_circumference(width, depth)
        } else {
            table
                .get(key)
                .map(|entry| height * entry.expected_ratio)
                .unwrap_or(0.0)
        };
        tracing::debug!(key = %key, width, depth, value, "circumference");
        out.insert(key, value);
    }
    (out, warnings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_circle_is_exact() {
        let c = ellipse_circumference(10.0, 10.0);
        assert!((c - 2.0 * PI * 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_axes() {
        assert_eq!(ellipse_circumference(0.0, 5.0), 0.0);
        assert_eq!(ellipse_circumference(5.0, -1.0), 0.0);
        assert_eq!(ellipse_circumference(f64::NAN, 5.0), 0.0);
    }

    #[test]
    fn test_known_ellipse_perimeter() {
        // a=10, b=5: reference perimeter 48.4422...
        let c = ellipse_circumference(10.0, 5.0);
        assert!((c - 48.4422).abs() < 1e-3);
    }

    #[test]
    fn test_cross_section_bounds() {
        let cases = [(30.0, 20.0), (38.5, 24.2), (10.0, 9.0), (40.0, 2.0), (1.0, 50.0)];
        for (w, d) in cases {
            let c = cross_section_circumference(w, d);
            assert!(c > 2.0 * f64::max(w, d), "{w}x{d}: {c}");
            assert!(c < PI * (w + d), "{w}x{d}: {c}");
        }
    }

    #[test]
    fn test_estimate_with_side_depths() {
        let widths: MeasurementSet = [(MeasurementKey::Chest, 34.0), (MeasurementKey::Neck, 9.0)]
            .into_iter()
            .collect();
        let depths: MeasurementSet = [(MeasurementKey::Chest, 24.0)].into_iter().collect();
        let (out, warnings) = estimate(&widths, Some(&depths), 175.0, Gender::Male);
        assert!(warnings.is_empty());

        let chest = out.get(MeasurementKey::Chest).unwrap();
        assert!((chest - cross_section_circumference(34.0, 24.0)).abs() < 1e-9);

        // no neck depth: ratio fallback for that region only
        let neck_ratio = RatioTable::for_gender(Gender::Male)
            .get(MeasurementKey::Neck)
            .unwrap()
            .expected_ratio;
        assert!((out.get(MeasurementKey::Neck).unwrap() - 175.0 * neck_ratio).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_without_side_view_uses_ratios() {
        let widths: MeasurementSet = [(MeasurementKey::Waist, 30.0)].into_iter().collect();
        let (out, warnings) = estimate(&widths, None, 160.0, Gender::Female);
        assert_eq!(warnings, vec![Warning::MissingSideView]);

        let table = RatioTable::for_gender(Gender::Female);
        for key in MeasurementKey::CIRCUMFERENCES {
            let expected = 160.0 * table.get(key).unwrap().expected_ratio;
            assert!((out.get(key).unwrap() - expected).abs() < 1e-9);
        }
    }
}
