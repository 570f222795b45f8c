// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Unit conversion between the host's internal units and meters
//!
//! The host stores lengths in decimal feet. Everything written to the scene
//! file is in meters; angles stay in radians.

/// Host internal length unit (feet) to meters
pub const FEET_TO_METERS: f64 = 0.3048;

/// Parameter names that are treated as lengths regardless of data type
const LENGTH_NAME_HINTS: [&str; 4] = ["width", "height", "depth", "thickness"];

/// Convert a host length to meters
#[inline]
pub fn feet_to_meters(value: f64) -> f64 {
    value * FEET_TO_METERS
}

/// Convert meters back to a host length
#[inline]
pub fn meters_to_feet(value: f64) -> f64 {
    value / FEET_TO_METERS
}

/// Whether a `Double` parameter holds a length
///
/// True when the data-type tag or the name contains "length", or the name
/// contains one of the common dimension words. All checks are
/// case-insensitive.
pub fn is_length_parameter(name: &str, data_type: &str) -> bool {
    if data_type.to_ascii_lowercase().contains("length") {
        return true;
    }
    let lower = name.to_ascii_lowercase();
    lower.contains("length") || LENGTH_NAME_HINTS.iter().any(|hint| lower.contains(hint))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_length_round_trip() {
        for value in [0.0, 1.0, 3.0, 12.5, -7.25, 1e-6] {
            assert_relative_eq!(meters_to_feet(feet_to_meters(value)), value, epsilon = 1e-12);
        }
        assert_relative_eq!(feet_to_meters(3.0), 0.9144, epsilon = 1e-12);
    }

    #[test]
    fn test_is_length_parameter() {
        assert!(is_length_parameter("Width", "Double"));
        assert!(is_length_parameter("Frame Thickness", ""));
        assert!(is_length_parameter("Offset", "autodesk.spec.aec:length-2.0.0"));
        assert!(is_length_parameter("Sill", "LENGTH"));
        assert!(is_length_parameter("Overall Length", "Double"));
        assert!(!is_length_parameter("Swing Angle", "autodesk.spec.aec:angle-2.0.0"));
        assert!(!is_length_parameter("Count", "Integer"));
    }
}
