use crate::models::{GeoPoint, GeoRange};

/// Approximate latitude degrees per mile near continental mid-latitudes
const LAT_DEGREES_PER_MILE: f64 = 0.01446491;

/// Approximate longitude degrees per mile near continental mid-latitudes
const LON_DEGREES_PER_MILE: f64 = 0.01734522;

/// Calculate a rectangular lat/long bounding box around a point.
///
/// Uses fixed empirical degree-per-mile constants, not a geodesic
/// calculation. This is a known approximation carried over from the search
/// contract; the account query filter depends on exactly these bounds.
pub fn bounding_box(point: GeoPoint, radius_miles: u32) -> GeoRange {
    let latitude_delta = radius_miles as f64 * LAT_DEGREES_PER_MILE;
    let longitude_delta = radius_miles as f64 * LON_DEGREES_PER_MILE;

    GeoRange {
        latitude_min: point.latitude - latitude_delta,
        latitude_max: point.latitude + latitude_delta,
        longitude_min: point.longitude - longitude_delta,
        longitude_max: point.longitude + longitude_delta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PHOENIX: GeoPoint = GeoPoint {
        latitude: 33.4942,
        longitude: -111.9261,
    };

    #[test]
    fn test_range_contains_center() {
        let range = bounding_box(PHOENIX, 25);

        assert!(range.latitude_min <= PHOENIX.latitude);
        assert!(range.latitude_max >= PHOENIX.latitude);
        assert!(range.longitude_min <= PHOENIX.longitude);
        assert!(range.longitude_max >= PHOENIX.longitude);
    }

    #[test]
    fn test_zero_radius_collapses_to_point() {
        let range = bounding_box(PHOENIX, 0);

        assert_eq!(range.latitude_min, PHOENIX.latitude);
        assert_eq!(range.latitude_max, PHOENIX.latitude);
        assert_eq!(range.longitude_min, PHOENIX.longitude);
        assert_eq!(range.longitude_max, PHOENIX.longitude);
    }

    #[test]
    fn test_width_scales_linearly_with_radius() {
        let small = bounding_box(PHOENIX, 10);
        let large = bounding_box(PHOENIX, 30);

        let small_lat_span = small.latitude_max - small.latitude_min;
        let large_lat_span = large.latitude_max - large.latitude_min;
        assert!((large_lat_span - 3.0 * small_lat_span).abs() < 1e-9);

        let small_lon_span = small.longitude_max - small.longitude_min;
        let large_lon_span = large.longitude_max - large.longitude_min;
        assert!((large_lon_span - 3.0 * small_lon_span).abs() < 1e-9);
    }

    #[test]
    fn test_fixed_constants() {
        let range = bounding_box(PHOENIX, 1);

        assert!((range.latitude_max - PHOENIX.latitude - 0.01446491).abs() < 1e-12);
        assert!((range.longitude_max - PHOENIX.longitude - 0.01734522).abs() < 1e-12);
    }
}
