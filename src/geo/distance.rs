// Copyright 2025 Tellus Contributors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Great-circle distance on the WGS84 mean sphere

/// Mean earth radius used for distance computation, in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two `(lon, lat)` degree coordinates,
/// in kilometers, using the haversine formula.
pub fn great_circle_distance_km(p1: (f64, f64), p2: (f64, f64)) -> f64 {
    let (lon1, lat1) = p1;
    let (lon2, lat2) = p2;

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_phi = (lat2 - lat1).to_radians();
    let delta_lambda = (lon2 - lon1).to_radians();

    let a = (delta_phi / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Distance between two `(lon, lat)` coordinates as truncated integer
/// meters, the unit the join filters on.
pub fn distance_meters(p1: (f64, f64), p2: (f64, f64)) -> i64 {
    (great_circle_distance_km(p1, p2) * 1000.0) as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNI_FREIBURG: (f64, f64) = (7.83505, 48.01267);
    const MUENSTER_FREIBURG: (f64, f64) = (7.85298, 47.99557);
    const EIFFEL_TOWER: (f64, f64) = (2.29451, 48.85825);
    const LONDON_EYE: (f64, f64) = (-0.11957, 51.50333);

    #[test]
    fn test_distance_zero_for_identical_points() {
        assert_eq!(distance_meters(UNI_FREIBURG, UNI_FREIBURG), 0);
        assert_eq!(distance_meters((0.0, 0.0), (0.0, 0.0)), 0);
    }

    #[test]
    fn test_distance_symmetric() {
        let d1 = distance_meters(UNI_FREIBURG, LONDON_EYE);
        let d2 = distance_meters(LONDON_EYE, UNI_FREIBURG);
        assert_eq!(d1, d2);
    }

    #[test]
    fn test_known_distances() {
        // Across Freiburg: a bit over two kilometers.
        let freiburg = distance_meters(UNI_FREIBURG, MUENSTER_FREIBURG);
        assert!((2200..2500).contains(&freiburg), "got {freiburg}");

        // London to Paris: roughly 340 km.
        let london_paris = distance_meters(LONDON_EYE, EIFFEL_TOWER);
        assert!((330_000..350_000).contains(&london_paris), "got {london_paris}");

        // Two degrees of longitude at the equator: roughly 222 km.
        let equator = distance_meters((179.0, 0.0), (-179.0, 0.0));
        assert!((220_000..225_000).contains(&equator), "got {equator}");
    }

    #[test]
    fn test_truncation_not_rounding() {
        // 0.0001 degrees of latitude is ~11.1 meters; the integer result
        // must be the floor of the kilometer value times 1000.
        let km = great_circle_distance_km((0.0, 0.0), (0.0, 0.0001));
        let meters = distance_meters((0.0, 0.0), (0.0, 0.0001));
        assert_eq!(meters, (km * 1000.0) as i64);
        assert!(meters <= (km * 1000.0) as i64);
    }
}
