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

//! Spherical bounding rectangles
//!
//! For a center point and a radius in meters this module produces one or
//! two axis-aligned lon/lat rectangles that are a superset of every point
//! within the radius. A neighborhood touching a pole snaps to a single
//! full-longitude rectangle; one crossing the antimeridian splits into
//! two rectangles. Candidate sets retrieved through these rectangles must
//! always be re-verified with the exact great-circle distance.

use geo_types::{Coord, Rect};
use smallvec::{smallvec, SmallVec};

/// Earth radius used for the bounding geometry, in meters.
pub const EARTH_RADIUS_M: f64 = 6_378_000.0;

/// Equatorial circumference used for the bounding geometry, in meters.
pub const EARTH_CIRCUMFERENCE_M: f64 = 40_075_000.0;

/// The rectangles bounding one neighborhood: one in the common case, two
/// when the neighborhood wraps around the antimeridian.
pub type BoundingRects = SmallVec<[Rect<f64>; 2]>;

/// Haversine of an angle in radians.
#[inline]
fn hav(theta: f64) -> f64 {
    (1.0 - theta.cos()) / 2.0
}

/// Inverse haversine.
#[inline]
fn archav(h: f64) -> f64 {
    (1.0 - 2.0 * h.clamp(0.0, 1.0)).acos()
}

#[inline]
fn rect(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Rect<f64> {
    Rect::new(
        Coord { x: min_lon, y: min_lat },
        Coord { x: max_lon, y: max_lat },
    )
}

/// Compute the bounding rectangles of all points within `max_dist_m`
/// meters of `center` (`x` = longitude, `y` = latitude, degrees).
pub fn bounding_rectangles(center: Coord<f64>, max_dist_m: i64) -> BoundingRects {
    // Safety buffer for numerical inaccuracies. The 10 m floor compensates
    // for the integer rounding of distances near zero.
    let radius = if max_dist_m < 10 {
        10.0
    } else if (max_dist_m as f64) < i64::MAX as f64 / 1.02 {
        1.01 * max_dist_m as f64
    } else {
        i64::MAX as f64
    };

    let delta_lat = radius * (360.0 / EARTH_CIRCUMFERENCE_M);
    let mut upper_lat = center.y + delta_lat;
    let mut lower_lat = center.y - delta_lat;
    let mut pole_reached = false;
    if lower_lat <= -90.0 {
        lower_lat = -90.0;
        pole_reached = true;
    }
    if upper_lat >= 90.0 {
        upper_lat = 90.0;
        pole_reached = true;
    }
    if pole_reached {
        // Every longitude occurs within the neighborhood of a pole.
        return smallvec![rect(-180.0, lower_lat, 180.0, upper_lat)];
    }

    // Longitude half-width from the spherical triangle between the center,
    // the nearer pole and the point of maximal longitude difference.
    let alpha = radius / EARTH_RADIUS_M;
    let gamma = (90.0 - center.y.abs()).to_radians();
    let beta = (gamma.cos() / alpha.cos()).clamp(-1.0, 1.0).acos();
    let delta = if radius > EARTH_CIRCUMFERENCE_M / 20.0 {
        // law of cosines
        let cos_delta =
            (alpha.cos() - gamma.cos() * beta.cos()) / (gamma.sin() * beta.sin());
        cos_delta.clamp(-1.0, 1.0).acos()
    } else {
        // law of haversines, numerically stable for small radii
        archav(hav(alpha - hav(gamma - beta)) / (gamma.sin() * beta.sin()))
    };
    let lon_half = delta.to_degrees();

    let lower_lon = center.x - lon_half;
    let upper_lon = center.x + lon_half;
    if lower_lon < -180.0 {
        smallvec![
            rect(-180.0, lower_lat, upper_lon, upper_lat),
            rect(lower_lon + 360.0, lower_lat, 180.0, upper_lat),
        ]
    } else if upper_lon > 180.0 {
        smallvec![
            rect(lower_lon, lower_lat, 180.0, upper_lat),
            rect(-180.0, lower_lat, upper_lon - 360.0, upper_lat),
        ]
    } else {
        smallvec![rect(lower_lon, lower_lat, upper_lon, upper_lat)]
    }
}

/// Test whether a point lies in any of the rectangles (inclusive on the
/// boundary). The point's longitude is normalized into `[-180, 180]` and
/// its latitude clamped to `[-90, 90]` first.
pub fn covered_by(rects: &[Rect<f64>], point: Coord<f64>) -> bool {
    let mut lon = point.x;
    while lon < -180.0 {
        lon += 360.0;
    }
    while lon > 180.0 {
        lon -= 360.0;
    }
    let lat = point.y.clamp(-90.0, 90.0);

    rects.iter().any(|r| {
        lon >= r.min().x && lon <= r.max().x && lat >= r.min().y && lat <= r.max().y
    })
}
