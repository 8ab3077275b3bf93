//! Rotated-pole coordinate transform
//!
//! The analysis grid uses a rotated-pole system (the geographic pole is
//! shifted so the grid sits nearly distortion-free over Iberia). Display
//! happens in plain longitude/latitude, so composition needs the forward
//! (rotated to geographic) transform; the inverse is used to place
//! geographic data inside the rotated viewport window.
//!
//! Implemented as two sphere rotations: a tilt about the y axis by
//! (pole latitude - 90°) followed by a spin about the z axis by
//! (pole longitude + 180°). The inverse applies them in reverse.

/// A rotated-pole coordinate reference, defined by the true position of the
/// rotated system's north pole.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RotatedPole {
    /// True longitude of the rotated north pole, degrees
    pub pole_lon: f64,
    /// True latitude of the rotated north pole, degrees
    pub pole_lat: f64,
}

impl RotatedPole {
    pub fn new(pole_lon: f64, pole_lat: f64) -> Self {
        RotatedPole { pole_lon, pole_lat }
    }

    /// Convert rotated coordinates to geographic longitude/latitude (degrees)
    pub fn to_geographic(&self, rlon: f64, rlat: f64) -> (f64, f64) {
        let (x, y, z) = unit_vector(rlon, rlat);

        // Tilt the pole down to its true latitude
        let tilt = (self.pole_lat - 90.0).to_radians();
        let (x, y, z) = rotate_y(x, y, z, tilt);

        // Spin to the true pole longitude
        let spin = (self.pole_lon + 180.0).to_radians();
        let (x, y, z) = rotate_z(x, y, z, spin);

        to_lonlat(x, y, z)
    }

    /// Convert geographic longitude/latitude to rotated coordinates (degrees)
    pub fn to_rotated(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y, z) = unit_vector(lon, lat);

        let spin = (self.pole_lon + 180.0).to_radians();
        let (x, y, z) = rotate_z(x, y, z, -spin);

        let tilt = (self.pole_lat - 90.0).to_radians();
        let (x, y, z) = rotate_y(x, y, z, -tilt);

        to_lonlat(x, y, z)
    }
}

fn unit_vector(lon_deg: f64, lat_deg: f64) -> (f64, f64, f64) {
    let lon = lon_deg.to_radians();
    let lat = lat_deg.to_radians();
    (lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
}

fn to_lonlat(x: f64, y: f64, z: f64) -> (f64, f64) {
    let lat = z.clamp(-1.0, 1.0).asin().to_degrees();
    let lon = y.atan2(x).to_degrees();
    (normalize_lon(lon), lat)
}

fn rotate_y(x: f64, y: f64, z: f64, angle: f64) -> (f64, f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (x * cos + z * sin, y, z * cos - x * sin)
}

fn rotate_z(x: f64, y: f64, z: f64, angle: f64) -> (f64, f64, f64) {
    let (sin, cos) = angle.sin_cos();
    (x * cos - y * sin, x * sin + y * cos, z)
}

/// Wrap a longitude into [-180, 180)
fn normalize_lon(lon: f64) -> f64 {
    let mut lon = (lon + 180.0) % 360.0;
    if lon < 0.0 {
        lon += 360.0;
    }
    lon - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    const SPAIN_POLE: RotatedPole = RotatedPole {
        pole_lon: -186.0,
        pole_lat: 49.5,
    };

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn rotated_origin_lands_on_central_spain() {
        let (lon, lat) = SPAIN_POLE.to_geographic(0.0, 0.0);
        assert_close(lon, -6.0);
        assert_close(lat, 40.5);
    }

    #[test]
    fn rotated_north_pole_maps_to_the_declared_pole() {
        let (lon, lat) = SPAIN_POLE.to_geographic(0.0, 90.0);
        assert_close(lat, 49.5);
        // -186 wraps to 174
        assert_close(lon, 174.0);
    }

    #[test]
    fn round_trip_is_identity() {
        for &(rlon, rlat) in &[
            (0.0, 0.0),
            (-3.0, -4.0),
            (8.0, 3.0),
            (2.5, -1.25),
            (-0.11, 0.11),
        ] {
            let (lon, lat) = SPAIN_POLE.to_geographic(rlon, rlat);
            let (rlon2, rlat2) = SPAIN_POLE.to_rotated(lon, lat);
            assert_close(rlon2, rlon);
            assert_close(rlat2, rlat);
        }
    }

    #[test]
    fn identity_pole_is_a_no_op() {
        // A pole at the true north pole leaves coordinates unchanged
        let identity = RotatedPole::new(-180.0, 90.0);
        let (lon, lat) = identity.to_geographic(12.5, 47.0);
        assert_close(lon, 12.5);
        assert_close(lat, 47.0);
    }

    #[test]
    fn longitudes_normalize_into_half_open_range() {
        assert_close(normalize_lon(190.0), -170.0);
        assert_close(normalize_lon(-190.0), 170.0);
        assert_close(normalize_lon(-180.0), -180.0);
        assert_close(normalize_lon(540.0), -180.0);
    }
}
