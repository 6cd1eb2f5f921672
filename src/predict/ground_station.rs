// WGS-84
const EARTH_EQUATORIAL_RADIUS_KM: f64 = 6378.137;
const EARTH_ECCENTRICITY_SQ: f64 = 0.00669437999014;

/// Fixed ground observer, geodetic coordinates on the WGS-84 ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundStation {
    pub latitude_deg: f64,
    pub longitude_deg: f64,
    pub altitude_m: f64,
}

/// Azimuth/elevation/range of a target as seen from the station.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LookAngles {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
    pub range_km: f64,
}

impl GroundStation {
    /// Parse `"lat,lon"` in decimal degrees.
    pub fn from_coordinates(coordinates: &str, altitude_m: f64) -> Option<Self> {
        let (lat, lon) = coordinates.split_once(',')?;
        let latitude_deg: f64 = lat.trim().parse().ok()?;
        let longitude_deg: f64 = lon.trim().parse().ok()?;

        if !(-90.0..=90.0).contains(&latitude_deg) || !(-180.0..=180.0).contains(&longitude_deg) {
            return None;
        }

        Some(Self {
            latitude_deg,
            longitude_deg,
            altitude_m,
        })
    }

    pub fn position_ecef_km(&self) -> [f64; 3] {
        let lat = self.latitude_deg.to_radians();
        let lon = self.longitude_deg.to_radians();
        let n = EARTH_EQUATORIAL_RADIUS_KM / (1.0 - EARTH_ECCENTRICITY_SQ * lat.sin().powi(2)).sqrt();
        let alt_km = self.altitude_m / 1000.0;

        [
            (n + alt_km) * lat.cos() * lon.cos(),
            (n + alt_km) * lat.cos() * lon.sin(),
            (n * (1.0 - EARTH_ECCENTRICITY_SQ) + alt_km) * lat.sin(),
        ]
    }

    /// Look angles towards an ECEF position.
    pub fn look_at_ecef(&self, target_km: [f64; 3]) -> LookAngles {
        let station = self.position_ecef_km();
        let dr = [
            target_km[0] - station[0],
            target_km[1] - station[1],
            target_km[2] - station[2],
        ];
        let range_km = (dr[0] * dr[0] + dr[1] * dr[1] + dr[2] * dr[2]).sqrt();
        let (east, north, up) = self.to_enu(dr);

        let azimuth_deg = east.atan2(north).to_degrees().rem_euclid(360.0);
        let elevation_deg = if range_km > 0.0 {
            (up / range_km).asin().to_degrees()
        } else {
            90.0
        };

        LookAngles {
            azimuth_deg,
            elevation_deg,
            range_km,
        }
    }

    fn to_enu(&self, dr: [f64; 3]) -> (f64, f64, f64) {
        let (sin_lat, cos_lat) = self.latitude_deg.to_radians().sin_cos();
        let (sin_lon, cos_lon) = self.longitude_deg.to_radians().sin_cos();

        let east = -sin_lon * dr[0] + cos_lon * dr[1];
        let north = -sin_lat * cos_lon * dr[0] - sin_lat * sin_lon * dr[1] + cos_lat * dr[2];
        let up = cos_lat * cos_lon * dr[0] + cos_lat * sin_lon * dr[1] + sin_lat * dr[2];
        (east, north, up)
    }
}
