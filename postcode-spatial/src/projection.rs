//! Reference systems and reprojection to and from WGS84.
//!
//! Supported SRIDs:
//!
//! | SRID  | System                                   |
//! |-------|------------------------------------------|
//! | 4326  | WGS84 lon/lat (store canonical)          |
//! | 4258  | ETRS89 lon/lat (within a metre of WGS84) |
//! | 3857  | Web mercator                             |
//! | 27700 | British National Grid (OSGB36)           |
//! | 29902 | Irish Grid (TM65)                        |
//!
//! The national grids are transverse mercator projections on their own
//! ellipsoids; the datum change to WGS84 is a seven-parameter Helmert
//! transform, accurate to a few metres.

use crate::error::{Result, SpatialError};
use geo_types::Point;
use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

/// Earth radius used by web mercator.
const MERCATOR_RADIUS: f64 = 6_378_137.0;

const MERCATOR_MAX: f64 = 20_037_508.342_789_244;

/// A reference system the store can reproject from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceSystem {
    Wgs84,
    Etrs89,
    WebMercator,
    BritishNationalGrid,
    IrishGrid,
}

impl ReferenceSystem {
    /// Look up a reference system by SRID.
    pub fn from_srid(srid: i32) -> Result<Self> {
        match srid {
            4326 => Ok(ReferenceSystem::Wgs84),
            4258 => Ok(ReferenceSystem::Etrs89),
            3857 | 900913 => Ok(ReferenceSystem::WebMercator),
            27700 => Ok(ReferenceSystem::BritishNationalGrid),
            29902 => Ok(ReferenceSystem::IrishGrid),
            other => Err(SpatialError::UnknownSrid(other)),
        }
    }

    /// Canonical SRID.
    pub fn srid(&self) -> i32 {
        match self {
            ReferenceSystem::Wgs84 => 4326,
            ReferenceSystem::Etrs89 => 4258,
            ReferenceSystem::WebMercator => 3857,
            ReferenceSystem::BritishNationalGrid => 27700,
            ReferenceSystem::IrishGrid => 29902,
        }
    }

    /// Reproject `(x, y)` in this system to a WGS84 point (x = lon, y = lat).
    pub fn to_wgs84(&self, x: f64, y: f64) -> Result<Point<f64>> {
        let out_of_bounds = || SpatialError::PointOutOfBounds {
            x,
            y,
            srid: self.srid(),
        };
        if !(x.is_finite() && y.is_finite()) {
            return Err(out_of_bounds());
        }

        let (lng, lat) = match self {
            ReferenceSystem::Wgs84 | ReferenceSystem::Etrs89 => (x, y),
            ReferenceSystem::WebMercator => {
                if x.abs() > MERCATOR_MAX || y.abs() > MERCATOR_MAX {
                    return Err(out_of_bounds());
                }
                let lng = (x / MERCATOR_RADIUS).to_degrees();
                let lat = (2.0 * (y / MERCATOR_RADIUS).exp().atan() - FRAC_PI_2).to_degrees();
                (lng, lat)
            }
            ReferenceSystem::BritishNationalGrid | ReferenceSystem::IrishGrid => {
                let grid = self.grid().ok_or_else(out_of_bounds)?;
                if !grid.in_extent(x, y) {
                    return Err(out_of_bounds());
                }
                let (lat, lng) = grid.projection.inverse(x, y).ok_or_else(out_of_bounds)?;
                let (lat, lng) =
                    grid.from_wgs84
                        .inverse()
                        .apply(lat, lng, grid.projection.ellipsoid, WGS84);
                (lng, lat)
            }
        };

        if !(lat.is_finite() && lng.is_finite() && lat.abs() <= 90.0 && lng.abs() <= 180.0) {
            return Err(out_of_bounds());
        }
        Ok(Point::new(lng, lat))
    }

    /// Project a WGS84 point into this system, returning `(x, y)`.
    pub fn from_wgs84(&self, point: &Point<f64>) -> Result<(f64, f64)> {
        let (lng, lat) = (point.x(), point.y());
        let out_of_bounds = || SpatialError::PointOutOfBounds {
            x: lng,
            y: lat,
            srid: self.srid(),
        };
        if !(lat.is_finite() && lng.is_finite() && lat.abs() <= 90.0 && lng.abs() <= 180.0) {
            return Err(out_of_bounds());
        }

        match self {
            ReferenceSystem::Wgs84 | ReferenceSystem::Etrs89 => Ok((lng, lat)),
            ReferenceSystem::WebMercator => {
                let y = MERCATOR_RADIUS * (FRAC_PI_4 + lat.to_radians() / 2.0).tan().ln();
                if !y.is_finite() || y.abs() > MERCATOR_MAX {
                    return Err(out_of_bounds());
                }
                Ok((MERCATOR_RADIUS * lng.to_radians(), y))
            }
            ReferenceSystem::BritishNationalGrid | ReferenceSystem::IrishGrid => {
                let grid = self.grid().ok_or_else(out_of_bounds)?;
                let (lat, lng) = grid
                    .from_wgs84
                    .apply(lat, lng, WGS84, grid.projection.ellipsoid);
                let (x, y) = grid.projection.forward(lat, lng);
                if grid.in_extent(x, y) {
                    Ok((x, y))
                } else {
                    Err(out_of_bounds())
                }
            }
        }
    }

    fn grid(&self) -> Option<&'static NationalGrid> {
        match self {
            ReferenceSystem::BritishNationalGrid => Some(&BRITISH_NATIONAL_GRID),
            ReferenceSystem::IrishGrid => Some(&IRISH_GRID),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Ellipsoid {
    a: f64,
    b: f64,
}

impl Ellipsoid {
    fn e2(&self) -> f64 {
        (self.a * self.a - self.b * self.b) / (self.a * self.a)
    }
}

const WGS84: Ellipsoid = Ellipsoid {
    a: 6_378_137.0,
    b: 6_356_752.314_245,
};

const AIRY_1830: Ellipsoid = Ellipsoid {
    a: 6_377_563.396,
    b: 6_356_256.909,
};

const AIRY_MODIFIED: Ellipsoid = Ellipsoid {
    a: 6_377_340.189,
    b: 6_356_034.447,
};

/// Seven-parameter Helmert transform (position-vector convention).
#[derive(Debug, Clone, Copy)]
struct Helmert {
    /// Translations (metres).
    tx: f64,
    ty: f64,
    tz: f64,
    /// Scale (ppm).
    s: f64,
    /// Rotations (arc seconds).
    rx: f64,
    ry: f64,
    rz: f64,
}

impl Helmert {
    fn inverse(&self) -> Self {
        Self {
            tx: -self.tx,
            ty: -self.ty,
            tz: -self.tz,
            s: -self.s,
            rx: -self.rx,
            ry: -self.ry,
            rz: -self.rz,
        }
    }

    /// Transform geodetic `(lat, lng)` in degrees between ellipsoids.
    fn apply(&self, lat: f64, lng: f64, from: Ellipsoid, to: Ellipsoid) -> (f64, f64) {
        let (x1, y1, z1) = to_cartesian(lat.to_radians(), lng.to_radians(), from);

        let arcsec = |v: f64| (v / 3600.0).to_radians();
        let (rx, ry, rz) = (arcsec(self.rx), arcsec(self.ry), arcsec(self.rz));
        let s1 = 1.0 + self.s / 1e6;

        let x2 = self.tx + x1 * s1 - y1 * rz + z1 * ry;
        let y2 = self.ty + x1 * rz + y1 * s1 - z1 * rx;
        let z2 = self.tz - x1 * ry + y1 * rx + z1 * s1;

        let (lat, lng) = from_cartesian(x2, y2, z2, to);
        (lat.to_degrees(), lng.to_degrees())
    }
}

fn to_cartesian(phi: f64, lambda: f64, e: Ellipsoid) -> (f64, f64, f64) {
    let e2 = e.e2();
    let nu = e.a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
    (
        nu * phi.cos() * lambda.cos(),
        nu * phi.cos() * lambda.sin(),
        (1.0 - e2) * nu * phi.sin(),
    )
}

fn from_cartesian(x: f64, y: f64, z: f64, e: Ellipsoid) -> (f64, f64) {
    let e2 = e.e2();
    let p = (x * x + y * y).sqrt();
    let mut phi = z.atan2(p * (1.0 - e2));
    for _ in 0..10 {
        let nu = e.a / (1.0 - e2 * phi.sin().powi(2)).sqrt();
        let next = (z + e2 * nu * phi.sin()).atan2(p);
        if (next - phi).abs() < 1e-12 {
            phi = next;
            break;
        }
        phi = next;
    }
    (phi, y.atan2(x))
}

/// Transverse mercator projection parameters.
#[derive(Debug, Clone, Copy)]
struct TransverseMercator {
    ellipsoid: Ellipsoid,
    /// Scale factor on the central meridian.
    f0: f64,
    /// True origin (degrees).
    lat0: f64,
    lng0: f64,
    /// False origin (metres).
    e0: f64,
    n0: f64,
}

impl TransverseMercator {
    /// Meridional arc from the true origin to `phi`.
    fn meridional_arc(&self, phi: f64) -> f64 {
        let Ellipsoid { a, b } = self.ellipsoid;
        let n = (a - b) / (a + b);
        let (n2, n3) = (n * n, n * n * n);
        let phi0 = self.lat0.to_radians();
        let (dp, sp) = (phi - phi0, phi + phi0);

        b * self.f0
            * ((1.0 + n + 1.25 * n2 + 1.25 * n3) * dp
                - (3.0 * n + 3.0 * n2 + 2.625 * n3) * dp.sin() * sp.cos()
                + (1.875 * n2 + 1.875 * n3) * (2.0 * dp).sin() * (2.0 * sp).cos()
                - (35.0 / 24.0) * n3 * (3.0 * dp).sin() * (3.0 * sp).cos())
    }

    /// Radii of curvature (nu, rho, eta2) at `phi`.
    fn curvature(&self, phi: f64) -> (f64, f64, f64) {
        let Ellipsoid { a, .. } = self.ellipsoid;
        let e2 = self.ellipsoid.e2();
        let s2 = 1.0 - e2 * phi.sin().powi(2);
        let nu = a * self.f0 / s2.sqrt();
        let rho = a * self.f0 * (1.0 - e2) / s2.powf(1.5);
        (nu, rho, nu / rho - 1.0)
    }

    /// Geodetic degrees to (easting, northing).
    fn forward(&self, lat: f64, lng: f64) -> (f64, f64) {
        let phi = lat.to_radians();
        let (nu, rho, eta2) = self.curvature(phi);
        let m = self.meridional_arc(phi);

        let (sin, cos, tan) = (phi.sin(), phi.cos(), phi.tan());
        let tan2 = tan * tan;
        let tan4 = tan2 * tan2;

        let i = m + self.n0;
        let ii = nu / 2.0 * sin * cos;
        let iii = nu / 24.0 * sin * cos.powi(3) * (5.0 - tan2 + 9.0 * eta2);
        let iiia = nu / 720.0 * sin * cos.powi(5) * (61.0 - 58.0 * tan2 + tan4);
        let iv = nu * cos;
        let v = nu / 6.0 * cos.powi(3) * (nu / rho - tan2);
        let vi = nu / 120.0
            * cos.powi(5)
            * (5.0 - 18.0 * tan2 + tan4 + 14.0 * eta2 - 58.0 * tan2 * eta2);

        let dl = (lng - self.lng0).to_radians();
        let northing = i + ii * dl.powi(2) + iii * dl.powi(4) + iiia * dl.powi(6);
        let easting = self.e0 + iv * dl + v * dl.powi(3) + vi * dl.powi(5);
        (easting, northing)
    }

    /// (easting, northing) to geodetic degrees `(lat, lng)`.
    fn inverse(&self, easting: f64, northing: f64) -> Option<(f64, f64)> {
        let a = self.ellipsoid.a;
        let mut phi = (northing - self.n0) / (a * self.f0) + self.lat0.to_radians();
        let mut m = self.meridional_arc(phi);
        let mut converged = false;
        for _ in 0..100 {
            let residual = northing - self.n0 - m;
            if residual.abs() < 1e-5 {
                converged = true;
                break;
            }
            phi += residual / (a * self.f0);
            m = self.meridional_arc(phi);
        }
        if !converged {
            return None;
        }

        let (nu, rho, eta2) = self.curvature(phi);
        let (tan, sec) = (phi.tan(), 1.0 / phi.cos());
        let tan2 = tan * tan;
        let tan4 = tan2 * tan2;
        let tan6 = tan4 * tan2;

        let vii = tan / (2.0 * rho * nu);
        let viii = tan / (24.0 * rho * nu.powi(3)) * (5.0 + 3.0 * tan2 + eta2 - 9.0 * tan2 * eta2);
        let ix = tan / (720.0 * rho * nu.powi(5)) * (61.0 + 90.0 * tan2 + 45.0 * tan4);
        let x = sec / nu;
        let xi = sec / (6.0 * nu.powi(3)) * (nu / rho + 2.0 * tan2);
        let xii = sec / (120.0 * nu.powi(5)) * (5.0 + 28.0 * tan2 + 24.0 * tan4);
        let xiia = sec / (5040.0 * nu.powi(7)) * (61.0 + 662.0 * tan2 + 1320.0 * tan4 + 720.0 * tan6);

        let de = easting - self.e0;
        let lat = phi - vii * de.powi(2) + viii * de.powi(4) - ix * de.powi(6);
        let lng = self.lng0.to_radians() + x * de - xi * de.powi(3) + xii * de.powi(5)
            - xiia * de.powi(7);
        Some((lat.to_degrees(), lng.to_degrees()))
    }
}

/// A national grid: projection, datum shift from WGS84 and area of use.
struct NationalGrid {
    projection: TransverseMercator,
    from_wgs84: Helmert,
    /// Valid easting/northing range (metres).
    max_easting: f64,
    max_northing: f64,
}

impl NationalGrid {
    fn in_extent(&self, easting: f64, northing: f64) -> bool {
        (0.0..=self.max_easting).contains(&easting) && (0.0..=self.max_northing).contains(&northing)
    }
}

static BRITISH_NATIONAL_GRID: NationalGrid = NationalGrid {
    projection: TransverseMercator {
        ellipsoid: AIRY_1830,
        f0: 0.999_601_271_7,
        lat0: 49.0,
        lng0: -2.0,
        e0: 400_000.0,
        n0: -100_000.0,
    },
    from_wgs84: Helmert {
        tx: -446.448,
        ty: 125.157,
        tz: -542.060,
        s: 20.4894,
        rx: -0.1502,
        ry: -0.2470,
        rz: -0.8421,
    },
    max_easting: 700_000.0,
    max_northing: 1_300_000.0,
};

static IRISH_GRID: NationalGrid = NationalGrid {
    projection: TransverseMercator {
        ellipsoid: AIRY_MODIFIED,
        f0: 1.000_035,
        lat0: 53.5,
        lng0: -8.0,
        e0: 200_000.0,
        n0: 250_000.0,
    },
    from_wgs84: Helmert {
        tx: -482.530,
        ty: 130.596,
        tz: -564.557,
        s: -8.150,
        rx: 1.042,
        ry: 0.214,
        rz: 0.631,
    },
    max_easting: 500_000.0,
    max_northing: 500_000.0,
};
