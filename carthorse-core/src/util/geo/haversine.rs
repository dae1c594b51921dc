use geo::{Coord, LineString};

pub const APPROX_EARTH_RADIUS_M: f64 = 6_371_000.0;

/// get the distance between two coordinates in meters.
/// coordinates are assumed to be in the WGS84 coordinate system.
pub fn coord_distance_meters(src: Coord, dst: Coord) -> Result<f64, String> {
    haversine_distance_meters(src.x, src.y, dst.x, dst.y)
}

/// haversine distance formula, based on the one published to rosetta code.
/// https://rosettacode.org/wiki/Haversine_formula#Rust
/// computes the great circle distance between two points in meters.
/// assumes input data is in WGS84 projection (aka EPSG:4326 CRS)
pub fn haversine_distance_meters(
    src_x: f64,
    src_y: f64,
    dst_x: f64,
    dst_y: f64,
) -> Result<f64, String> {
    if !(-180.0..=180.0).contains(&src_x) {
        return Err(format!("src x value not in range [-180, 180]: {}", src_x));
    }
    if !(-180.0..=180.0).contains(&dst_x) {
        return Err(format!("dst x value not in range [-180, 180]: {}", dst_x));
    }
    if !(-90.0..=90.0).contains(&src_y) {
        return Err(format!("src y value not in range [-90, 90]: {}", src_y));
    }
    if !(-90.0..=90.0).contains(&dst_y) {
        return Err(format!("dst y value not in range [-90, 90]: {}", dst_y));
    }
    Ok(unchecked_haversine_distance_meters(
        src_x, src_y, dst_x, dst_y,
    ))
}

fn unchecked_haversine_distance_meters(src_x: f64, src_y: f64, dst_x: f64, dst_y: f64) -> f64 {
    let lat1 = src_y.to_radians();
    let lat2 = dst_y.to_radians();
    let d_lat = lat2 - lat1;
    let d_lon = (dst_x - src_x).to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + (d_lon / 2.0).sin().powi(2) * lat1.cos() * lat2.cos();
    let c = 2.0 * a.sqrt().asin();
    APPROX_EARTH_RADIUS_M * c
}

/// sums haversine segment lengths along a linestring and returns the total
/// in kilometers. coordinates are trusted to already be validated WGS84
/// values, since this runs on geometry the pipeline has already ingested.
pub fn linestring_length_km(line: &LineString<f64>) -> f64 {
    let meters: f64 = line
        .0
        .windows(2)
        .map(|pair| unchecked_haversine_distance_meters(pair[0].x, pair[0].y, pair[1].x, pair[1].y))
        .sum();
    meters / 1000.0
}
