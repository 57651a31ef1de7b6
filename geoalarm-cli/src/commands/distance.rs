//! Distance command - great-circle distance between two points.

use geoalarm::coord::{distance_km, format_distance, Coordinate};

use crate::error::CliError;

/// Print the distance between `from` and `to`.
pub fn run(from: Coordinate, to: Coordinate, raw: bool) -> Result<(), CliError> {
    let km = distance_km(from, to);
    if raw {
        println!("{}", km);
    } else {
        println!("{}", format_distance(km));
    }
    Ok(())
}
