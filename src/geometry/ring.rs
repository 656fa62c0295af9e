//! Boundary ring construction from wire coordinates.

use geo::{Coord, LineString};
use geojson::Position;

use crate::error::{IngestError, IngestResult};

/// Minimum points of a closed ring (3 distinct vertices + closing vertex)
pub const MIN_RING_POINTS: usize = 4;

/// Convert a wire position (`[lon, lat, ...]`) into a coordinate.
///
/// Extra ordinates (altitude) are ignored.
pub fn position_to_coord(position: &Position) -> IngestResult<Coord<f64>> {
    match position.as_slice() {
        [lon, lat, ..] => Ok(Coord { x: *lon, y: *lat }),
        _ => Err(IngestError::MalformedFeature(format!(
            "position needs at least 2 values, found {}",
            position.len()
        ))),
    }
}

/// Round to `precision` decimals; `None` leaves the value as is.
pub fn round_to_precision(value: f64, precision: Option<u32>) -> f64 {
    match precision {
        Some(decimals) => {
            let factor = 10f64.powi(decimals as i32);
            (value * factor).round() / factor
        }
        None => value,
    }
}

/// Build a closed ring from raw positions.
///
/// Consecutive exact duplicates are dropped, the ring is closed by repeating
/// the first point when needed, and anything shorter than
/// [`MIN_RING_POINTS`] after closing is rejected. With `precision` set,
/// coordinates are rounded to that many decimals before comparison.
pub fn build_ring(positions: &[Position], precision: Option<u32>) -> IngestResult<LineString<f64>> {
    let mut coords: Vec<Coord<f64>> = Vec::with_capacity(positions.len() + 1);

    for position in positions {
        let coord = position_to_coord(position)?;
        let coord = Coord {
            x: round_to_precision(coord.x, precision),
            y: round_to_precision(coord.y, precision),
        };
        if coords.last() == Some(&coord) {
            continue;
        }
        coords.push(coord);
    }

    if let (Some(first), Some(last)) = (coords.first().copied(), coords.last().copied()) {
        if first != last {
            coords.push(first);
        }
    }

    if coords.len() < MIN_RING_POINTS {
        return Err(IngestError::RingTooShort {
            points: coords.len(),
        });
    }

    Ok(LineString::new(coords))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions(raw: &[[f64; 2]]) -> Vec<Position> {
        raw.iter().map(|p| p.to_vec()).collect()
    }

    #[test]
    fn test_open_ring_is_closed() {
        let ring = build_ring(&positions(&[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]), None).unwrap();
        assert_eq!(ring.0.len(), 4);
        assert_eq!(ring.0.first(), ring.0.last());
    }

    #[test]
    fn test_closed_ring_unchanged() {
        let raw = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0], [0.0, 0.0]];
        let ring = build_ring(&positions(&raw), None).unwrap();
        assert_eq!(ring.0.len(), 5);
    }

    #[test]
    fn test_consecutive_duplicates_dropped() {
        let raw = [
            [0.0, 0.0],
            [0.0, 0.0],
            [1.0, 0.0],
            [1.0, 0.0],
            [1.0, 1.0],
            [0.0, 0.0],
        ];
        let ring = build_ring(&positions(&raw), None).unwrap();
        assert_eq!(
            ring.0,
            vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
                Coord { x: 0.0, y: 0.0 },
            ]
        );
    }

    #[test]
    fn test_too_short_rejected() {
        // Two distinct points close to three
        let err = build_ring(&positions(&[[0.0, 0.0], [1.0, 0.0]]), None).unwrap_err();
        assert_eq!(err, IngestError::RingTooShort { points: 3 });

        // Duplicates collapse below the minimum
        let err = build_ring(
            &positions(&[[0.0, 0.0], [0.0, 0.0], [1.0, 1.0], [1.0, 1.0], [0.0, 0.0]]),
            None,
        )
        .unwrap_err();
        assert_eq!(err, IngestError::RingTooShort { points: 3 });

        let err = build_ring(&[], None).unwrap_err();
        assert_eq!(err, IngestError::RingTooShort { points: 0 });
    }

    #[test]
    fn test_single_point_ring_is_closed_then_rejected() {
        let err = build_ring(&positions(&[[5.0, 5.0]]), None).unwrap_err();
        assert_eq!(err, IngestError::RingTooShort { points: 1 });
    }

    #[test]
    fn test_precision_merges_near_duplicates() {
        let raw = [
            [0.0, 0.0],
            [1.0, 0.0],
            [1.000_000_01, 0.000_000_01],
            [1.0, 1.0],
        ];
        let ring = build_ring(&positions(&raw), Some(6)).unwrap();
        assert_eq!(ring.0.len(), 4);
    }

    #[test]
    fn test_short_position_is_malformed() {
        let raw = vec![vec![0.0, 0.0], vec![1.0], vec![1.0, 1.0]];
        assert!(matches!(
            build_ring(&raw, None),
            Err(IngestError::MalformedFeature(_))
        ));
    }
}
