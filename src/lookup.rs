//! Reading a table back the way the firmware does: pick the sample at or
//! before the requested timestamp and interpolate linearly towards the next
//! one. Results are in 10x the stored unit.

use crate::table::EphemerisTable;

/// One full turn in centidegrees
const FULL_TURN: i32 = 36000;
const HALF_TURN: i32 = FULL_TURN / 2;

/// Fold a centidegree angle into [0, 36000)
fn modulo_full(angle: i32) -> i32 {
    angle.rem_euclid(FULL_TURN)
}

/// Fold a centidegree angle into [-18000, 18000)
fn modulo_half_half(angle: i32) -> i32 {
    (angle + HALF_TURN).rem_euclid(FULL_TURN) - HALF_TURN
}

/// Interpolated value at `unix` from a sample array of `table`.
///
/// Returned value is 10x the stored unit. The step between two samples is
/// taken along the shortest arc, which is what makes the 359.9° -> 0° wrap
/// interpolate through 0 rather than backwards through 180°.
fn approx_angle_at<T: Into<i32> + Copy>(
    table: &EphemerisTable,
    samples: &[T],
    unix: i64,
) -> Option<i32> {
    let start = i64::try_from(table.start()).ok()?;
    let period = i64::from(table.period());

    let offset_s = unix.checked_sub(start)?;
    if offset_s < 0 {
        return None;
    }

    let index = usize::try_from(offset_s.div_euclid(period)).ok()?;
    let previous = 10 * (*samples.get(index)?).into();

    let elapsed_s = offset_s.rem_euclid(period);
    if elapsed_s == 0 {
        return Some(previous);
    }

    let next = 10 * (*samples.get(index + 1)?).into();
    let delta = i64::from(modulo_half_half(next - previous));

    // elapsed_s < period, so the offset stays within one delta
    let offset = i32::try_from(elapsed_s * delta / period).ok()?;
    Some(previous + offset)
}

/// Shadow angle at `unix` in centidegrees, [0, 36000).
///
/// `None` before the first sample or after the last one.
pub fn shadow_angle_at(table: &EphemerisTable, unix: i64) -> Option<u32> {
    approx_angle_at(table, table.shadow(), unix).map(|angle| modulo_full(angle) as u32)
}

/// Moon elevation at `unix` in decidegrees.
///
/// `None` outside the table or when the table carries no elevation.
pub fn elevation_at(table: &EphemerisTable, unix: i64) -> Option<i32> {
    approx_angle_at(table, table.elevation()?, unix)
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: i64 = 1_234_567;

    fn quarters() -> EphemerisTable {
        EphemerisTable::new(
            T0 as u64,
            3600,
            vec![0, 900, 1800, 2700, 0],
            Some(vec![0, 9, 0, -9, 0]),
        )
        .unwrap()
    }

    fn shadow_only(shadow: Vec<u16>) -> EphemerisTable {
        EphemerisTable::new(T0 as u64, 3600, shadow, None).unwrap()
    }

    #[test]
    fn test_modulo() {
        assert_eq!(modulo_full(-18000), 18000);
        assert_eq!(modulo_full(-9000), 27000);
        assert_eq!(modulo_full(0), 0);
        assert_eq!(modulo_full(36000), 0);
        assert_eq!(modulo_full(-19000), 17000);

        assert_eq!(modulo_half_half(-18000), -18000);
        assert_eq!(modulo_half_half(9000), 9000);
        assert_eq!(modulo_half_half(18000), -18000);
        assert_eq!(modulo_half_half(36000), 0);
        assert_eq!(modulo_half_half(19000), -17000);
        assert_eq!(modulo_half_half(-19000), 17000);
    }

    #[test]
    fn test_shadow_exact_samples() {
        let table = quarters();
        assert_eq!(shadow_angle_at(&table, T0), Some(0));
        assert_eq!(shadow_angle_at(&table, T0 + 3600), Some(9000));
        assert_eq!(shadow_angle_at(&table, T0 + 2 * 3600), Some(18000));
        assert_eq!(shadow_angle_at(&table, T0 + 3 * 3600), Some(27000));
        assert_eq!(shadow_angle_at(&table, T0 + 4 * 3600), Some(0));
    }

    #[test]
    fn test_shadow_midpoints() {
        let table = quarters();
        assert_eq!(shadow_angle_at(&table, T0 + 1800), Some(4500));
        assert_eq!(shadow_angle_at(&table, T0 + 3 * 1800), Some(13500));
        assert_eq!(shadow_angle_at(&table, T0 + 5 * 1800), Some(22500));
        assert_eq!(shadow_angle_at(&table, T0 + 7 * 1800), Some(31500));
    }

    #[test]
    fn test_elevation_values() {
        let table = quarters();
        assert_eq!(elevation_at(&table, T0 + 3600), Some(90));
        assert_eq!(elevation_at(&table, T0 + 3 * 3600), Some(-90));
        assert_eq!(elevation_at(&table, T0 + 1800), Some(45));
        assert_eq!(elevation_at(&table, T0 + 5 * 1800), Some(-45));
    }

    #[test]
    fn test_forward_crossover() {
        let table = shadow_only(vec![3500, 100]);
        assert_eq!(shadow_angle_at(&table, T0), Some(35000));
        assert_eq!(shadow_angle_at(&table, T0 + 15 * 60), Some(35500));
        assert_eq!(shadow_angle_at(&table, T0 + 30 * 60), Some(0));
        assert_eq!(shadow_angle_at(&table, T0 + 45 * 60), Some(500));
        assert_eq!(shadow_angle_at(&table, T0 + 60 * 60), Some(1000));
    }

    #[test]
    fn test_backward_crossover() {
        let table = shadow_only(vec![100, 3500]);
        assert_eq!(shadow_angle_at(&table, T0), Some(1000));
        assert_eq!(shadow_angle_at(&table, T0 + 15 * 60), Some(500));
        assert_eq!(shadow_angle_at(&table, T0 + 30 * 60), Some(0));
        assert_eq!(shadow_angle_at(&table, T0 + 45 * 60), Some(35500));
        assert_eq!(shadow_angle_at(&table, T0 + 60 * 60), Some(35000));
    }

    #[test]
    fn test_outside_table() {
        let table = quarters();
        assert_eq!(shadow_angle_at(&table, T0 - 1), None);
        assert_eq!(shadow_angle_at(&table, T0 + 4 * 3600 + 1), None);
        assert_eq!(elevation_at(&table, T0 + 5 * 3600), None);
        assert_eq!(shadow_angle_at(&table, i64::MIN), None);
    }

    #[test]
    fn test_elevation_missing() {
        let table = shadow_only(vec![0, 10]);
        assert_eq!(elevation_at(&table, T0), None);
        assert_eq!(shadow_angle_at(&table, T0), Some(0));
    }
}
