use crate::grade::Grade;

/// Highest score a single prediction can earn.
pub const MAX_POINTS: u8 = 5;

/// Points for a prediction that missed the actual grade by `distance` hundredths.
pub fn points_for_distance(distance: u16) -> u8 {
    match distance {
        0 => 5,
        1..=25 => 4,
        26..=50 => 3,
        51..=75 => 2,
        76..=100 => 1,
        _ => 0,
    }
}

/// Scores a prediction against the actual grade.
///
/// `None` means nothing was scored (no prediction or no actual grade) and
/// is not the same as a zero-point miss.
pub fn points(prediction: Option<Grade>, actual: Option<Grade>) -> Option<u8> {
    let (prediction, actual) = (prediction?, actual?);
    Some(points_for_distance(prediction.distance(actual)))
}
