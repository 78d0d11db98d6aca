//! Billable and total seconds sent to upload targets.

use std::time::Duration;

/// Seconds transmitted to a target for one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransmittedSeconds {
	pub billable: u64,
	pub time_spent: u64,
}

/// Compute the seconds to transmit for the given raw durations.
///
/// Treating the duration as billed folds the unbillable part into the
/// billable part first. Rounding is applied afterwards, to both parts
/// independently, and the total is recomputed from the rounded parts.
pub fn transmitted_seconds(
	billable: Duration,
	unbillable: Duration,
	treat_duration_as_billed: bool,
	round_to_closest_minute: bool,
) -> TransmittedSeconds {
	let (mut billable, mut unbillable) = (billable, unbillable);

	if treat_duration_as_billed {
		billable += unbillable;
		unbillable = Duration::ZERO;
	}

	if round_to_closest_minute {
		billable = round_to_minute(billable);
		unbillable = round_to_minute(unbillable);
	}

	TransmittedSeconds {
		billable: whole_seconds(billable),
		time_spent: whole_seconds(billable + unbillable),
	}
}

/// Round to the closest whole minute, halves rounding up.
pub fn round_to_minute(duration: Duration) -> Duration {
	let minutes = (duration.as_secs_f64() / 60.0).round();
	Duration::from_secs(minutes as u64 * 60)
}

fn whole_seconds(duration: Duration) -> u64 {
	duration.as_secs_f64().round() as u64
}
