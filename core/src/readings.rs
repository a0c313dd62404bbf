use log::info;

use crate::conditions::ConditionThresholds;
use crate::error::{OpsError, StoreError};
use crate::models::{BookingId, EnvironmentalReading, ReadingInput};
use crate::storage::BookingStore;

/// Wind and waves must be finite and non-negative; temperature only finite.
pub fn validate_reading(input: &ReadingInput) -> Result<(), OpsError> {
    if !input.temperature_c.is_finite() {
        return Err(OpsError::InvalidReading {
            field: "temperature_c",
            value: input.temperature_c,
        });
    }
    for (field, value) in [
        ("wind_speed_kmh", input.wind_speed_kmh),
        ("wave_height_m", input.wave_height_m),
    ] {
        if !value.is_finite() || value < 0.0 {
            return Err(OpsError::InvalidReading { field, value });
        }
    }
    Ok(())
}

/// Validate, classify and store the current reading for a booking. The flag
/// is computed here once and persisted as is.
pub fn submit_reading<S: BookingStore + ?Sized>(
    store: &mut S,
    booking_id: &BookingId,
    input: ReadingInput,
    thresholds: &ConditionThresholds,
    recorded_at_unix: i64,
) -> Result<EnvironmentalReading, OpsError> {
    validate_reading(&input)?;
    if store.load_booking(booking_id)?.is_none() {
        return Err(StoreError::BookingNotFound(booking_id.clone()).into());
    }

    let flag = thresholds.classify(input.wind_speed_kmh, input.wave_height_m);
    let reading = EnvironmentalReading {
        booking_id: booking_id.clone(),
        temperature_c: input.temperature_c,
        wind_speed_kmh: input.wind_speed_kmh,
        wave_height_m: input.wave_height_m,
        tide_status: input.tide_status,
        flag_status: flag.status,
        flag_reason: flag.reason,
        recorded_at_unix,
    };
    store.upsert_reading(reading.clone())?;

    info!(
        "booking {booking_id}: conditions flagged {} ({})",
        reading.flag_status.as_str(),
        reading.flag_reason
    );
    Ok(reading)
}
