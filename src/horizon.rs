//! Forecast-horizon classification.
//!
//! Every observation is tagged with an integer bucket id describing how far
//! ahead of the forecast run it applies. The ids are a backward-compatible
//! encoding shared with the scheduling database, so the constants here must
//! not change independently of it.

use chrono::NaiveDateTime;

/// The longest lead time, in hours, the forecast tables can represent.
pub const MAX_FORECAST_HOURS: i64 = 96;
/// Width of one forecast-horizon bucket, in hours.
pub const FORECAST_DELTA: i64 = 6;
/// Bucket id of the nearest-term horizon.
pub const SIX_DELTA_START: i32 = 9;
/// One past the largest valid bucket id.
pub const MAX_FORECAST_TYPE: i32 = SIX_DELTA_START + (MAX_FORECAST_HOURS / FORECAST_DELTA) as i32;

/// Translate a lead time in whole hours into a database-ready bucket id.
///
/// Bucket boundaries use floor semantics, so a lead time of exactly
/// `FORECAST_DELTA` hours lands in the second bucket. Lead times at or
/// beyond `MAX_FORECAST_HOURS` have no id and must not be persisted.
pub fn forecast_type_id(delta_hours: i64) -> Option<i32> {
    let id = (delta_hours / FORECAST_DELTA) as i32 + SIX_DELTA_START;

    if SIX_DELTA_START <= id && id < MAX_FORECAST_TYPE {
        Some(id)
    } else {
        None
    }
}

/// Classify an observation timestamp against the run's forecast time.
///
/// Timestamps earlier than the forecast time always classify as the
/// nearest-term bucket rather than being rejected. That rule is inherited
/// from the consuming database and is pending confirmation with the
/// schedulers, so do not change it here alone.
pub fn for_timestamp(obs: NaiveDateTime, forecast_time: NaiveDateTime) -> Option<i32> {
    if obs >= forecast_time {
        forecast_type_id((obs - forecast_time).num_hours())
    } else {
        Some(SIX_DELTA_START)
    }
}

/*--------------------------------------------------------------------------------------------------
                                          Unit Tests
--------------------------------------------------------------------------------------------------*/
#[cfg(test)]
mod unit {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_bucket_boundaries() {
        assert_eq!(forecast_type_id(0), Some(SIX_DELTA_START));
        assert_eq!(forecast_type_id(5), Some(SIX_DELTA_START));
        assert_eq!(forecast_type_id(6), Some(SIX_DELTA_START + 1));
        assert_eq!(forecast_type_id(11), Some(SIX_DELTA_START + 1));
        assert_eq!(forecast_type_id(95), Some(MAX_FORECAST_TYPE - 1));
    }

    #[test]
    fn test_out_of_range_lead_times_have_no_id() {
        assert_eq!(forecast_type_id(MAX_FORECAST_HOURS), None);
        assert_eq!(forecast_type_id(1000), None);
        assert_eq!(forecast_type_id(-6), None);
    }

    #[test]
    fn test_classification_against_forecast_time() {
        let ft = NaiveDate::from_ymd(2010, 6, 1).and_hms(12, 0, 0);

        let obs = NaiveDate::from_ymd(2010, 6, 1).and_hms(12, 0, 0);
        assert_eq!(for_timestamp(obs, ft), Some(SIX_DELTA_START));

        let obs = NaiveDate::from_ymd(2010, 6, 1).and_hms(18, 0, 0);
        assert_eq!(for_timestamp(obs, ft), Some(SIX_DELTA_START + 1));

        let obs = NaiveDate::from_ymd(2010, 6, 5).and_hms(12, 0, 0);
        assert_eq!(for_timestamp(obs, ft), None);

        // Observations before the forecast time classify as nearest-term.
        let obs = NaiveDate::from_ymd(2010, 5, 28).and_hms(0, 0, 0);
        assert_eq!(for_timestamp(obs, ft), Some(SIX_DELTA_START));
    }
}
