//! Good marker (G)
//!
//! Runs after every other detector: any record whose flag set is still empty
//! is explicitly marked good, so an empty set never leaves the engine.
//! Idempotent by construction.

use crate::types::{Flag, QcSeries};

pub fn flag_good(series: &mut QcSeries) {
    for q in &mut series.qflag {
        if q.is_empty() {
            q.insert(Flag::G);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FlagSet, Variable};
    use chrono::{Duration, TimeZone, Utc};

    #[test]
    fn test_good_marks_only_untouched_records() {
        let start = Utc.with_ymd_and_hms(2020, 1, 27, 0, 0, 0).unwrap();
        let timestamps = (0..3).map(|i| start + Duration::hours(i)).collect();
        let mut series = QcSeries::new(Variable::SoilMoisture, timestamps, vec![1.0, 2.0, 3.0]);
        series.qflag[1].insert(Flag::C02);
        flag_good(&mut series);
        assert_eq!(series.qflag[0], [Flag::G].into_iter().collect::<FlagSet>());
        assert_eq!(series.qflag[1], [Flag::C02].into_iter().collect::<FlagSet>());
        assert!(series.qflag[2].contains(Flag::G));
        // a second pass changes nothing
        let before = series.qflag.clone();
        flag_good(&mut series);
        assert_eq!(series.qflag, before);
    }
}
