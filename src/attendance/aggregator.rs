//! Worked-time aggregation over punch streams.
//!
//! Every function here is a pure function of the events it is handed (plus
//! `now` for live queries). Input slices are never reordered in place; the
//! functions sort a borrowed copy.

use std::collections::BTreeSet;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, TimeZone, Utc};

use crate::attendance::display::{format_location, format_time_of_day};
use crate::model::punch::{PunchEvent, PunchKind};
use crate::model::summary::{AttendanceStatus, AttendanceSummary, RecentActivity};

/// Number of punches listed in the recent activity feed
pub const RECENT_ACTIVITY_LIMIT: usize = 5;

/// A check-in paired with the check-out that closed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl WorkInterval {
    pub fn minutes(&self) -> f64 {
        (self.end - self.start).num_milliseconds() as f64 / 60_000.0
    }
}

/// Per-user punch state while scanning a chronological stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PunchState {
    #[default]
    CheckedOut,
    CheckedIn(DateTime<Utc>),
}

impl PunchState {
    /// Advances by one punch, yielding the interval the punch closes, if any.
    ///
    /// A check-in while already checked in re-opens at the newer time and the
    /// earlier open is discarded. A check-out while checked out is a no-op.
    pub fn apply(self, event: &PunchEvent) -> (PunchState, Option<WorkInterval>) {
        match (self, event.kind) {
            (_, PunchKind::CheckedIn) => (PunchState::CheckedIn(event.timestamp), None),
            (PunchState::CheckedIn(start), PunchKind::CheckedOut) => (
                PunchState::CheckedOut,
                Some(WorkInterval {
                    start,
                    end: event.timestamp,
                }),
            ),
            (PunchState::CheckedOut, PunchKind::CheckedOut) => (PunchState::CheckedOut, None),
        }
    }
}

/// Stable ascending sort; equal timestamps keep their input order.
fn chronological(events: &[PunchEvent]) -> Vec<&PunchEvent> {
    let mut sorted: Vec<&PunchEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.timestamp);
    sorted
}

/// Stable descending sort; equal timestamps keep their input order.
fn newest_first(events: &[PunchEvent]) -> Vec<&PunchEvent> {
    let mut sorted: Vec<&PunchEvent> = events.iter().collect();
    sorted.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    sorted
}

/// Pairs punches into closed intervals. The second value is the start of a
/// trailing check-in that nothing closed.
pub fn work_intervals(events: &[PunchEvent]) -> (Vec<WorkInterval>, Option<DateTime<Utc>>) {
    let mut state = PunchState::default();
    let mut intervals = Vec::new();

    for event in chronological(events) {
        let (next, closed) = state.apply(event);
        intervals.extend(closed);
        state = next;
    }

    let open = match state {
        PunchState::CheckedIn(start) => Some(start),
        PunchState::CheckedOut => None,
    };

    (intervals, open)
}

/// Total worked minutes over `events`.
///
/// A trailing open check-in is counted up to `as_of` when given and dropped
/// otherwise.
pub fn compute_worked_minutes(events: &[PunchEvent], as_of: Option<DateTime<Utc>>) -> f64 {
    let (intervals, open) = work_intervals(events);
    let mut total: f64 = intervals.iter().map(WorkInterval::minutes).sum();

    if let (Some(start), Some(end)) = (open, as_of) {
        total += WorkInterval { start, end }.minutes();
    }

    total
}

/// `"{hours}h {minutes}m"`, never rolling over into days.
pub fn format_duration(minutes: f64) -> String {
    let hours = (minutes / 60.0).floor() as i64;
    let remainder = (minutes % 60.0).floor() as i64;
    format!("{hours}h {remainder}m")
}

/// Midnight at the start of `date` in `tz`.
///
/// When midnight falls into a DST gap the date's earliest valid reading is
/// approximated by interpreting the wall clock as UTC.
pub fn local_midnight<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Tz> {
    let naive = date.and_time(NaiveTime::MIN);
    tz.from_local_datetime(&naive)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(&naive))
}

/// `[midnight, next midnight)` of the local calendar day containing `at`.
pub fn day_bounds<Tz: TimeZone>(at: &DateTime<Tz>) -> (DateTime<Utc>, DateTime<Utc>) {
    let tz = at.timezone();
    let date = at.date_naive();
    let next = date.checked_add_days(Days::new(1)).unwrap_or(date);

    (
        local_midnight(&tz, date).with_timezone(&Utc),
        local_midnight(&tz, next).with_timezone(&Utc),
    )
}

/// Events whose timestamp lies in `[start, end)`.
pub fn events_within(
    events: &[PunchEvent],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Vec<PunchEvent> {
    events
        .iter()
        .filter(|e| e.timestamp >= start && e.timestamp < end)
        .cloned()
        .collect()
}

/// Status readout of the newest punch plus today's live hours.
pub fn derive_current_status<Tz: TimeZone>(
    events: &[PunchEvent],
    now: &DateTime<Tz>,
) -> AttendanceStatus
where
    Tz::Offset: std::fmt::Display,
{
    let recent = newest_first(events);
    let Some(latest) = recent.first() else {
        return AttendanceStatus::default();
    };

    let tz = now.timezone();
    let (today_start, today_end) = day_bounds(now);
    let today = events_within(events, today_start, today_end);
    let today_minutes = compute_worked_minutes(&today, Some(now.with_timezone(&Utc)));

    let recent_activity = recent
        .iter()
        .take(RECENT_ACTIVITY_LIMIT)
        .map(|event| RecentActivity {
            kind: event.kind,
            title: event.kind.label().to_string(),
            time: format_time_of_day(&event.timestamp, &tz),
            location: format_location(event.location.address.as_ref()),
        })
        .collect();

    AttendanceStatus {
        status: latest.kind,
        last_punch: Some(format_time_of_day(&latest.timestamp, &tz)),
        location: Some(format_location(latest.location.address.as_ref())),
        today_hours: format_duration(today_minutes),
        recent_activity,
    }
}

/// `round(100 * present / expected)`, clamped to `0..=100`.
pub fn attendance_rate(days_present: u32, expected_working_days: u32) -> u32 {
    if expected_working_days == 0 {
        return 0;
    }
    let rate = (100.0 * f64::from(days_present) / f64::from(expected_working_days)).round();
    (rate as u32).min(100)
}

/// Totals for the half-open window `[period_start, period_end)`.
///
/// Live time of a trailing check-in is only counted while the window is still
/// running, i.e. when `period_end` lies after `now`.
pub fn compute_period_summary<Tz: TimeZone>(
    events: &[PunchEvent],
    period_start: &DateTime<Tz>,
    period_end: &DateTime<Tz>,
    expected_working_days: u32,
    now: &DateTime<Tz>,
) -> AttendanceSummary {
    let in_period = events_within(
        events,
        period_start.with_timezone(&Utc),
        period_end.with_timezone(&Utc),
    );

    let as_of = (period_end > now).then(|| now.with_timezone(&Utc));
    let total_minutes = compute_worked_minutes(&in_period, as_of);

    let tz = period_start.timezone();
    let present: BTreeSet<NaiveDate> = in_period
        .iter()
        .map(|e| e.timestamp.with_timezone(&tz).date_naive())
        .collect();
    let days_present = present.len() as u32;

    AttendanceSummary {
        total_minutes,
        total_hours: format_duration(total_minutes),
        days_present,
        expected_working_days,
        attendance_rate: attendance_rate(days_present, expected_working_days),
        record_count: in_period.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::punch::{Address, Coordinates, Location};
    use chrono::{Duration, FixedOffset};
    use proptest::prelude::*;

    fn at(day: u32, hour: u32, min: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, day, hour, min, 0).unwrap()
    }

    fn punch(kind: PunchKind, timestamp: DateTime<Utc>) -> PunchEvent {
        PunchEvent {
            id: format!("{kind}-{}", timestamp.timestamp()),
            kind,
            timestamp,
            location: Location {
                coords: Coordinates {
                    latitude: 25.0,
                    longitude: 55.0,
                },
                address: Some(Address {
                    name: Some("Terminal 1".to_string()),
                    street: None,
                    city: None,
                }),
            },
            user_id: 7,
        }
    }

    fn check_in(ts: DateTime<Utc>) -> PunchEvent {
        punch(PunchKind::CheckedIn, ts)
    }

    fn check_out(ts: DateTime<Utc>) -> PunchEvent {
        punch(PunchKind::CheckedOut, ts)
    }

    #[test]
    fn empty_stream_is_zero() {
        assert_eq!(compute_worked_minutes(&[], None), 0.0);
        assert_eq!(compute_worked_minutes(&[], Some(at(16, 9, 0))), 0.0);
    }

    #[test]
    fn single_pair_is_exact() {
        let events = [check_in(at(16, 9, 0)), check_out(at(16, 12, 30))];
        assert_eq!(compute_worked_minutes(&events, None), 210.0);
    }

    #[test]
    fn fractional_minutes_are_kept() {
        let start = at(16, 9, 0);
        let events = [check_in(start), check_out(start + Duration::seconds(90))];
        assert_eq!(compute_worked_minutes(&events, None), 1.5);
    }

    #[test]
    fn unsorted_input_is_paired_by_time() {
        let events = [
            check_out(at(16, 17, 0)),
            check_in(at(16, 13, 0)),
            check_out(at(16, 12, 0)),
            check_in(at(16, 9, 0)),
        ];
        assert_eq!(compute_worked_minutes(&events, None), 7.0 * 60.0);
    }

    #[test]
    fn second_check_in_overwrites_the_first() {
        let events = [
            check_in(at(16, 8, 0)),
            check_in(at(16, 9, 0)),
            check_out(at(16, 10, 0)),
        ];
        assert_eq!(compute_worked_minutes(&events, None), 60.0);
    }

    #[test]
    fn dangling_check_in_counts_only_with_as_of() {
        let start = at(16, 9, 0);
        let events = [check_in(start)];

        assert_eq!(
            compute_worked_minutes(&events, Some(start + Duration::minutes(90))),
            90.0
        );
        assert_eq!(compute_worked_minutes(&events, None), 0.0);
    }

    #[test]
    fn orphan_check_out_is_dropped() {
        assert_eq!(compute_worked_minutes(&[check_out(at(16, 9, 0))], None), 0.0);

        let events = [
            check_out(at(16, 8, 0)),
            check_in(at(16, 9, 0)),
            check_out(at(16, 10, 0)),
            check_out(at(16, 11, 0)),
        ];
        assert_eq!(compute_worked_minutes(&events, None), 60.0);
    }

    #[test]
    fn input_is_left_untouched() {
        let events = vec![check_out(at(16, 12, 0)), check_in(at(16, 9, 0))];
        let before = events.clone();

        compute_worked_minutes(&events, None);
        assert_eq!(events, before);
    }

    #[test]
    fn intervals_report_the_trailing_open() {
        let events = [
            check_in(at(16, 9, 0)),
            check_out(at(16, 12, 0)),
            check_in(at(16, 13, 0)),
        ];
        let (intervals, open) = work_intervals(&events);

        assert_eq!(
            intervals,
            vec![WorkInterval {
                start: at(16, 9, 0),
                end: at(16, 12, 0)
            }]
        );
        assert_eq!(open, Some(at(16, 13, 0)));
    }

    #[test]
    fn state_machine_transitions() {
        let open = PunchState::default().apply(&check_in(at(16, 9, 0)));
        assert_eq!(open, (PunchState::CheckedIn(at(16, 9, 0)), None));

        let reopened = open.0.apply(&check_in(at(16, 10, 0)));
        assert_eq!(reopened, (PunchState::CheckedIn(at(16, 10, 0)), None));

        let (closed, interval) = reopened.0.apply(&check_out(at(16, 11, 0)));
        assert_eq!(closed, PunchState::CheckedOut);
        assert_eq!(interval.map(|i| i.minutes()), Some(60.0));

        assert_eq!(
            PunchState::CheckedOut.apply(&check_out(at(16, 12, 0))),
            (PunchState::CheckedOut, None)
        );
    }

    #[test]
    fn duration_formatting() {
        assert_eq!(format_duration(125.0), "2h 5m");
        assert_eq!(format_duration(0.0), "0h 0m");
        assert_eq!(format_duration(1800.0), "30h 0m");
        assert_eq!(format_duration(59.99), "0h 59m");
    }

    #[test]
    fn empty_status_is_checked_out() {
        let status = derive_current_status(&[], &at(16, 12, 0));
        assert_eq!(status, AttendanceStatus::default());
        assert_eq!(status.today_hours, "0h 0m");
    }

    #[test]
    fn status_reads_the_latest_punch() {
        let events = [
            check_out(at(16, 12, 0)),
            check_in(at(16, 13, 0)),
            check_in(at(16, 9, 0)),
        ];
        let status = derive_current_status(&events, &at(16, 14, 30));

        assert_eq!(status.status, PunchKind::CheckedIn);
        assert_eq!(status.last_punch.as_deref(), Some("01:00 PM"));
        assert_eq!(status.location.as_deref(), Some("Terminal 1"));
        // 3h closed + 1h30m live
        assert_eq!(status.today_hours, "4h 30m");
    }

    #[test]
    fn status_ignores_yesterday_for_today_hours() {
        let events = [
            check_in(at(15, 9, 0)),
            check_out(at(15, 17, 0)),
            check_in(at(16, 9, 0)),
            check_out(at(16, 10, 15)),
        ];
        let status = derive_current_status(&events, &at(16, 18, 0));

        assert_eq!(status.status, PunchKind::CheckedOut);
        assert_eq!(status.today_hours, "1h 15m");
    }

    #[test]
    fn status_uses_the_callers_time_zone() {
        let dubai = FixedOffset::east_opt(4 * 3600).unwrap();
        // 21:00 UTC on the 15th is already the 16th in Dubai
        let events = [check_in(at(15, 21, 0)), check_out(at(15, 22, 0))];
        let now = at(16, 6, 0).with_timezone(&dubai);

        let status = derive_current_status(&events, &now);
        assert_eq!(status.last_punch.as_deref(), Some("02:00 AM"));
        assert_eq!(status.today_hours, "1h 0m");
    }

    #[test]
    fn recent_activity_is_capped_and_newest_first() {
        let events: Vec<PunchEvent> = (0..8)
            .map(|i| {
                let kind = if i % 2 == 0 {
                    PunchKind::CheckedIn
                } else {
                    PunchKind::CheckedOut
                };
                punch(kind, at(16, 8 + i, 0))
            })
            .collect();

        let status = derive_current_status(&events, &at(16, 20, 0));
        let times: Vec<&str> = status
            .recent_activity
            .iter()
            .map(|a| a.time.as_str())
            .collect();

        assert_eq!(status.recent_activity.len(), RECENT_ACTIVITY_LIMIT);
        assert_eq!(times, ["03:00 PM", "02:00 PM", "01:00 PM", "12:00 PM", "11:00 AM"]);
        assert_eq!(status.recent_activity[0].title, "Checked Out");
        assert_eq!(status.recent_activity[1].title, "Checked In");
    }

    #[test]
    fn week_summary_scenario() {
        // Sunday 11th to Sunday 18th October 2026
        let start = at(11, 0, 0);
        let end = at(18, 0, 0);
        let events = [
            check_in(at(12, 9, 0)),
            check_out(at(12, 17, 30)),
            check_in(at(13, 9, 0)),
            check_out(at(13, 17, 30)),
        ];

        let summary = compute_period_summary(&events, &start, &end, 5, &at(20, 0, 0));

        assert_eq!(summary.total_minutes, 1020.0);
        assert_eq!(summary.total_hours, "17h 0m");
        assert_eq!(summary.days_present, 2);
        assert_eq!(summary.attendance_rate, 40);
        assert_eq!(summary.record_count, 4);
        assert_eq!(summary.present_days(), "2/5");
    }

    #[test]
    fn running_period_counts_live_time() {
        let start = at(16, 0, 0);
        let end = at(17, 0, 0);
        let events = [check_in(at(16, 9, 0))];

        let live = compute_period_summary(&events, &start, &end, 1, &at(16, 10, 0));
        assert_eq!(live.total_minutes, 60.0);

        let closed = compute_period_summary(&events, &start, &end, 1, &at(18, 10, 0));
        assert_eq!(closed.total_minutes, 0.0);
        assert_eq!(closed.days_present, 1);
        assert_eq!(closed.attendance_rate, 100);
    }

    #[test]
    fn period_excludes_events_at_or_after_its_end() {
        let start = at(16, 0, 0);
        let end = at(17, 0, 0);
        let events = [
            check_in(at(15, 23, 0)),
            check_out(at(16, 1, 0)),
            check_in(at(17, 0, 0)),
        ];

        let summary = compute_period_summary(&events, &start, &end, 1, &at(20, 0, 0));
        assert_eq!(summary.record_count, 1);
        assert_eq!(summary.total_minutes, 0.0);
        assert_eq!(summary.days_present, 1);
    }

    #[test]
    fn attendance_rate_rounds_and_clamps() {
        assert_eq!(attendance_rate(2, 5), 40);
        assert_eq!(attendance_rate(1, 3), 33);
        assert_eq!(attendance_rate(2, 3), 67);
        assert_eq!(attendance_rate(6, 5), 100);
        assert_eq!(attendance_rate(3, 0), 0);
    }

    #[test]
    fn day_bounds_follow_local_midnight() {
        let dubai = FixedOffset::east_opt(4 * 3600).unwrap();
        let now = at(16, 6, 0).with_timezone(&dubai);

        let (start, end) = day_bounds(&now);
        assert_eq!(start, at(15, 20, 0));
        assert_eq!(end, at(16, 20, 0));
    }

    fn arb_events() -> impl Strategy<Value = Vec<PunchEvent>> {
        prop::collection::vec((any::<bool>(), 0i64..10_000), 0..24).prop_map(|raw| {
            let base = at(1, 0, 0);
            raw.into_iter()
                .map(|(is_in, offset)| {
                    let kind = if is_in {
                        PunchKind::CheckedIn
                    } else {
                        PunchKind::CheckedOut
                    };
                    punch(kind, base + Duration::minutes(offset))
                })
                .collect()
        })
    }

    /// Events with distinct timestamps, so every permutation pairs
    /// identically, alongside a shuffled copy.
    fn arb_permuted_events() -> impl Strategy<Value = (Vec<PunchEvent>, Vec<PunchEvent>)> {
        arb_events()
            .prop_map(|mut events| {
                events.sort_by_key(|e| e.timestamp);
                events.dedup_by_key(|e| e.timestamp);
                events
            })
            .prop_flat_map(|events| (Just(events.clone()), Just(events).prop_shuffle()))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_order_independent((events, shuffled) in arb_permuted_events()) {
            prop_assert_eq!(
                compute_worked_minutes(&events, None),
                compute_worked_minutes(&shuffled, None)
            );
        }

        #[test]
        fn prop_total_is_never_negative(events in arb_events(), extra in 0i64..600) {
            let as_of = at(1, 0, 0) + Duration::minutes(10_000 + extra);
            prop_assert!(compute_worked_minutes(&events, None) >= 0.0);
            prop_assert!(compute_worked_minutes(&events, Some(as_of)) >= 0.0);
        }

        #[test]
        fn prop_duration_format_recombines(minutes in 0u32..100_000) {
            let text = format_duration(f64::from(minutes));
            let (hours, rest) = text.split_once("h ").unwrap();
            let mins = rest.strip_suffix('m').unwrap();

            let hours: u32 = hours.parse().unwrap();
            let mins: u32 = mins.parse().unwrap();
            prop_assert!(mins < 60);
            prop_assert_eq!(hours * 60 + mins, minutes);
        }
    }
}
