//! Calendar heat-map layout.
//!
//! Lays out a trailing window of weeks as a 7-row grid (Sunday first), looks
//! up one event per day, and places month labels above the first column that
//! touches each month. Every value here is recomputed from
//! `(events, week_count, today)`; nothing is cached or mutated in place.

use std::collections::HashSet;

use chrono::{Datelike, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{
  event::{DatedEvent, DuplicatePolicy, index_by_date},
  layout::MAX_WEEKS,
};

pub const DAYS_PER_WEEK: usize = 7;

const MONTH_NAMES: [&str; 12] = [
  "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov",
  "Dec",
];

/// Row labels for the day axis; only alternate rows are labelled.
pub const WEEKDAY_LABELS: [&str; DAYS_PER_WEEK] =
  ["", "Mon", "", "Wed", "", "Fri", ""];

// ─── Window anchor ───────────────────────────────────────────────────────────

/// Which week the last column of the grid represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAnchor {
  /// The last column is the week containing `today`; later days in that week
  /// are marked as future.
  #[default]
  CurrentWeek,
  /// The last column is the full week before the one containing `today`.
  PreviousWeek,
}

// ─── Output types ────────────────────────────────────────────────────────────

/// Visual weight of a cell, a step function of intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IntensityLevel {
  Empty,
  Faint,
  Light,
  Medium,
  Strong,
}

impl IntensityLevel {
  pub fn from_intensity(intensity: f64) -> Self {
    if intensity.is_nan() || intensity <= 0.0 {
      Self::Empty
    } else if intensity <= 0.25 {
      Self::Faint
    } else if intensity <= 0.5 {
      Self::Light
    } else if intensity <= 0.75 {
      Self::Medium
    } else {
      Self::Strong
    }
  }
}

/// What a renderer should draw for a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "level", rename_all = "lowercase")]
pub enum CellVisual {
  /// Future cells are never drawn.
  Hidden,
  Shown(IntensityLevel),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayCell<P> {
  pub date:      NaiveDate,
  /// `0` when no event matched this date.
  pub intensity: f64,
  pub payload:   Option<P>,
  pub is_future: bool,
}

impl<P> DayCell<P> {
  pub fn visual(&self) -> CellVisual {
    if self.is_future {
      CellVisual::Hidden
    } else {
      CellVisual::Shown(IntensityLevel::from_intensity(self.intensity))
    }
  }

  /// Only past or present cells carrying a payload respond to click/hover.
  pub fn is_interactive(&self) -> bool {
    self.payload.is_some() && !self.is_future
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekColumn<P> {
  pub index: usize,
  /// Sunday through Saturday.
  pub days:  [DayCell<P>; DAYS_PER_WEEK],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthLabel {
  pub text:       String,
  pub year:       i32,
  /// 1-based month number.
  pub month:      u32,
  pub week_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Heatmap<P> {
  pub today:        NaiveDate,
  pub weeks:        Vec<WeekColumn<P>>,
  pub month_labels: Vec<MonthLabel>,
}

impl<P> Heatmap<P> {
  pub fn week_count(&self) -> usize { self.weeks.len() }

  pub fn cell(&self, week: usize, day: usize) -> Option<&DayCell<P>> {
    self.weeks.get(week).and_then(|w| w.days.get(day))
  }

  /// Invoke `on_click` with the payload of an interactive cell.
  pub fn click<R>(
    &self,
    week: usize,
    day: usize,
    on_click: impl FnOnce(&P) -> R,
  ) -> Option<R> {
    let cell = self.cell(week, day).filter(|c| c.is_interactive())?;
    cell.payload.as_ref().map(on_click)
  }

  /// Invoke `format` with `(payload, date)` of an interactive cell.
  pub fn tooltip<T>(
    &self,
    week: usize,
    day: usize,
    format: impl FnOnce(&P, NaiveDate) -> T,
  ) -> Option<T> {
    let cell = self.cell(week, day).filter(|c| c.is_interactive())?;
    cell.payload.as_ref().map(|p| format(p, cell.date))
  }

  /// Iterate every cell in column-major order with its `(week, day)` position.
  pub fn cells(&self) -> impl Iterator<Item = (usize, usize, &DayCell<P>)> {
    self.weeks.iter().flat_map(|w| {
      w.days.iter().enumerate().map(move |(d, cell)| (w.index, d, cell))
    })
  }
}

// ─── Construction ────────────────────────────────────────────────────────────

/// The current calendar date. Adapters bucket by UTC date, so this does too.
pub fn today() -> NaiveDate { Utc::now().date_naive() }

/// Lay out `events` over `week_count` weeks ending with the week containing
/// `today`, resolving same-day events with [`DuplicatePolicy::KeepHighest`].
pub fn compute_heatmap<P: Clone>(
  events: &[DatedEvent<P>],
  week_count: usize,
  today: NaiveDate,
) -> Heatmap<P> {
  compute_heatmap_with(
    events,
    week_count,
    today,
    WindowAnchor::default(),
    DuplicatePolicy::default(),
  )
}

/// [`compute_heatmap`] with an explicit window anchor and duplicate policy.
///
/// `week_count` is clamped to `1..=52`.
pub fn compute_heatmap_with<P: Clone>(
  events: &[DatedEvent<P>],
  week_count: usize,
  today: NaiveDate,
  anchor: WindowAnchor,
  policy: DuplicatePolicy,
) -> Heatmap<P> {
  let week_count = week_count.clamp(1, MAX_WEEKS);
  let by_date = index_by_date(events, policy);
  let start = window_start(today, week_count, anchor);

  let mut seen_months: HashSet<(i32, u32)> = HashSet::new();
  let mut month_labels = Vec::new();
  let mut weeks = Vec::with_capacity(week_count);

  for week_index in 0..week_count {
    let days: [DayCell<P>; DAYS_PER_WEEK] = std::array::from_fn(|day_index| {
      let date = shift(start, (week_index * DAYS_PER_WEEK + day_index) as i64);
      let event = by_date.get(&date);
      DayCell {
        date,
        intensity: event.map_or(0.0, |e| e.intensity),
        payload: event.map(|e| e.payload.clone()),
        is_future: date > today,
      }
    });

    for cell in &days {
      let key = month_key(cell.date);
      let prev_key = month_key(shift(cell.date, -(DAYS_PER_WEEK as i64)));
      if key != prev_key && !cell.is_future && seen_months.insert(key) {
        month_labels.push(MonthLabel {
          text: MONTH_NAMES[cell.date.month0() as usize].to_string(),
          year: key.0,
          month: key.1,
          week_index,
        });
      }
    }

    weeks.push(WeekColumn { index: week_index, days });
  }

  Heatmap { today, weeks, month_labels }
}

/// The Sunday that opens the first visible week.
fn window_start(
  today: NaiveDate,
  week_count: usize,
  anchor: WindowAnchor,
) -> NaiveDate {
  let weekday = i64::from(today.weekday().num_days_from_sunday());
  let full_weeks = match anchor {
    WindowAnchor::CurrentWeek => week_count as i64 - 1,
    WindowAnchor::PreviousWeek => week_count as i64,
  };
  shift(today, -(full_weeks * DAYS_PER_WEEK as i64 + weekday))
}

/// Add (or subtract) whole days, saturating at the calendar bounds.
fn shift(date: NaiveDate, days: i64) -> NaiveDate {
  let magnitude = Days::new(days.unsigned_abs());
  if days >= 0 {
    date.checked_add_days(magnitude).unwrap_or(NaiveDate::MAX)
  } else {
    date.checked_sub_days(magnitude).unwrap_or(NaiveDate::MIN)
  }
}

fn month_key(date: NaiveDate) -> (i32, u32) { (date.year(), date.month()) }

#[cfg(test)]
mod tests {
  use chrono::Weekday;

  use super::*;

  fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
  }

  fn sample_events() -> Vec<DatedEvent<u32>> {
    vec![
      DatedEvent::new(ymd(2024, 5, 1), 0.2, 2),
      DatedEvent::new(ymd(2024, 5, 20), 0.7, 7),
      DatedEvent::new(ymd(2024, 6, 3), 1.0, 12),
    ]
  }

  // ── Shape ───────────────────────────────────────────────────────────────────

  #[test]
  fn output_is_deterministic() {
    let events = sample_events();
    let today = ymd(2024, 6, 12);
    assert_eq!(
      compute_heatmap(&events, 26, today),
      compute_heatmap(&events, 26, today)
    );
  }

  #[test]
  fn grid_has_exactly_week_count_columns_of_seven() {
    let today = ymd(2024, 6, 12);
    for weeks in [1, 12, 26, 39, 52] {
      let map = compute_heatmap(&sample_events(), weeks, today);
      assert_eq!(map.weeks.len(), weeks);
      for (i, column) in map.weeks.iter().enumerate() {
        assert_eq!(column.index, i);
        assert_eq!(column.days.len(), 7);
        assert_eq!(column.days[0].date.weekday(), Weekday::Sun);
        assert_eq!(column.days[6].date.weekday(), Weekday::Sat);
      }
    }
  }

  #[test]
  fn week_count_is_clamped() {
    let today = ymd(2024, 6, 12);
    assert_eq!(compute_heatmap::<u32>(&[], 0, today).week_count(), 1);
    assert_eq!(compute_heatmap::<u32>(&[], 500, today).week_count(), 52);
  }

  #[test]
  fn days_are_contiguous() {
    let map = compute_heatmap::<u32>(&[], 12, ymd(2024, 2, 29));
    let dates: Vec<_> = map.cells().map(|(_, _, c)| c.date).collect();
    for pair in dates.windows(2) {
      assert_eq!(pair[1], pair[0].succ_opt().unwrap());
    }
  }

  // ── Anchoring ───────────────────────────────────────────────────────────────

  #[test]
  fn current_week_anchor_ends_on_todays_week() {
    let today = ymd(2024, 1, 10); // Wednesday
    let map = compute_heatmap::<u32>(&[], 4, today);
    let last = &map.weeks[3];
    assert_eq!(last.days[0].date, ymd(2024, 1, 7));
    assert_eq!(last.days[3].date, today);
    assert!(!last.days[3].is_future);
    assert!(last.days[4].is_future);
    assert_eq!(map.weeks[0].days[0].date, ymd(2023, 12, 17));
  }

  #[test]
  fn previous_week_anchor_has_no_future_cells() {
    let today = ymd(2024, 1, 10);
    let map = compute_heatmap_with::<u32>(
      &[],
      4,
      today,
      WindowAnchor::PreviousWeek,
      DuplicatePolicy::KeepLast,
    );
    assert_eq!(map.weeks[0].days[0].date, ymd(2023, 12, 10));
    assert_eq!(map.weeks[3].days[6].date, ymd(2024, 1, 6));
    assert!(map.cells().all(|(_, _, c)| !c.is_future));
  }

  #[test]
  fn sunday_today_is_first_cell_of_last_column() {
    let today = ymd(2024, 3, 3);
    let map = compute_heatmap::<u32>(&[], 2, today);
    assert_eq!(map.weeks[1].days[0].date, today);
    assert!(map.weeks[1].days[1..].iter().all(|c| c.is_future));
  }

  // ── Future leakage ──────────────────────────────────────────────────────────

  #[test]
  fn future_cells_are_hidden_and_inert() {
    let today = ymd(2024, 1, 10);
    let events = vec![
      DatedEvent::new(ymd(2024, 1, 11), 0.5, 5u32),
      DatedEvent::new(ymd(2024, 1, 8), 0.3, 3u32),
    ];
    let map = compute_heatmap(&events, 12, today);
    for (week, day, cell) in map.cells() {
      if cell.date > today {
        assert!(cell.is_future);
        assert_eq!(cell.visual(), CellVisual::Hidden);
        assert!(!cell.is_interactive());
        assert!(map.click(week, day, |p| *p).is_none());
      }
    }
  }

  #[test]
  fn commit_week_feeds_the_grid_end_to_end() {
    use crate::github::{self, CommitWeek};

    let today = ymd(2024, 1, 10);
    let week = CommitWeek {
      week:  ymd(2024, 1, 7).and_hms_opt(0, 0, 0).unwrap().and_utc().timestamp(),
      days:  vec![0, 3, 0, 0, 5, 0, 0],
      total: 8,
    };
    let map = compute_heatmap(&github::to_events(&[week]), 12, today);

    let find = |date: NaiveDate| {
      map.cells().find(|(_, _, cell)| cell.date == date).expect("date is in the window")
    };

    let (w, d, monday) = find(ymd(2024, 1, 8));
    assert_eq!(monday.intensity, 0.3);
    assert!(!monday.is_future);
    assert_eq!(map.click(w, d, |p| p.commits), Some(3));

    let (w, d, thursday) = find(ymd(2024, 1, 11));
    assert!(thursday.is_future);
    assert_eq!(thursday.visual(), CellVisual::Hidden);
    assert!(map.click(w, d, |p| p.commits).is_none());
    assert!(map.tooltip(w, d, github::tooltip).is_none());
  }

  // ── Month labels ────────────────────────────────────────────────────────────

  #[test]
  fn month_labels_are_unique_and_point_at_the_first_of_month() {
    let today = ymd(2024, 6, 12);
    let map = compute_heatmap::<u32>(&[], 52, today);

    let mut keys = HashSet::new();
    for label in &map.month_labels {
      assert!(keys.insert((label.year, label.month)), "duplicate {label:?}");

      let first = ymd(label.year, label.month, 1);
      if let Some((week, _, _)) =
        map.cells().find(|(_, _, c)| c.date == first && !c.is_future)
      {
        assert_eq!(label.week_index, week, "{label:?}");
      }
    }

    let texts: Vec<_> = map.month_labels.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts.last(), Some(&"Jun"));
    assert!(texts.contains(&"Jan"));
  }

  #[test]
  fn month_starting_after_today_gets_no_label() {
    // 2024-07-01 is the Monday after this Sunday; it is in the grid but future.
    let today = ymd(2024, 6, 30);
    let map = compute_heatmap::<u32>(&[], 8, today);
    assert!(map.month_labels.iter().all(|l| l.month != 7));
  }

  #[test]
  fn window_starting_mid_month_skips_leading_label() {
    // First column opens on 2024-04-14; April is already under way.
    let today = ymd(2024, 6, 12);
    let map = compute_heatmap::<u32>(&[], 9, today);
    assert_eq!(map.weeks[0].days[0].date, ymd(2024, 4, 14));
    let texts: Vec<_> = map.month_labels.iter().map(|l| l.text.as_str()).collect();
    assert_eq!(texts, ["May", "Jun"]);
    assert_eq!(map.month_labels[0].week_index, 2);
  }

  // ── Cells ───────────────────────────────────────────────────────────────────

  #[test]
  fn empty_events_give_an_all_zero_grid() {
    let map = compute_heatmap::<u32>(&[], 12, ymd(2024, 9, 18));
    assert_eq!(map.weeks.len(), 12);
    assert!(map.cells().all(|(_, _, c)| c.intensity == 0.0 && c.payload.is_none()));
    assert_eq!(map.cells().count(), 84);
  }

  #[test]
  fn levels_follow_quartile_steps() {
    use IntensityLevel::*;
    let cases = [
      (0.0, Empty),
      (0.01, Faint),
      (0.25, Faint),
      (0.26, Light),
      (0.5, Light),
      (0.51, Medium),
      (0.75, Medium),
      (0.76, Strong),
      (1.0, Strong),
      (f64::NAN, Empty),
    ];
    for (intensity, level) in cases {
      assert_eq!(IntensityLevel::from_intensity(intensity), level, "{intensity}");
    }
  }

  #[test]
  fn click_and_tooltip_reach_payloads() {
    let today = ymd(2024, 6, 12);
    let map = compute_heatmap(&sample_events(), 12, today);
    let (week, day, _) = map
      .cells()
      .find(|(_, _, c)| c.date == ymd(2024, 6, 3))
      .unwrap();

    assert_eq!(map.click(week, day, |p| *p), Some(12));
    assert_eq!(
      map.tooltip(week, day, |p, date| format!("{p} on {date}")),
      Some("12 on 2024-06-03".to_string())
    );
    assert!(map.click(week, (day + 1) % 7, |p| *p).is_none());
    assert!(map.click(99, 0, |p| *p).is_none());
  }
}
