//! Dated events: the generic unit the heat-map consumes.

use std::collections::HashMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ─── Event ───────────────────────────────────────────────────────────────────

/// A single day of activity with a normalised intensity and an opaque payload.
///
/// The heat-map never inspects `payload`; it is carried through to click and
/// tooltip callbacks so each adapter keeps its own typed data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatedEvent<P> {
  pub date:      NaiveDate,
  /// Always within `[0, 1]`.
  pub intensity: f64,
  pub payload:   P,
}

impl<P> DatedEvent<P> {
  /// Build an event, clamping `intensity` into `[0, 1]`. Non-finite values
  /// become `0`.
  pub fn new(date: NaiveDate, intensity: f64, payload: P) -> Self {
    Self { date, intensity: clamp_intensity(intensity), payload }
  }
}

/// A date as `m/d/yyyy`, the form shown in tooltips and detail views.
pub fn display_date(date: NaiveDate) -> String {
  date.format("%-m/%-d/%Y").to_string()
}

fn clamp_intensity(value: f64) -> f64 {
  if value.is_finite() { value.clamp(0.0, 1.0) } else { 0.0 }
}

// ─── Duplicate handling ──────────────────────────────────────────────────────

/// How to resolve two events that land on the same calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
  /// The event that appears later in the input wins.
  KeepLast,
  /// The event with the greater intensity wins; ties go to the later event.
  #[default]
  KeepHighest,
}

/// Index `events` by calendar date, keeping exactly one event per date.
pub fn index_by_date<P>(
  events: &[DatedEvent<P>],
  policy: DuplicatePolicy,
) -> HashMap<NaiveDate, &DatedEvent<P>> {
  let mut by_date: HashMap<NaiveDate, &DatedEvent<P>> =
    HashMap::with_capacity(events.len());

  for event in events {
    match policy {
      DuplicatePolicy::KeepLast => {
        by_date.insert(event.date, event);
      }
      DuplicatePolicy::KeepHighest => {
        let replace = by_date
          .get(&event.date)
          .is_none_or(|existing| event.intensity >= existing.intensity);
        if replace {
          by_date.insert(event.date, event);
        }
      }
    }
  }

  by_date
}
