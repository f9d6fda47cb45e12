//! Responsive week-count selection.
//!
//! Widths are device-independent units. A terminal renderer converts its
//! column count before calling in; see [`UNITS_PER_TERMINAL_COLUMN`].

use std::sync::atomic::{AtomicU64, Ordering};

/// One calendar year of columns.
pub const MAX_WEEKS: usize = 52;

pub const MIN_CELL_SIZE: f64 = 9.0;
pub const MIN_GAP: f64 = 3.0;
pub const DAY_LABEL_WIDTH: f64 = 24.0;
pub const PADDING: f64 = 20.0;

/// A terminal cell and its trailing gap together span two columns, so one
/// column stands in for half of `MIN_CELL_SIZE + MIN_GAP`.
pub const UNITS_PER_TERMINAL_COLUMN: f64 = (MIN_CELL_SIZE + MIN_GAP) / 2.0;

/// Pick how many trailing weeks to show for a surface `available_width`
/// units wide.
///
/// Prefers a quarter, half year, three quarters or full year depending on
/// width, but never more weeks than fit at the minimum cell size. The result
/// is always within `1..=52` and never decreases as width grows.
pub fn select_week_count(available_width: f64, compact: bool) -> usize {
  let width = if available_width.is_finite() { available_width.max(0.0) } else { 0.0 };

  let usable = width - DAY_LABEL_WIDTH - PADDING;
  let max_fit = (usable / (MIN_CELL_SIZE + MIN_GAP)).floor().max(0.0) as usize;

  let target = if compact || width < 400.0 {
    12
  } else if width < 600.0 {
    26
  } else if width < 800.0 {
    39
  } else {
    MAX_WEEKS
  };

  target.min(max_fit).clamp(1, MAX_WEEKS)
}

// ─── Viewport ────────────────────────────────────────────────────────────────

/// Latest-value-wins holder for the width of a rendering surface.
///
/// Resize notifications may arrive from any thread; each render reads
/// whatever width was published last. Widths are stored as `f64` bits in a
/// single atomic, so no lock is needed.
#[derive(Debug)]
pub struct Viewport {
  width_bits: AtomicU64,
  compact:    bool,
}

impl Viewport {
  pub fn new(initial_width: f64, compact: bool) -> Self {
    Self { width_bits: AtomicU64::new(initial_width.to_bits()), compact }
  }

  /// Publish a new width.
  pub fn notify(&self, width: f64) {
    self.width_bits.store(width.to_bits(), Ordering::Release);
  }

  /// Publish a terminal width given in columns.
  pub fn notify_columns(&self, columns: u16) {
    self.notify(f64::from(columns) * UNITS_PER_TERMINAL_COLUMN);
  }

  pub fn width(&self) -> f64 {
    f64::from_bits(self.width_bits.load(Ordering::Acquire))
  }

  pub fn compact(&self) -> bool { self.compact }

  /// Week count for the most recently published width.
  pub fn week_count(&self) -> usize {
    select_week_count(self.width(), self.compact)
  }
}
