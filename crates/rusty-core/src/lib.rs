//! Core types and layout logic for the Rusty Butter activity graphs.
//!
//! This crate is deliberately free of HTTP and async-runtime dependencies.
//! It turns sparse dated events into a contribution-style calendar grid and
//! provides the two adapters (GitHub commit activity, Twitch streams) that
//! feed it. Fetching lives in `rusty-upstream`; serving lives in `rusty-api`.

pub mod event;
pub mod github;
pub mod heatmap;
pub mod layout;
pub mod source;
pub mod twitch;

pub use event::{DatedEvent, DuplicatePolicy};
pub use heatmap::{Heatmap, WindowAnchor, compute_heatmap, compute_heatmap_with};
pub use layout::{Viewport, select_week_count};
