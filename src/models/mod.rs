//! Domain models for dayplan.
//!
//! # Core Concepts
//!
//! ## Persistent Entities
//!
//! - [`Task`]: A unit of work the user wants to get done, with an estimated
//!   duration, an impact weight and an optional deadline. Tasks live in the
//!   JSON task file and are edited only by explicit user action.
//!
//! ## Ephemeral Entities
//!
//! These are recomputed on every view and never persisted:
//!
//! - [`Schedule`]: A time-boxed plan for one day, built from the task list by
//!   [`crate::scheduler`].
//! - [`ScheduledSlot`]: One allocated block of time inside a schedule.
//! - [`UnscheduledTask`]: A task (or the remainder of one) that did not make it
//!   into the day.

mod schedule;
mod task;
mod validation;

pub use schedule::*;
pub use task::*;
pub use validation::*;
