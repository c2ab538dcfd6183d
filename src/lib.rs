//! dayplan: a time-weighted task scheduler.
//!
//! Tasks live in a flat JSON file ([`store`]). On request they are scored and
//! packed into a daily plan ([`scheduler`]), which is rendered as HTML or
//! exported as CSV ([`api`], [`export`]).

pub mod api;
pub mod config;
pub mod export;
pub mod models;
pub mod scheduler;
pub mod store;
