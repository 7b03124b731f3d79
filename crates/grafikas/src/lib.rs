//! Grafikas - monthly work-schedule viewer.
//!
//! Renders one teacher's month as a calendar and all teachers as a grid of
//! working days, merging the fetched schedule with substitution marks kept in
//! a local store.

pub mod annotations;
pub mod app;
pub mod cache;
pub mod holidays;
pub mod html;
pub mod server;
pub mod status;
pub mod store;
pub mod view;
