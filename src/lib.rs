//! Terminal weather lookup.
//!
//! The [`resolver`] decides which location to ask about (typed city name or
//! geolocated coordinates, behind a one-time consent prompt), the
//! [`fetcher`] tracks what the weather panel shows, and [`api`] talks to the
//! Visual Crossing timeline endpoint.

pub mod api;
pub mod app;
pub mod config;
pub mod consent;
pub mod error;
pub mod events;
pub mod fetcher;
pub mod location;
pub mod logging;
pub mod models;
pub mod resolver;
pub mod storage;
pub mod ui;
