//! Shared data types for vidhub.
//!
//! `models` holds the stored entities and their narrow public projections,
//! `api` the request/response bodies and token claims exchanged over HTTP.

pub mod api;
pub mod models;
