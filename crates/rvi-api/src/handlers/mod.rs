//! HTTP handlers

pub mod forward;
