//! Library crate for courtside-back: basketball game tracking with a guarded
//! game lifecycle, live substitutions, per-player action ledgers with undo
//! and career statistics.
//!
//! Embedders build an [`state::AppState`] around a storage backend, usually
//! through [`state::AppState::bootstrap`] which also loads [`config`] and wires
//! logging, then call the use-cases in [`services`].

pub mod config;
pub mod dao;
pub mod dto;
pub mod error;
pub mod services;
pub mod state;
pub mod telemetry;
