//! Scoring engine: edit overlay, ranking, medals, promotion and batch persistence.

pub mod activity;
pub mod batch;
pub mod board;
pub mod medal;
pub mod overlay;
pub mod promote;
pub mod rank;
pub mod snapshot;
pub mod team;
