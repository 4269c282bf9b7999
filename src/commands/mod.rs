//! Command handlers
//!
//! This module contains the handlers the presentation layer calls to drive
//! the record dialog.

pub mod dialog;
pub mod recording;
