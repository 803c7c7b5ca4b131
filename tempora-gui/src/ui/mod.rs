//! # UI Module
//!
//! This module contains all UI components for the Tempora application.

pub mod beat_indicator;
pub mod cent_meter;
pub mod main_display;
