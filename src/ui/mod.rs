//! UI components for the S-111 viewer.
//!
//! This module contains the control panel and the identify popup.

pub mod controls;
pub mod popup;

pub use controls::{ControlAction, ControlPanel, ControlState};
pub use popup::show_popup;
