//! The control panel: a short-lived surface that reconstructs playback state
//! on every open and sends user commands to the focused tab.

pub mod affordance;
mod panel;
pub mod reconcile;
pub mod restricted;

pub use crate::affordance::Affordance;
pub use crate::panel::{ActiveTab, ControlPanel, PanelError, TriggerOutcome};
