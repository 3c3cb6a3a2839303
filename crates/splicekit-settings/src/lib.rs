//! SpliceKit Settings Crate
//!
//! Handles processing configuration, settings persistence and the
//! configuration directives slicers embed in the instruction stream.

pub mod config;
pub mod directive;
pub mod error;

pub use config::{
    BedPoint, BedSettings, DeviceSettings, PrinterSettings, PurgeSettings, Settings,
    SpliceSettings, SETTINGS_FILE_NAME,
};
pub use directive::Directive;
pub use error::{DirectiveError, DirectiveResult, SettingsError, SettingsResult};
