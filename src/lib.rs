//! Block highlight overlays: configured block lists, cave air and simulated ore veins.
#![forbid(unsafe_code)]

pub mod esp;
pub mod event;
pub mod messages;
pub mod settings;

pub use esp::{BlockEsp, CaveEsp, EnableError, EspController, EspCore, OreEsp};
pub use event::{Event, EventEnvelope, EventQueue};
pub use messages::{LogMessages, MessageBuffer, UserMessages};
pub use settings::{CaveMode, Settings};
