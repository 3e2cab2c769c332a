//! Scan-to-lookup core: admits decoded barcodes, runs one item lookup per
//! cycle against the remote service, and exposes the resulting presentation
//! state to whatever renders it.

pub mod admission;
pub mod config;
pub mod controller;
pub mod error;
pub mod lookup;
pub mod session;
pub mod state;

pub use admission::{admit, AdmissionDecision, RejectReason};
pub use config::{load_settings, load_settings_from, LookupSettings};
pub use controller::{LookupController, LookupTicket};
pub use error::{ControllerError, SettingsError};
pub use lookup::{HttpItemLookup, ItemLookup};
pub use session::{ScanSession, ScanSessionHandle};
pub use state::{AlertMessage, CycleState, ScanSnapshot};
