//! Client-side core of the bill payment app: view state, form dispatch,
//! the alert channel and the HTTP transport to the billing backend.

pub mod alert;
pub mod config;
pub mod controller;
pub mod dispatch;
pub mod error;
pub mod reducer;
pub mod state;
pub mod transport;

pub use alert::{Alert, AlertPolicy};
pub use config::{load_settings, ClientSettings, Endpoints};
pub use controller::{Controller, ControllerEvent, ProfileUpdate, Registration, SubmitOutcome};
pub use dispatch::{DispatchTable, FormFields};
pub use error::{ClientError, ValidationError};
pub use state::{AppState, AuthView, DashboardView, FormKey, ViewState};
pub use transport::{BillingApi, HttpBillingApi};
