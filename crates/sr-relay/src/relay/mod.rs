//! Command relaying between transport clients and the session

mod controller;
mod hub;

pub use controller::RelayController;
pub use hub::RelayHub;
