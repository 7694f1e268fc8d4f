//! SSH implementation of the connection traits

mod connector;

pub use connector::{SshConnection, SshConnector};
