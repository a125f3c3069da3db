//! Typed HTTP clients.

pub mod person;

pub use person::{Address, ClientError, Person, PersonClient};
