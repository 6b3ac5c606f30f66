//! Domain types and the ports the application layer talks through.

pub mod auth;
pub mod booking;
pub mod payment;
pub mod ports;
pub mod tutor;
