//! Application layer: the booking flow and the context it runs in.
//!
//! `PaymentOrchestrator` owns the booking state machine. `BookingForm` holds
//! the form state of one dialog, `BookingDialog` ties the two together, and
//! `AppContext` carries the logged-in user and the remote services.

pub mod booking_form;
pub mod context;
pub mod dialog;
pub mod orchestrator;
