//! Application layer: the payment session state machine and the controller
//! that drives it.
//!
//! The state machine decides every transition; the controller owns the clock,
//! runs gateway calls on their own tasks and turns the machine's outputs into
//! effects for the payment screen.

pub mod controller;
pub mod state_machine;
