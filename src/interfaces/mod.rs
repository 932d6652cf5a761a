//! Adapters between the payment step and the outside world: the order file
//! the cart hands over and the terminal the payer drives it from.

pub mod json;
pub mod terminal;
