//! Domain layer: the payment session entity, the order input it is built
//! from, the gateway port it settles through and the effects it requests.

pub mod effects;
pub mod order;
pub mod ports;
pub mod session;
