pub mod countdown;
pub mod http_gateway;
pub mod scripted;
