//! Plain HTTP types carried between the hyper boundary and the handler.

pub mod cors;
mod request;
mod response;

pub use request::{GateRequest, Method};
pub use response::{GateResponse, StatusCode};
