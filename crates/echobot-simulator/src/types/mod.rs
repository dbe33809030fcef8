//! Request and response types for the simulator API.

pub mod requests;
pub mod responses;

pub use requests::*;
pub use responses::*;
