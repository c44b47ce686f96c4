//! Caller identity. Authentication happens upstream; the user id arrives
//! as a trusted request header.

pub mod middleware;

pub use middleware::{AuthContext, USER_ID_HEADER};
