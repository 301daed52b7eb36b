//! Axum handlers. Each one unwraps its inputs, calls into a service and
//! shapes the `{"success": ...}` envelope the front-ends expect.

pub mod advertisements;
pub mod listings;
pub mod requests;
pub mod system;
