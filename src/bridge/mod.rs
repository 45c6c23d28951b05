//! Request dispatch boundary between the UI surface and the workspace.
//!
//! - `Request` / `Response`: typed operations and their result shape
//! - `Bridge`: the service that executes requests and pushes events
//! - `serve`: line-delimited JSON transport used by the `kio` binary

mod dispatch;
mod host;
mod request;
mod response;

pub use dispatch::Bridge;
pub use host::serve;
pub use request::Request;
pub use response::{Payload, Response};
