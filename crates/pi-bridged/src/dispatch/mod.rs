//! Request validation and dispatch for bridge connections.
//!
//! Each connection carries exactly one request line and receives exactly one
//! response line before the server closes it.
//!
//! ## Protocol
//!
//! Requests are single-line JSON objects:
//!
//! ```json
//! {"type":"context","file":"a.py","filetype":"python","text":"print(1)"}
//! ```
//!
//! Responses are one of:
//!
//! ```json
//! {"status":"ok","cwd":"/home/dev/project"}
//! {"ok":true}
//! {"error":"invalid JSON"}
//! {"error":"missing 'text'"}
//! {"error":"unknown type"}
//! ```
//!
//! A request whose `text` is missing is rejected before its `type` is
//! inspected, so an unknown type without text reports `missing 'text'`.

mod dispatcher;
mod errors;
mod handler;
mod request;
mod response;

pub use self::dispatcher::dispatch;
pub use self::errors::ValidationError;
pub use self::handler::BridgeConnectionHandler;
pub use self::request::{Message, Snippet, validate};
pub use self::response::{BridgeResponse, ResponseWriter};
