//! HTTP transport: request description, headers, envelope decoding and the
//! authenticated dispatcher.

mod dispatch;
pub mod envelope;
pub mod headers;
pub mod request;

pub use request::RequestDescriptor;
