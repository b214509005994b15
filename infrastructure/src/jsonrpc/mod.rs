//! Newline-delimited JSON-RPC 2.0 over a byte stream.

pub mod dispatcher;
pub mod error;
pub mod protocol;
pub mod transport;

pub use dispatcher::{Dispatcher, DispatcherConfig};
pub use error::{DispatchError, TransportError};
pub use protocol::{JsonRpcResponse, PROTOCOL_VERSION, RequestId, RpcError};
pub use transport::DEFAULT_MAX_FRAME_BYTES;
