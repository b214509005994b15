//! Tool domain: descriptor rules and handler result values
//!
//! Execution itself is an application-layer port; this module only knows
//! what a valid tool looks like and what a handler may return.

pub mod entities;
pub mod value_objects;

pub use entities::{ToolDescriptor, ToolDescriptorError, object_schema, validate_tool_name};
pub use value_objects::{ContentBlock, ToolError, ToolOutput};
