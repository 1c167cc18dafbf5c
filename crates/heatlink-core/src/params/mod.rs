//! Parameter definitions
//!
//! Data types with their text codecs, parameter metadata, and the static
//! registry of parameters the heat pump exposes.

mod param;
mod registry;
mod types;

pub use param::{Acl, CommandKind, Parameter};
pub use registry::ParamRegistry;
pub use types::{format_value, parse_value, DataType, Value};
