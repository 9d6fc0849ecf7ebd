//! Statement-graph intermediate representation.
//!
//! A module is a flat arena of statements ([`stmt::Stmt`]) ordered by
//! identifier, plus blocks that give control-flow statements their
//! bodies. [`builder::IrBuilder`] is the only way to populate one;
//! [`offload::partition`] splits a finished module into dispatchable
//! units for codegen.

pub mod builder;
pub mod display;
pub mod field;
pub mod module;
pub mod offload;
pub mod stmt;
pub mod types;

pub use builder::{Guard, IrBuilder};
pub use field::{Field, TextureDimension, TextureFormat, TextureInfo};
pub use module::{Block, IrModule};
pub use offload::{OffloadKind, OffloadedModule};
pub use stmt::{BlockId, Stmt, StmtId, StmtKind};
pub use types::{PrimitiveType, ValueType};
