mod primitive;
mod unit;
mod value;
mod class;
mod frame;
mod globals;

pub use primitive::{Primitive, PrimitiveKind, selector_arity};
pub use unit::{CompiledUnit, LiteralTable};
pub use value::{Closure, Instance, Value};
pub use class::ClassDescriptor;
pub use frame::{Frame, FrameRef, FrameStatus, SourceLocation};
pub use globals::GlobalNamespace;
