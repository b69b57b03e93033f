//! Path search inside one layer and across coupled layers

pub mod cross_layer;
pub(crate) mod index;
pub mod path;
mod types;

pub use cross_layer::CrossLayerOptions;
pub use path::PathOptions;
pub use types::*;
