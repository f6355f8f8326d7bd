pub mod entry;
pub mod error;
pub mod group;
pub mod layer;
pub mod map;
pub mod registry;
pub mod sequential;

pub use entry::*;
pub use error::*;
pub use group::*;
pub use layer::*;
pub use map::*;
pub use registry::*;
pub use sequential::*;
