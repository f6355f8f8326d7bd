pub mod fixtures;
pub mod http;
pub mod overpass;
pub mod resource;

pub use fixtures::*;
pub use http::HttpResource;
pub use overpass::*;
pub use resource::*;
