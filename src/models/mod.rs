pub mod intent;
pub mod metadata;
pub mod query;
pub mod result;

pub use intent::*;
pub use metadata::*;
pub use query::*;
pub use result::*;
