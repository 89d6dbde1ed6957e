pub mod model;

pub use model::{NetworkSettings, Settings, CURRENT_SCHEMA_VERSION};
