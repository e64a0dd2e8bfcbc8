//! Router builders. The binary (or a test) nests them under `/api/v1`.

mod common;
mod resource;
mod settings;

pub use common::common_routes_with_ready;
pub use resource::resource_routes;
pub use settings::settings_routes;
