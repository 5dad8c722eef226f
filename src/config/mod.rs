pub mod types;

pub use types::load_config;
pub use types::Config;
