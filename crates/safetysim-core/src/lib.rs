#![deny(warnings)]
pub mod belief;
pub mod error;
pub mod scaling;

pub use error::{ErrorCategory, SimError};

pub struct AppInfo;

impl AppInfo {
    pub const fn name() -> &'static str {
        "safetysim"
    }

    pub const fn codename() -> &'static str {
        "Monitor & Cap"
    }

    pub const fn version() -> &'static str {
        env!("CARGO_PKG_VERSION")
    }
}
