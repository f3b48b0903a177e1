//! Platform route tables for the ruta routing engine.
//!
//! A platform table lists the ports, port groups, routes and criteria of one
//! hardware platform. Tables are TOML files; they are validated as a whole and
//! then applied to anything implementing
//! [`RouteInterface`](ruta_core::RouteInterface), which performs discovery in
//! file order.
//!
//! # Example
//!
//! ```rust
//! use ruta_config::builtin_platform;
//! use ruta_core::sim::simulated_engine;
//!
//! let platform = builtin_platform("redhookbay").unwrap();
//! let (mut engine, _journal, _devices) = simulated_engine();
//! platform.apply(&mut engine).unwrap();
//! assert_eq!(engine.graph().route_count(ruta_core::Direction::Output), 9);
//! ```

mod error;
mod platform;

/// Search paths for platform tables.
pub mod paths;

/// Platform table validation.
pub mod validation;

/// Reference platforms bundled with the library.
pub mod platforms;

pub use error::ConfigError;
pub use paths::{
    ensure_user_platforms_dir, find_platform, list_platforms, platform_name_from_path,
    system_platforms_dir, user_platforms_dir,
};
pub use platform::{
    CriterionConfig, CriterionTypeConfig, PlatformConfig, PortGroupConfig, RouteConfig, RouteKind,
    StreamSettings, ValuePairConfig,
};
pub use platforms::{BUILTIN_PLATFORM_NAMES, builtin_platform, builtin_platforms, is_builtin_platform};
pub use validation::{ValidationError, ValidationResult, platform_errors, validate_platform};

/// Loads a table by bundled name, path, or name in the search paths.
pub fn load_platform(name: &str) -> Result<PlatformConfig, ConfigError> {
    if let Some(path) = find_platform(name) {
        return PlatformConfig::load(path);
    }
    builtin_platform(name).ok_or_else(|| ConfigError::PlatformNotFound(name.to_string()))
}
