//! Update configuration: schema, loading and version resolution

mod loader;
mod schema;

pub use loader::{
    DEFAULT_CONFIG_FILE, DEFAULT_VERSION_FILE, VersionSource, config_path, load_update_config,
    parse_update_config, resolve_version,
};
pub use schema::{
    Change, ChangeKind, CommandChange, EnvVar, GoChange, Patterns, RegexChange, Rule,
    UpdateConfig, UpdateConfigSpec, VersionStreamChange,
};
