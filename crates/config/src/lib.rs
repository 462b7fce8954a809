//! Configuration: a small TOML file with `${ENV_VAR}` substitution.
//!
//! Everything has a default; a missing config file is not an error.

pub mod env_subst;
pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, load_config, save_config, set_config_dir},
    schema::{
        ChatConfig, DocstoreConfig, IdentityConfig, ProviderEndpoint, ProviderEndpoints, WrenConfig,
    },
};
