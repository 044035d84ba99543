pub mod config;

pub use config::{
    encode_component, is_valid_email, ContactConfig, ContactConfigError, ContactConfigStore,
    ContactUpdate, DEFAULT_CONFIG_PATH,
};
