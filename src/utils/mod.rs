/// TOML configuration and key-material loading.
pub mod toml_config;
/// Content moderation.
pub mod filter;
/// Handle and email validation.
pub mod validation;
