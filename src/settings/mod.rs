mod store;

pub use store::{validate_api_key, Settings, SettingsError, SettingsStore};
