pub mod error;
pub mod observe;
pub mod settings;

pub use error::{OspreyError, OspreyResult, PlannerError, SettingsError};
pub use settings::Settings;
