use serde::Serialize;
use utoipa::ToSchema;

/// Application metadata read from the environment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Settings {
    #[schema(example = "Demo API")]
    pub app_name: String,
    #[schema(example = "1.0.0")]
    pub app_version: String,
    #[schema(example = "development")]
    pub environment: String,
    pub debug: bool,
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            app_name: lookup("APP_NAME").unwrap_or_else(|| "Demo API".to_string()),
            app_version: lookup("VERSION").unwrap_or_else(|| "1.0.0".to_string()),
            environment: lookup("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            debug: lookup("DEBUG")
                .map(|value| value.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }
}
