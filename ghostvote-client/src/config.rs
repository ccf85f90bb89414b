use bon::Builder;

/// Validity of a freshly issued decryption authorization.
pub const DEFAULT_VALIDITY_DAYS: u32 = 365;

#[derive(Debug, Clone, Builder)]
pub struct SessionConfig {
    /// Log label.
    #[builder(into, default = "ghostvote".to_string())]
    pub(crate) label: String,

    /// Number of days a new decryption authorization stays valid.
    #[builder(default = DEFAULT_VALIDITY_DAYS)]
    pub(crate) validity_days: u32,
}

impl SessionConfig {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn validity_days(&self) -> u32 {
        self.validity_days
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}
