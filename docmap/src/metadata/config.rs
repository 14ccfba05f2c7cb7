/// Global behaviour switches, set once through [crate::initialize].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct MetadataStorageConfig {
    /// Run the configured validator before every create and update.
    pub validate_models: bool,
    /// Store date-times with millisecond precision.
    pub are_timestamps_in_milliseconds: bool,
}

impl Default for MetadataStorageConfig {
    fn default() -> Self {
        MetadataStorageConfig {
            validate_models: true,
            are_timestamps_in_milliseconds: true,
        }
    }
}

impl MetadataStorageConfig {
    pub fn new() -> Self {
        MetadataStorageConfig::default()
    }

    pub fn validate_models(mut self, validate_models: bool) -> Self {
        self.validate_models = validate_models;
        self
    }

    pub fn timestamps_in_milliseconds(mut self, in_milliseconds: bool) -> Self {
        self.are_timestamps_in_milliseconds = in_milliseconds;
        self
    }
}
