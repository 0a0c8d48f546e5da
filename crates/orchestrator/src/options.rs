//! Per-call generation options

use provider::GenerationConfig;

/// Options for a non-streaming generate call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateOptions {
    /// `None` leaves the provider's default temperature in place.
    pub temperature: Option<f32>,
    /// The caller expects a JSON payload; the result is repaired and
    /// validated before it is returned.
    pub json_mode: bool,
    pub max_output_tokens: u32,
    pub use_external_retrieval: bool,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            temperature: None,
            json_mode: false,
            max_output_tokens: 8192,
            use_external_retrieval: false,
        }
    }
}

impl GenerateOptions {
    /// Options for a structured (JSON) response.
    pub fn json() -> Self {
        Self {
            json_mode: true,
            ..Self::default()
        }
    }

    pub(crate) fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: None,
            temperature: self.temperature,
            json_mode: self.json_mode,
            max_output_tokens: self.max_output_tokens,
            use_external_retrieval: self.use_external_retrieval,
        }
    }
}

/// Options for a streaming generate call. Streams are plain text, so there
/// is no JSON mode.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOptions {
    pub temperature: Option<f32>,
    pub max_output_tokens: u32,
    pub use_external_retrieval: bool,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            temperature: None,
            max_output_tokens: 8192,
            use_external_retrieval: false,
        }
    }
}

impl StreamOptions {
    pub(crate) fn generation_config(&self) -> GenerationConfig {
        GenerationConfig {
            model: None,
            temperature: self.temperature,
            json_mode: false,
            max_output_tokens: self.max_output_tokens,
            use_external_retrieval: self.use_external_retrieval,
        }
    }
}
