use serde::{Deserialize, Serialize};

use crate::utilities::transform_size_for;

/// Which filtering algorithm to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterStrategy {
    /// Direct filtering below the kernel length threshold, block convolution above it
    #[default]
    Auto,
    Direct,
    OverlapAdd,
    OverlapSave,
}

/// Block algorithm used when [`FilterStrategy::Auto`] picks block convolution.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockMethod {
    OverlapAdd,
    #[default]
    OverlapSave,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub strategy: FilterStrategy,
    /// Kernels at least this long are filtered with block convolution
    #[serde(default = "FilterConfig::default_kernel_length_threshold")]
    pub kernel_length_threshold: usize,
    #[serde(default)]
    pub block_method: BlockMethod,
    /// Block transform size; defaults to the next power of two >= 4 * kernel length
    #[serde(default)]
    pub fft_size: Option<usize>,
}

impl FilterConfig {
    fn default_kernel_length_threshold() -> usize {
        64
    }

    pub fn from_toml_str(source: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(source)
    }

    /// Transform size used for a block convolver over a kernel of `kernel_len` taps.
    pub fn fft_size_for(&self, kernel_len: usize) -> usize {
        self.fft_size.unwrap_or_else(|| transform_size_for(4 * kernel_len))
    }
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            strategy: FilterStrategy::default(),
            kernel_length_threshold: Self::default_kernel_length_threshold(),
            block_method: BlockMethod::default(),
            fft_size: None,
        }
    }
}
