use rustfft::FftNum;

use crate::config::{BlockMethod, FilterConfig, FilterStrategy};
use crate::direct_filter::DirectFilter;
use crate::error::ConvolverError;
use crate::filter::StreamingFilter;
use crate::ola_block_convolver::OlaBlockConvolver;
use crate::ols_block_convolver::OlsBlockConvolver;

/// FIR filter that picks direct or block convolution from the kernel length.
///
/// Short kernels run through a [`DirectFilter`]; once the kernel reaches
/// [`FilterConfig::kernel_length_threshold`] taps, an overlap-add or
/// overlap-save convolver is used instead. Callers see the same
/// [`StreamingFilter`] interface either way; only [`StreamingFilter::latency`]
/// differs.
#[derive(Debug, Clone)]
pub enum AdaptiveFilter<F: FftNum> {
    Direct(DirectFilter<F>),
    OverlapAdd(OlaBlockConvolver<F>),
    OverlapSave(OlsBlockConvolver<F>),
}

pub type AdaptiveFilter32 = AdaptiveFilter<f32>;
pub type AdaptiveFilter64 = AdaptiveFilter<f64>;

impl<F: FftNum> AdaptiveFilter<F> {
    /// Creates a filter with [`FilterConfig::default`].
    pub fn new(kernel: &[F]) -> Result<Self, ConvolverError> {
        Self::with_config(kernel, &FilterConfig::default())
    }

    pub fn with_config(kernel: &[F], config: &FilterConfig) -> Result<Self, ConvolverError> {
        let strategy = match config.strategy {
            FilterStrategy::Auto if kernel.len() < config.kernel_length_threshold => {
                FilterStrategy::Direct
            }
            FilterStrategy::Auto => match config.block_method {
                BlockMethod::OverlapAdd => FilterStrategy::OverlapAdd,
                BlockMethod::OverlapSave => FilterStrategy::OverlapSave,
            },
            forced => forced,
        };
        tracing::debug!(
            kernel_len = kernel.len(),
            threshold = config.kernel_length_threshold,
            ?strategy,
            "selected filtering strategy"
        );

        let fft_size = config.fft_size_for(kernel.len());
        let filter = match strategy {
            FilterStrategy::OverlapAdd => {
                Self::OverlapAdd(OlaBlockConvolver::new(kernel, fft_size)?)
            }
            FilterStrategy::OverlapSave => {
                Self::OverlapSave(OlsBlockConvolver::new(kernel, fft_size)?)
            }
            FilterStrategy::Direct | FilterStrategy::Auto => {
                Self::Direct(DirectFilter::new(kernel)?)
            }
        };
        Ok(filter)
    }

    /// The concrete strategy in use, never [`FilterStrategy::Auto`].
    pub fn strategy(&self) -> FilterStrategy {
        match self {
            Self::Direct(_) => FilterStrategy::Direct,
            Self::OverlapAdd(_) => FilterStrategy::OverlapAdd,
            Self::OverlapSave(_) => FilterStrategy::OverlapSave,
        }
    }

    fn as_filter(&self) -> &dyn StreamingFilter<F> {
        match self {
            Self::Direct(filter) => filter,
            Self::OverlapAdd(filter) => filter,
            Self::OverlapSave(filter) => filter,
        }
    }

    fn as_filter_mut(&mut self) -> &mut dyn StreamingFilter<F> {
        match self {
            Self::Direct(filter) => filter,
            Self::OverlapAdd(filter) => filter,
            Self::OverlapSave(filter) => filter,
        }
    }
}

impl<F: FftNum> StreamingFilter<F> for AdaptiveFilter<F> {
    fn process(&mut self, sample: F) -> F {
        match self {
            Self::Direct(filter) => filter.process(sample),
            Self::OverlapAdd(filter) => filter.process(sample),
            Self::OverlapSave(filter) => filter.process(sample),
        }
    }

    fn reset(&mut self) {
        self.as_filter_mut().reset()
    }

    fn change_kernel(&mut self, kernel: &[F]) -> Result<(), ConvolverError> {
        self.as_filter_mut().change_kernel(kernel)
    }

    fn kernel_len(&self) -> usize {
        self.as_filter().kernel_len()
    }

    fn latency(&self) -> usize {
        self.as_filter().latency()
    }
}
