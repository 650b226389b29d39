//! Frequency-domain block convolution for sample streams.
//!
//! - [`OlaBlockConvolver`] and [`OlsBlockConvolver`] convolve a stream one
//!   sample at a time with overlap-add and overlap-save block processing.
//! - [`DirectFilter`] is the time-domain delay line used for short kernels.
//! - [`AdaptiveFilter`] picks between them from the kernel length.
//! - [`SpectralConvolver`] and [`ComplexConvolver`] convolve whole arrays.
//!
//! Everything is generic over `f32` and `f64`.
//!
//! ```
//! use fft_block_convolver::{OlsBlockConvolver, StreamingFilter};
//!
//! let mut convolver = OlsBlockConvolver::new(&[1.0f64, 0.0, -1.0], 8).unwrap();
//! let output = convolver.apply(&[1.0, 2.0, 3.0, 4.0]);
//! assert_eq!(output.len(), 6);
//! assert!((output[5] + 4.0).abs() < 1e-9);
//! ```

mod adaptive_filter;
mod complex_convolver;
mod config;
mod direct_filter;
mod error;
mod fft;
mod filter;
mod ola_block_convolver;
mod ols_block_convolver;
mod spectral_block;
mod spectral_convolver;
mod utilities;

pub use adaptive_filter::{AdaptiveFilter, AdaptiveFilter32, AdaptiveFilter64};
pub use complex_convolver::{
    polynomial_divide, ComplexConvolver, ComplexConvolver32, ComplexConvolver64,
};
pub use config::{BlockMethod, FilterConfig, FilterStrategy};
pub use direct_filter::{direct_convolve, DirectFilter, DirectFilter32, DirectFilter64};
pub use error::ConvolverError;
pub use fft::{ComplexFft, Fft};
pub use filter::StreamingFilter;
pub use ola_block_convolver::{OlaBlockConvolver, OlaBlockConvolver32, OlaBlockConvolver64};
pub use ols_block_convolver::{OlsBlockConvolver, OlsBlockConvolver32, OlsBlockConvolver64};
pub use spectral_convolver::{SpectralConvolver, SpectralConvolver32, SpectralConvolver64};
