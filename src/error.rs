use realfft::FftError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConvolverError {
    #[error("kernel is not allowed to be empty")]
    EmptyKernel,
    #[error("fft size {0} must be a power of two and at least 2")]
    InvalidFftSize(usize),
    #[error("kernel of length {kernel_len} does not fit into fft size {fft_size}")]
    KernelTooLong { kernel_len: usize, fft_size: usize },
    #[error("new kernel has length {actual}, the current one has length {expected}")]
    KernelLengthMismatch { expected: usize, actual: usize },
    #[error("buffer must have length {expected}, got {actual}")]
    BufferLengthMismatch { expected: usize, actual: usize },
    #[error("signal of length {signal_len} is shorter than kernel of length {kernel_len}")]
    SignalTooShort { signal_len: usize, kernel_len: usize },
    #[error("fft error")]
    Fft(#[from] FftError),
}

/// Checks that `fft_size` can be used as a block transform size.
pub(crate) fn validate_fft_size(fft_size: usize) -> Result<(), ConvolverError> {
    if fft_size < 2 || !fft_size.is_power_of_two() {
        return Err(ConvolverError::InvalidFftSize(fft_size));
    }
    Ok(())
}

/// Checks that `kernel` is non-empty and fits into one block of `fft_size`.
pub(crate) fn validate_kernel<F>(kernel: &[F], fft_size: usize) -> Result<(), ConvolverError> {
    if kernel.is_empty() {
        return Err(ConvolverError::EmptyKernel);
    }
    if kernel.len() > fft_size {
        return Err(ConvolverError::KernelTooLong {
            kernel_len: kernel.len(),
            fft_size,
        });
    }
    Ok(())
}
