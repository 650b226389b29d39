use num::Zero;
use realfft::FftError;
use rustfft::num_complex::Complex;
use rustfft::FftNum;

use crate::error::{validate_fft_size, validate_kernel, ConvolverError};
use crate::fft::Fft;
use crate::utilities::{complex_multiply, copy_and_pad};

/// A kernel together with its cached spectrum and the transform buffers used
/// to run one block through it.
///
/// The spectrum is only ever recomputed through [`SpectralBlock::set_kernel`],
/// so kernel and spectrum cannot drift apart.
#[derive(Debug, Clone)]
pub(crate) struct SpectralBlock<F: FftNum> {
    fft: Fft<F>,
    kernel: Vec<F>,
    kernel_spectrum: Vec<Complex<F>>,
    time: Vec<F>,
    spectrum: Vec<Complex<F>>,
}

impl<F: FftNum> SpectralBlock<F> {
    pub fn new(kernel: &[F], fft_size: usize) -> Result<Self, ConvolverError> {
        validate_fft_size(fft_size)?;
        validate_kernel(kernel, fft_size)?;

        let fft = Fft::new(fft_size)?;
        let complex_len = fft.complex_len();
        let mut block = Self {
            fft,
            kernel: kernel.to_vec(),
            kernel_spectrum: vec![Complex::zero(); complex_len],
            time: vec![F::zero(); fft_size],
            spectrum: vec![Complex::zero(); complex_len],
        };
        block.update_spectrum()?;
        Ok(block)
    }

    pub fn fft_size(&self) -> usize {
        self.fft.len()
    }

    pub fn kernel(&self) -> &[F] {
        &self.kernel
    }

    /// Number of fresh samples per block, `N - M + 1`.
    pub fn hop_size(&self) -> usize {
        self.fft.len() - self.kernel.len() + 1
    }

    /// Replaces the kernel with one of the same length and recomputes the spectrum.
    ///
    /// A length mismatch leaves kernel and spectrum untouched.
    pub fn set_kernel(&mut self, kernel: &[F]) -> Result<(), ConvolverError> {
        if kernel.len() != self.kernel.len() {
            return Err(ConvolverError::KernelLengthMismatch {
                expected: self.kernel.len(),
                actual: kernel.len(),
            });
        }
        self.kernel.copy_from_slice(kernel);
        self.update_spectrum()?;
        Ok(())
    }

    fn update_spectrum(&mut self) -> Result<(), FftError> {
        copy_and_pad(&mut self.time, &self.kernel);
        self.fft.forward(&mut self.time, &mut self.kernel_spectrum)
    }

    /// Circular convolution of `input` (zero padded to the block size) with
    /// the kernel. The result is available through [`SpectralBlock::result`].
    pub fn convolve(&mut self, input: &[F]) -> Result<(), FftError> {
        copy_and_pad(&mut self.time, input);
        self.fft.forward(&mut self.time, &mut self.spectrum)?;
        complex_multiply(&mut self.spectrum, &self.kernel_spectrum);
        self.fft.inverse(&mut self.spectrum, &mut self.time)
    }

    pub fn result(&self) -> &[F] {
        &self.time
    }

    pub fn result_mut(&mut self) -> &mut [F] {
        &mut self.time
    }
}
