use realfft::{ComplexToReal, FftError, RealFftPlanner, RealToComplex};
use rustfft::num_complex::Complex;
use rustfft::{FftNum, FftPlanner};
use std::sync::Arc;

use crate::error::{validate_fft_size, ConvolverError};

/// Real-input transform of a fixed length.
///
/// Forward maps `len` real samples to `len / 2 + 1` complex bins, inverse maps
/// them back and normalizes by `1 / len`. Scratch space is allocated once so
/// that neither direction allocates.
#[derive(Clone)]
pub struct Fft<F: FftNum> {
    len: usize,
    scale: F,
    fft_forward: Arc<dyn RealToComplex<F>>,
    fft_inverse: Arc<dyn ComplexToReal<F>>,
    scratch_forward: Vec<Complex<F>>,
    scratch_inverse: Vec<Complex<F>>,
}

impl<F: FftNum> std::fmt::Debug for Fft<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Fft").field("len", &self.len).finish()
    }
}

impl<F: FftNum> Fft<F> {
    pub fn new(length: usize) -> Result<Self, ConvolverError> {
        validate_fft_size(length)?;
        let scale = F::from_usize(length)
            .map(|n| F::one() / n)
            .ok_or(ConvolverError::InvalidFftSize(length))?;

        let mut planner = RealFftPlanner::new();
        let fft_forward = planner.plan_fft_forward(length);
        let fft_inverse = planner.plan_fft_inverse(length);
        let scratch_forward = fft_forward.make_scratch_vec();
        let scratch_inverse = fft_inverse.make_scratch_vec();

        Ok(Self {
            len: length,
            scale,
            fft_forward,
            fft_inverse,
            scratch_forward,
            scratch_inverse,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of bins produced by [`Fft::forward`].
    pub fn complex_len(&self) -> usize {
        crate::utilities::complex_size(self.len)
    }

    /// Forward transform. `input` is used as scratch and left unspecified.
    pub fn forward(&mut self, input: &mut [F], output: &mut [Complex<F>]) -> Result<(), FftError> {
        self.fft_forward.process_with_scratch(input, output, &mut self.scratch_forward)
    }

    /// Normalized inverse transform. `input` is used as scratch and left unspecified.
    pub fn inverse(&mut self, input: &mut [Complex<F>], output: &mut [F]) -> Result<(), FftError> {
        self.fft_inverse.process_with_scratch(input, output, &mut self.scratch_inverse)?;

        // FFT Normalization
        let scale = self.scale;
        output.iter_mut().for_each(|bin| *bin = *bin * scale);

        Ok(())
    }
}

/// In-place complex transform of a fixed length, inverse normalized by `1 / len`.
#[derive(Clone)]
pub struct ComplexFft<F: FftNum> {
    len: usize,
    scale: F,
    fft_forward: Arc<dyn rustfft::Fft<F>>,
    fft_inverse: Arc<dyn rustfft::Fft<F>>,
    scratch: Vec<Complex<F>>,
}

impl<F: FftNum> std::fmt::Debug for ComplexFft<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComplexFft").field("len", &self.len).finish()
    }
}

impl<F: FftNum> ComplexFft<F> {
    pub fn new(length: usize) -> Result<Self, ConvolverError> {
        validate_fft_size(length)?;
        let scale = F::from_usize(length)
            .map(|n| F::one() / n)
            .ok_or(ConvolverError::InvalidFftSize(length))?;

        let mut planner = FftPlanner::new();
        let fft_forward = planner.plan_fft_forward(length);
        let fft_inverse = planner.plan_fft_inverse(length);
        let scratch_len = fft_forward
            .get_inplace_scratch_len()
            .max(fft_inverse.get_inplace_scratch_len());

        Ok(Self {
            len: length,
            scale,
            fft_forward,
            fft_inverse,
            scratch: vec![Complex::new(F::zero(), F::zero()); scratch_len],
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn forward(&mut self, buffer: &mut [Complex<F>]) {
        assert_eq!(buffer.len(), self.len);
        self.fft_forward.process_with_scratch(buffer, &mut self.scratch);
    }

    pub fn inverse(&mut self, buffer: &mut [Complex<F>]) {
        assert_eq!(buffer.len(), self.len);
        self.fft_inverse.process_with_scratch(buffer, &mut self.scratch);

        let scale = self.scale;
        buffer.iter_mut().for_each(|bin| *bin = *bin * scale);
    }
}
