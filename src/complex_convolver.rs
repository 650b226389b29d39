use num::Zero;
use rustfft::num_complex::Complex;
use rustfft::FftNum;

use crate::error::ConvolverError;
use crate::fft::ComplexFft;
use crate::utilities::{complex_multiply, copy_and_pad, transform_size_for};

/// Quotient terms and remainder components below this are treated as zero.
const DIVISION_TOLERANCE: f64 = 1e-10;

/// Added to every spectral bin before dividing spectra.
const SPECTRAL_BIAS: f64 = 1e-10;

/// FFT convolution of complex-valued sequences, plus experimental deconvolution.
#[derive(Debug, Clone)]
pub struct ComplexConvolver<F: FftNum> {
    fft: Option<ComplexFft<F>>,
    signal_buffer: Vec<Complex<F>>,
    kernel_buffer: Vec<Complex<F>>,
}

pub type ComplexConvolver32 = ComplexConvolver<f32>;
pub type ComplexConvolver64 = ComplexConvolver<f64>;

impl<F: FftNum + PartialOrd> Default for ComplexConvolver<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FftNum + PartialOrd> ComplexConvolver<F> {
    pub fn new() -> Self {
        Self {
            fft: None,
            signal_buffer: Vec::new(),
            kernel_buffer: Vec::new(),
        }
    }

    fn prepare(&mut self, fft_size: usize) -> Result<(), ConvolverError> {
        if self.fft.as_ref().map(ComplexFft::len) == Some(fft_size) {
            return Ok(());
        }
        tracing::debug!(fft_size, "planning complex convolver");
        self.fft = Some(ComplexFft::new(fft_size)?);
        self.signal_buffer.resize(fft_size, Complex::zero());
        self.kernel_buffer.resize(fft_size, Complex::zero());
        Ok(())
    }

    /// Transforms both zero padded operands, so `signal_buffer` and
    /// `kernel_buffer` hold their spectra afterwards.
    fn load_spectra(
        &mut self,
        signal: &[Complex<F>],
        kernel: &[Complex<F>],
        fft_size: usize,
    ) -> Result<(), ConvolverError> {
        self.prepare(fft_size)?;
        copy_and_pad(&mut self.signal_buffer, signal);
        copy_and_pad(&mut self.kernel_buffer, kernel);
        if let Some(fft) = self.fft.as_mut() {
            fft.forward(&mut self.signal_buffer);
            fft.forward(&mut self.kernel_buffer);
        }
        Ok(())
    }

    /// Linear convolution, `signal.len() + kernel.len() - 1` samples.
    pub fn convolve(
        &mut self,
        signal: &[Complex<F>],
        kernel: &[Complex<F>],
    ) -> Result<Vec<Complex<F>>, ConvolverError> {
        if signal.is_empty() || kernel.is_empty() {
            return Ok(Vec::new());
        }
        let len = signal.len() + kernel.len() - 1;
        self.load_spectra(signal, kernel, transform_size_for(len))?;

        complex_multiply(&mut self.signal_buffer, &self.kernel_buffer);
        if let Some(fft) = self.fft.as_mut() {
            fft.inverse(&mut self.signal_buffer);
        }
        Ok(self.signal_buffer[..len].to_vec())
    }

    /// Cross-correlation of `a` with `b`, computed as `a` convolved with reversed `b`.
    pub fn cross_correlate(
        &mut self,
        a: &[Complex<F>],
        b: &[Complex<F>],
    ) -> Result<Vec<Complex<F>>, ConvolverError> {
        let reversed: Vec<Complex<F>> = b.iter().rev().copied().collect();
        self.convolve(a, &reversed)
    }

    /// Recovers `x` from `signal = x * kernel`, `signal.len() - kernel.len() + 1` samples.
    ///
    /// Exact polynomial division is tried first and its quotient returned if
    /// the remainder vanishes. Otherwise the spectra are divided, with a small
    /// bias added to every bin to avoid dividing by zero.
    ///
    /// Deconvolution is ill-conditioned: the spectral fallback is only
    /// approximate, and badly so near zeros of the kernel spectrum. The result
    /// carries no indication of which path produced it.
    pub fn deconvolve(
        &mut self,
        signal: &[Complex<F>],
        kernel: &[Complex<F>],
    ) -> Result<Vec<Complex<F>>, ConvolverError> {
        if kernel.is_empty() {
            return Err(ConvolverError::EmptyKernel);
        }
        if signal.len() < kernel.len() {
            return Err(ConvolverError::SignalTooShort {
                signal_len: signal.len(),
                kernel_len: kernel.len(),
            });
        }

        let tolerance = from_f64::<F>(DIVISION_TOLERANCE);
        if let Some((quotient, remainder)) = polynomial_divide(signal, kernel) {
            if remainder
                .iter()
                .all(|r| r.re.abs() < tolerance && r.im.abs() < tolerance)
            {
                return Ok(quotient);
            }
        }
        tracing::debug!(
            signal_len = signal.len(),
            kernel_len = kernel.len(),
            "polynomial division inexact, dividing spectra"
        );

        let len = signal.len() - kernel.len() + 1;
        self.load_spectra(signal, kernel, transform_size_for(signal.len()))?;

        let bias = from_f64::<F>(SPECTRAL_BIAS);
        let bias = Complex::new(bias, bias);
        for (s, k) in self.signal_buffer.iter_mut().zip(&self.kernel_buffer) {
            *s = (*s + bias) / (*k + bias);
        }
        if let Some(fft) = self.fft.as_mut() {
            fft.inverse(&mut self.signal_buffer);
        }
        Ok(self.signal_buffer[..len].to_vec())
    }
}

/// Long division of polynomials given by their coefficients, leading term first.
///
/// Returns `(quotient, remainder)` with `dividend.len() - divisor.len() + 1`
/// and `divisor.len() - 1` coefficients, or `None` if the divisor is empty,
/// starts with zero or is longer than the dividend.
pub fn polynomial_divide<F: FftNum + PartialOrd>(
    dividend: &[Complex<F>],
    divisor: &[Complex<F>],
) -> Option<(Vec<Complex<F>>, Vec<Complex<F>>)> {
    let normalizer = *divisor.first()?;
    if normalizer.is_zero() || dividend.len() < divisor.len() {
        return None;
    }

    let tolerance = from_f64::<F>(DIVISION_TOLERANCE);
    let quotient_len = dividend.len() - divisor.len() + 1;
    let mut output = dividend.to_vec();
    for i in 0..quotient_len {
        output[i] = output[i] / normalizer;
        let coeff = output[i];
        if coeff.re.abs() > tolerance || coeff.im.abs() > tolerance {
            for (j, d) in divisor.iter().enumerate().skip(1) {
                output[i + j] = output[i + j] - *d * coeff;
            }
        }
    }

    let remainder = output.split_off(quotient_len);
    Some((output, remainder))
}

fn from_f64<F: FftNum>(value: f64) -> F {
    F::from_f64(value).unwrap_or_else(F::zero)
}
