use num::Zero;
use realfft::FftError;
use rustfft::num_complex::Complex;
use rustfft::FftNum;

use crate::error::{validate_fft_size, ConvolverError};
use crate::fft::Fft;
use crate::utilities::{complex_multiply, copy_and_pad, transform_size_for};

/// A planned transform together with the buffers it works on.
#[derive(Debug, Clone)]
struct SpectralPlan<F: FftNum> {
    fft: Fft<F>,
    signal_buffer: Vec<F>,
    kernel_buffer: Vec<F>,
    signal_spectrum: Vec<Complex<F>>,
    kernel_spectrum: Vec<Complex<F>>,
}

impl<F: FftNum> SpectralPlan<F> {
    fn new(fft_size: usize) -> Result<Self, ConvolverError> {
        tracing::debug!(fft_size, "planning spectral convolver");
        let fft = Fft::new(fft_size)?;
        let complex_len = fft.complex_len();
        Ok(Self {
            fft,
            signal_buffer: vec![F::zero(); fft_size],
            kernel_buffer: vec![F::zero(); fft_size],
            signal_spectrum: vec![Complex::zero(); complex_len],
            kernel_spectrum: vec![Complex::zero(); complex_len],
        })
    }

    fn len(&self) -> usize {
        self.fft.len()
    }

    /// First `len` samples of the linear convolution, `len` must fit the plan.
    fn convolve(&mut self, signal: &[F], kernel: &[F], len: usize) -> Result<Vec<F>, FftError> {
        copy_and_pad(&mut self.signal_buffer, signal);
        copy_and_pad(&mut self.kernel_buffer, kernel);
        self.fft.forward(&mut self.signal_buffer, &mut self.signal_spectrum)?;
        self.fft.forward(&mut self.kernel_buffer, &mut self.kernel_spectrum)?;
        complex_multiply(&mut self.signal_spectrum, &self.kernel_spectrum);
        self.fft.inverse(&mut self.signal_spectrum, &mut self.signal_buffer)?;
        Ok(self.signal_buffer[..len].to_vec())
    }

    fn circular(
        &mut self,
        input: &mut [F],
        kernel: &mut [F],
        output: &mut [F],
    ) -> Result<(), FftError> {
        self.fft.forward(input, &mut self.signal_spectrum)?;
        self.fft.forward(kernel, &mut self.kernel_spectrum)?;
        complex_multiply(&mut self.signal_spectrum, &self.kernel_spectrum);
        self.fft.inverse(&mut self.signal_spectrum, output)
    }
}

/// Linear convolution and cross-correlation of whole arrays via the FFT.
///
/// Without a configured size every call plans the next power of two that
/// holds the full linear result (re-planning only when that size changes).
/// [`SpectralConvolver::with_fft_size`] fixes the transform size up front and
/// enables [`SpectralConvolver::convolve_in_place`], which does not allocate.
/// The configured plan is never replaced: results that do not fit into it are
/// computed with a temporary plan.
#[derive(Debug, Clone)]
pub struct SpectralConvolver<F: FftNum> {
    plan: Option<SpectralPlan<F>>,
    fixed_size: Option<usize>,
}

pub type SpectralConvolver32 = SpectralConvolver<f32>;
pub type SpectralConvolver64 = SpectralConvolver<f64>;

impl<F: FftNum> Default for SpectralConvolver<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: FftNum> SpectralConvolver<F> {
    pub fn new() -> Self {
        Self {
            plan: None,
            fixed_size: None,
        }
    }

    pub fn with_fft_size(fft_size: usize) -> Result<Self, ConvolverError> {
        validate_fft_size(fft_size)?;
        Ok(Self {
            plan: Some(SpectralPlan::new(fft_size)?),
            fixed_size: Some(fft_size),
        })
    }

    /// Size of the current plan, if any. Always the configured size if there is one.
    pub fn fft_size(&self) -> Option<usize> {
        self.plan.as_ref().map(SpectralPlan::len)
    }

    fn prepare(&mut self, fft_size: usize) -> Result<&mut SpectralPlan<F>, ConvolverError> {
        if self.fft_size() != Some(fft_size) {
            self.plan = Some(SpectralPlan::new(fft_size)?);
        }
        self.plan
            .as_mut()
            .ok_or(ConvolverError::InvalidFftSize(fft_size))
    }

    /// Linear convolution, `signal.len() + kernel.len() - 1` samples.
    ///
    /// A configured transform size is used if the result fits into it,
    /// otherwise a large enough temporary one is planned for this call.
    pub fn convolve(&mut self, signal: &[F], kernel: &[F]) -> Result<Vec<F>, ConvolverError> {
        if signal.is_empty() || kernel.is_empty() {
            return Ok(Vec::new());
        }
        let len = signal.len() + kernel.len() - 1;
        let fixed_size = self.fixed_size;
        let plan = match fixed_size {
            Some(size) if size >= len => self.prepare(size)?,
            Some(size) => {
                tracing::debug!(
                    fft_size = size,
                    len,
                    "result exceeds configured transform size"
                );
                let mut plan = SpectralPlan::new(transform_size_for(len))?;
                return Ok(plan.convolve(signal, kernel, len)?);
            }
            None => self.prepare(transform_size_for(len))?,
        };
        Ok(plan.convolve(signal, kernel, len)?)
    }

    /// Cross-correlation of `a` with `b`, computed as `a` convolved with reversed `b`.
    pub fn cross_correlate(&mut self, a: &[F], b: &[F]) -> Result<Vec<F>, ConvolverError> {
        let reversed: Vec<F> = b.iter().rev().copied().collect();
        self.convolve(a, &reversed)
    }

    /// Circular convolution of pre-sized buffers without allocating.
    ///
    /// `input` and `kernel` must already be zero padded to the transform size
    /// and are clobbered. The full circular result is written to `output`; it
    /// equals the linear convolution only if the non-zero parts of `input` and
    /// `kernel` together are not longer than `fft_size + 1`, otherwise the tail
    /// wraps around. Without a configured size, the length of `input` is planned.
    pub fn convolve_in_place(
        &mut self,
        input: &mut [F],
        kernel: &mut [F],
        output: &mut [F],
    ) -> Result<(), ConvolverError> {
        let fft_size = self.fixed_size.unwrap_or(input.len());
        for len in [input.len(), kernel.len(), output.len()] {
            if len != fft_size {
                return Err(ConvolverError::BufferLengthMismatch {
                    expected: fft_size,
                    actual: len,
                });
            }
        }
        self.prepare(fft_size)?.circular(input, kernel, output)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct_filter::direct_convolve;
    use approx::assert_abs_diff_eq;

    #[test]
    fn convolve_differencer() {
        let mut convolver = SpectralConvolver::<f64>::new();
        let signal: Vec<f64> = (1..=10).map(f64::from).collect();
        let output = convolver.convolve(&signal, &[1.0, 0.0, -1.0]).unwrap();

        let expected = [1., 2., 2., 2., 2., 2., 2., 2., 2., 2., -9., -10.];
        assert_eq!(output.len(), 12);
        for (o, e) in output.iter().zip(&expected) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-10);
        }
        assert_eq!(convolver.fft_size(), Some(16));
    }

    #[test]
    fn convolve_replans_for_larger_inputs() {
        let mut convolver = SpectralConvolver::<f32>::new();
        assert_eq!(convolver.fft_size(), None);
        convolver.convolve(&[1.0; 3], &[1.0; 2]).unwrap();
        assert_eq!(convolver.fft_size(), Some(4));
        convolver.convolve(&[1.0; 100], &[1.0; 30]).unwrap();
        assert_eq!(convolver.fft_size(), Some(256));
        convolver.convolve(&[1.0; 3], &[1.0; 2]).unwrap();
        assert_eq!(convolver.fft_size(), Some(4));
    }

    #[test]
    fn fixed_size_is_kept_when_large_enough() {
        let mut convolver = SpectralConvolver::<f64>::with_fft_size(64).unwrap();
        let signal: Vec<f64> = (0..20).map(|i| (i as f64).sqrt()).collect();
        let kernel = [0.5, 0.25, -0.75];
        let output = convolver.convolve(&signal, &kernel).unwrap();
        assert_eq!(convolver.fft_size(), Some(64));

        let expected = direct_convolve(&signal, &kernel);
        for (o, e) in output.iter().zip(&expected) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-10);
        }
    }

    #[test]
    fn empty_operands() {
        let mut convolver = SpectralConvolver::<f64>::new();
        assert!(convolver.convolve(&[], &[1.0]).unwrap().is_empty());
        assert!(convolver.convolve(&[1.0], &[]).unwrap().is_empty());
    }

    #[test]
    fn cross_correlate_finds_lag() {
        let mut convolver = SpectralConvolver::<f64>::new();
        let a = [0.0, 0.0, 1.0, 2.0, 3.0, 0.0];
        let b = [1.0, 2.0, 3.0];
        let output = convolver.cross_correlate(&a, &b).unwrap();
        assert_eq!(output.len(), 8);

        let peak = output
            .iter()
            .enumerate()
            .max_by(|x, y| x.1.total_cmp(y.1))
            .map(|(i, _)| i)
            .unwrap();
        // zero lag sits at b.len() - 1, a contains b shifted by 2
        assert_eq!(peak, 2 + b.len() - 1);
        assert_abs_diff_eq!(output[peak], 14.0, epsilon = 1e-10);
    }

    #[test]
    fn convolve_in_place_test() {
        let mut convolver = SpectralConvolver::<f32>::with_fft_size(8).unwrap();
        let mut input = vec![1.0, 2.0, 3.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut kernel = vec![1.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut output = vec![0.0; 8];
        convolver
            .convolve_in_place(&mut input, &mut kernel, &mut output)
            .unwrap();

        let expected = [1.0, 3.0, 5.0, 3.0, 0.0, 0.0, 0.0, 0.0];
        for (o, e) in output.iter().zip(&expected) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-5);
        }
    }

    #[test]
    fn convolve_in_place_aliases_when_too_long() {
        let mut convolver = SpectralConvolver::<f64>::with_fft_size(4).unwrap();
        let mut input = vec![1.0, 2.0, 3.0, 4.0];
        let mut kernel = vec![0.0, 1.0, 0.0, 0.0];
        let mut output = vec![0.0; 4];
        convolver
            .convolve_in_place(&mut input, &mut kernel, &mut output)
            .unwrap();

        let expected = [4.0, 1.0, 2.0, 3.0];
        for (o, e) in output.iter().zip(&expected) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn convolve_in_place_checks_lengths() {
        let mut convolver = SpectralConvolver::<f64>::with_fft_size(8).unwrap();
        let mut input = vec![0.0; 8];
        let mut kernel = vec![0.0; 4];
        let mut output = vec![0.0; 8];
        assert!(matches!(
            convolver.convolve_in_place(&mut input, &mut kernel, &mut output),
            Err(ConvolverError::BufferLengthMismatch {
                expected: 8,
                actual: 4
            })
        ));
    }

    #[test]
    fn oversized_convolve_keeps_configured_size() {
        let mut convolver = SpectralConvolver::<f64>::with_fft_size(8).unwrap();
        let output = convolver.convolve(&[1.0; 40], &[1.0; 3]).unwrap();
        assert_eq!(output.len(), 42);
        assert_abs_diff_eq!(output[20], 3.0, epsilon = 1e-10);
        assert_eq!(convolver.fft_size(), Some(8));

        let mut input = vec![1.0, 2.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut kernel = vec![1.0, -1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        let mut output = vec![0.0; 8];
        convolver
            .convolve_in_place(&mut input, &mut kernel, &mut output)
            .unwrap();
        let expected = [1.0, 1.0, -2.0, 0.0, 0.0, 0.0, 0.0, 0.0];
        for (o, e) in output.iter().zip(&expected) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn convolve_in_place_plans_input_length_without_configured_size() {
        let mut convolver = SpectralConvolver::<f64>::new();
        convolver.convolve(&[1.0; 10], &[1.0; 3]).unwrap();
        assert_eq!(convolver.fft_size(), Some(16));

        let mut input = vec![1.0, 1.0, 0.0, 0.0];
        let mut kernel = vec![2.0, 0.0, 0.0, 0.0];
        let mut output = vec![0.0; 4];
        convolver
            .convolve_in_place(&mut input, &mut kernel, &mut output)
            .unwrap();
        assert_eq!(convolver.fft_size(), Some(4));
        let expected = [2.0, 2.0, 0.0, 0.0];
        for (o, e) in output.iter().zip(&expected) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-12);
        }

        let mut input = vec![0.0; 6];
        let mut kernel = vec![0.0; 6];
        let mut output = vec![0.0; 6];
        assert!(matches!(
            convolver.convolve_in_place(&mut input, &mut kernel, &mut output),
            Err(ConvolverError::InvalidFftSize(6))
        ));
    }

    #[test]
    fn with_fft_size_validates() {
        assert!(matches!(
            SpectralConvolver::<f32>::with_fft_size(100),
            Err(ConvolverError::InvalidFftSize(100))
        ));
    }
}
