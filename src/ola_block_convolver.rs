use realfft::FftError;
use rustfft::FftNum;

use crate::error::ConvolverError;
use crate::filter::StreamingFilter;
use crate::spectral_block::SpectralBlock;
use crate::utilities::{add_assign, transform_size_for};

/// OlaBlockConvolver
/// Streaming FFT convolution using the overlap-add method.
///
/// Incoming samples are collected into non-overlapping blocks of
/// `hop_size = fft_size - kernel_len + 1` samples. Each full block is zero
/// padded to `fft_size`, multiplied with the cached kernel spectrum, and the
/// trailing `kernel_len - 1` samples of its result are added onto the head of
/// the next block's result.
///
/// Some notes on how to use it:
/// - Output is delayed by `hop_size - 1` samples: the first block only
///   completes once `hop_size` samples have been pushed. [`StreamingFilter::apply`]
///   compensates for this.
/// - No allocations happen in [`StreamingFilter::process`]; all buffers are
///   prepared during construction.
#[derive(Debug, Clone)]
pub struct OlaBlockConvolver<F: FftNum> {
    block: SpectralBlock<F>,
    input_buffer: Vec<F>,
    input_buffer_fill: usize,
    output_buffer: Vec<F>,
    output_buffer_pos: usize,
    /// Pending tail of the previous block, `kernel_len - 1` samples
    overlap: Vec<F>,
}

pub type OlaBlockConvolver32 = OlaBlockConvolver<f32>;
pub type OlaBlockConvolver64 = OlaBlockConvolver<f64>;

impl<F: FftNum> OlaBlockConvolver<F> {
    /// Creates the convolver
    ///
    /// # Arguments
    ///
    /// * `kernel` - The impulse response, at most `fft_size` samples
    ///
    /// * `fft_size` - Block transform size, a power of two
    ///
    pub fn new(kernel: &[F], fft_size: usize) -> Result<Self, ConvolverError> {
        let block = SpectralBlock::new(kernel, fft_size)?;
        let hop_size = block.hop_size();
        tracing::debug!(
            fft_size,
            hop_size,
            kernel_len = kernel.len(),
            "created overlap-add convolver"
        );

        Ok(Self {
            block,
            input_buffer: vec![F::zero(); hop_size],
            input_buffer_fill: 0,
            output_buffer: vec![F::zero(); hop_size],
            output_buffer_pos: 0,
            overlap: vec![F::zero(); kernel.len() - 1],
        })
    }

    /// Creates the convolver with a transform size of at least four kernel lengths.
    pub fn with_default_fft_size(kernel: &[F]) -> Result<Self, ConvolverError> {
        Self::new(kernel, transform_size_for(4 * kernel.len()))
    }

    pub fn fft_size(&self) -> usize {
        self.block.fft_size()
    }

    pub fn hop_size(&self) -> usize {
        self.input_buffer.len()
    }

    pub fn kernel(&self) -> &[F] {
        self.block.kernel()
    }

    fn process_frame(&mut self) -> Result<(), FftError> {
        let hop_size = self.input_buffer.len();
        // trailing kernel_len - 1 slots are zero padded by convolve
        self.block.convolve(&self.input_buffer)?;

        let result = self.block.result_mut();
        add_assign(&mut result[..self.overlap.len()], &self.overlap);
        self.overlap.copy_from_slice(&result[hop_size..]);
        self.output_buffer.copy_from_slice(&result[..hop_size]);
        Ok(())
    }
}

impl<F: FftNum> StreamingFilter<F> for OlaBlockConvolver<F> {
    fn process(&mut self, sample: F) -> F {
        self.input_buffer[self.input_buffer_fill] = sample;
        self.input_buffer_fill += 1;

        // Input buffer full => Next block
        if self.input_buffer_fill == self.input_buffer.len() {
            if let Err(err) = self.process_frame() {
                tracing::error!(%err, "overlap-add block transform failed");
                self.output_buffer.fill(F::zero());
            }
            self.input_buffer_fill = 0;
            self.output_buffer_pos = 0;
        }

        let output = self.output_buffer[self.output_buffer_pos];
        self.output_buffer_pos += 1;
        output
    }

    fn reset(&mut self) {
        self.input_buffer.fill(F::zero());
        self.output_buffer.fill(F::zero());
        self.overlap.fill(F::zero());
        self.input_buffer_fill = 0;
        self.output_buffer_pos = 0;
    }

    fn change_kernel(&mut self, kernel: &[F]) -> Result<(), ConvolverError> {
        if let Err(err) = self.block.set_kernel(kernel) {
            tracing::warn!(%err, "rejected kernel replacement");
            return Err(err);
        }
        tracing::trace!(kernel_len = kernel.len(), "overlap-add kernel replaced");
        Ok(())
    }

    fn kernel_len(&self) -> usize {
        self.block.kernel().len()
    }

    fn latency(&self) -> usize {
        self.hop_size() - 1
    }
}

// Tests
#[cfg(test)]
mod tests {
    use super::*;
    use crate::direct_filter::direct_convolve;
    use approx::assert_abs_diff_eq;

    #[test]
    fn init_test() {
        let convolver = OlaBlockConvolver::new(&[1.0f32, 0.0, -1.0], 8).unwrap();

        assert_eq!(convolver.fft_size(), 8);
        assert_eq!(convolver.hop_size(), 6);
        assert_eq!(convolver.kernel_len(), 3);
        assert_eq!(convolver.latency(), 5);
        assert_eq!(convolver.input_buffer.len(), 6);
        assert_eq!(convolver.output_buffer.len(), 6);
        assert_eq!(convolver.overlap.len(), 2);
        assert!(convolver.overlap.iter().all(|&x| x == 0.));
        assert_eq!(convolver.input_buffer_fill, 0);
        assert_eq!(convolver.output_buffer_pos, 0);
    }

    #[test]
    fn default_fft_size() {
        let convolver = OlaBlockConvolver::with_default_fft_size(&[0.1f64; 10]).unwrap();
        assert_eq!(convolver.fft_size(), 64);
        assert_eq!(convolver.hop_size(), 55);
    }

    #[test]
    fn rejects_bad_configuration() {
        assert!(matches!(
            OlaBlockConvolver::new(&[1.0f64; 9], 8),
            Err(ConvolverError::KernelTooLong { .. })
        ));
        assert!(matches!(
            OlaBlockConvolver::new(&[1.0f64; 3], 10),
            Err(ConvolverError::InvalidFftSize(10))
        ));
        assert!(matches!(
            OlaBlockConvolver::<f32>::new(&[], 8),
            Err(ConvolverError::EmptyKernel)
        ));
    }

    #[test]
    fn differencer_scenario() {
        let mut convolver = OlaBlockConvolver::new(&[1.0f64, 0.0, -1.0], 8).unwrap();
        let signal: Vec<f64> = (1..=10).map(f64::from).collect();
        let output = convolver.apply(&signal);

        let expected = [1., 2., 2., 2., 2., 2., 2., 2., 2., 2., -9., -10.];
        assert_eq!(output.len(), expected.len());
        for (o, e) in output.iter().zip(&expected) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-10);
        }
    }

    #[test]
    fn warm_up_outputs_are_zero() {
        let mut convolver = OlaBlockConvolver::new(&[1.0f32, 0.5], 8).unwrap();
        for _ in 0..convolver.latency() {
            assert_eq!(convolver.process(1.0), 0.0);
        }
        assert_abs_diff_eq!(convolver.process(1.0), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn kernel_as_long_as_block() {
        // hop size 1, the carry spans several blocks
        let kernel: Vec<f64> = (0..8).map(|i| 1.0 / (i as f64 + 1.0)).collect();
        let signal: Vec<f64> = (0..50).map(|i| (i as f64 * 0.21).cos()).collect();
        let mut convolver = OlaBlockConvolver::new(&kernel, 8).unwrap();
        assert_eq!(convolver.latency(), 0);

        let output = convolver.apply(&signal);
        let expected = direct_convolve(&signal, &kernel);
        assert_eq!(output.len(), expected.len());
        for (o, e) in output.iter().zip(&expected) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-10);
        }
    }

    #[test]
    fn short_signal_is_fully_drained() {
        let mut convolver = OlaBlockConvolver::new(&[0.5f64, 0.25, 0.125], 32).unwrap();
        let output = convolver.apply(&[2.0, 4.0]);
        let expected = direct_convolve(&[2.0, 4.0], &[0.5, 0.25, 0.125]);
        assert_eq!(output.len(), 4);
        for (o, e) in output.iter().zip(&expected) {
            assert_abs_diff_eq!(*o, *e, epsilon = 1e-12);
        }
    }

    #[test]
    fn process_slice_matches_process() {
        let kernel = [0.3f64, -0.2, 0.1, 0.05];
        let input: Vec<f64> = (0..40).map(|i| (i as f64 * 0.4).sin()).collect();

        let mut a = OlaBlockConvolver::new(&kernel, 16).unwrap();
        let mut b = OlaBlockConvolver::new(&kernel, 16).unwrap();
        let mut output = vec![0.0; input.len()];
        a.process_slice(&input, &mut output).unwrap();
        let expected: Vec<f64> = input.iter().map(|&x| b.process(x)).collect();
        assert_eq!(output, expected);

        let mut short = vec![0.0; 3];
        assert!(matches!(
            a.process_slice(&input, &mut short),
            Err(ConvolverError::BufferLengthMismatch {
                expected: 40,
                actual: 3
            })
        ));
    }

    #[test]
    fn reset_test() {
        let mut convolver = OlaBlockConvolver::new(&[1.0f64, 0.5, 0.25], 16).unwrap();
        for _ in 0..20 {
            convolver.process(1.0);
        }
        convolver.reset();

        assert!(convolver.overlap.iter().all(|&x| x == 0.0));
        assert!(convolver.output_buffer.iter().all(|&x| x == 0.0));
        assert_eq!(convolver.input_buffer_fill, 0);
        assert_eq!(convolver.output_buffer_pos, 0);
        assert_eq!(convolver.kernel(), &[1.0, 0.5, 0.25]);
    }

    #[test]
    fn change_kernel_at_block_boundary() {
        let signal: Vec<f64> = (1..=36).map(f64::from).collect();
        let mut convolver = OlaBlockConvolver::new(&[1.0, 0.0, 0.0], 8).unwrap();
        let latency = convolver.latency();

        let mut raw = Vec::new();
        for &x in &signal[..12] {
            raw.push(convolver.process(x));
        }
        convolver.change_kernel(&[0.0, 0.0, 1.0]).unwrap();
        for &x in &signal[12..] {
            raw.push(convolver.process(x));
        }
        for _ in 0..latency {
            raw.push(convolver.process(0.0));
        }
        let y = &raw[latency..];

        for k in 0..12 {
            assert_abs_diff_eq!(y[k], signal[k], epsilon = 1e-10);
        }
        // the first block after the swap only sees its own samples through the new kernel
        assert_abs_diff_eq!(y[12], 0.0, epsilon = 1e-10);
        assert_abs_diff_eq!(y[13], 0.0, epsilon = 1e-10);
        for k in 14..36 {
            assert_abs_diff_eq!(y[k], signal[k - 2], epsilon = 1e-10);
        }
    }

    #[test]
    fn change_kernel_rejects_other_length() {
        let mut convolver = OlaBlockConvolver::new(&[1.0f32, 0.5], 8).unwrap();
        assert!(matches!(
            convolver.change_kernel(&[1.0, 0.5, 0.25]),
            Err(ConvolverError::KernelLengthMismatch {
                expected: 2,
                actual: 3
            })
        ));
        assert_eq!(convolver.kernel(), &[1.0, 0.5]);
    }
}
