//! Sample-at-a-time filtering interface shared by every convolution strategy.
//!
//! ```text
//! StreamingFilter
//!    ├── DirectFilter        (delay line, zero latency)
//!    ├── OlaBlockConvolver   (overlap-add, latency H - 1)
//!    ├── OlsBlockConvolver   (overlap-save, latency H - 1)
//!    └── AdaptiveFilter      (one of the above, picked by kernel length)
//! ```

use rustfft::FftNum;

use crate::error::ConvolverError;

/// A stateful FIR filter that consumes and produces one sample at a time.
///
/// Block based implementations delay their output by [`StreamingFilter::latency`]
/// samples; the first `latency()` calls to [`StreamingFilter::process`] after a
/// reset return zeros.
pub trait StreamingFilter<F: FftNum> {
    /// Filters one sample.
    fn process(&mut self, sample: F) -> F;

    /// Filters `input` into `output` sample by sample.
    fn process_slice(&mut self, input: &[F], output: &mut [F]) -> Result<(), ConvolverError> {
        if input.len() != output.len() {
            return Err(ConvolverError::BufferLengthMismatch {
                expected: input.len(),
                actual: output.len(),
            });
        }
        for (x, y) in input.iter().zip(output.iter_mut()) {
            *y = self.process(*x);
        }
        Ok(())
    }

    /// Full linear convolution of `signal` with the kernel.
    ///
    /// Starts from a clean state, drains the tail with zeros and drops the
    /// warm-up samples, so the result has exactly `signal.len() + kernel_len() - 1`
    /// samples. An empty signal gives an empty result.
    fn apply(&mut self, signal: &[F]) -> Vec<F> {
        self.reset();
        if signal.is_empty() {
            return Vec::new();
        }

        let latency = self.latency();
        let len = signal.len() + self.kernel_len() - 1;
        let mut output = Vec::with_capacity(len);
        let padded = signal
            .iter()
            .copied()
            .chain(std::iter::repeat(F::zero()))
            .take(len + latency);
        for (n, sample) in padded.enumerate() {
            let filtered = self.process(sample);
            if n >= latency {
                output.push(filtered);
            }
        }
        output
    }

    /// Clears delay lines, carry buffers and cursors. The kernel is kept.
    fn reset(&mut self);

    /// Swaps in a kernel of the same length.
    ///
    /// A kernel of a different length is rejected with
    /// [`ConvolverError::KernelLengthMismatch`] and the filter is left as it was.
    fn change_kernel(&mut self, kernel: &[F]) -> Result<(), ConvolverError>;

    fn kernel_len(&self) -> usize;

    /// Number of leading warm-up samples produced before real output.
    fn latency(&self) -> usize;
}
