use rustfft::FftNum;

use crate::error::ConvolverError;
use crate::filter::StreamingFilter;

/// FIR filter using direct convolution over a circular delay line.
///
/// Costs one multiply-accumulate per tap per sample and has no latency, which
/// makes it the cheaper choice for short kernels.
#[derive(Debug, Clone)]
pub struct DirectFilter<F: FftNum> {
    kernel: Vec<F>,
    /// Most recent `kernel.len()` input samples
    delay_line: Vec<F>,
    /// Slot holding the newest sample
    delay_idx: usize,
}

pub type DirectFilter32 = DirectFilter<f32>;
pub type DirectFilter64 = DirectFilter<f64>;

impl<F: FftNum> DirectFilter<F> {
    pub fn new(kernel: &[F]) -> Result<Self, ConvolverError> {
        if kernel.is_empty() {
            return Err(ConvolverError::EmptyKernel);
        }
        Ok(Self {
            kernel: kernel.to_vec(),
            delay_line: vec![F::zero(); kernel.len()],
            delay_idx: 0,
        })
    }

    pub fn kernel(&self) -> &[F] {
        &self.kernel
    }
}

impl<F: FftNum> StreamingFilter<F> for DirectFilter<F> {
    fn process(&mut self, sample: F) -> F {
        let idx = self.delay_idx;
        self.delay_line[idx] = sample;

        // kernel[k] pairs with the sample k steps back: walk the delay line
        // backwards from idx, wrapping once at the start.
        let (head, tail) = self.kernel.split_at(idx + 1);
        let mut acc = F::zero();
        for (h, x) in head.iter().zip(self.delay_line[..=idx].iter().rev()) {
            acc = acc + *h * *x;
        }
        for (h, x) in tail.iter().zip(self.delay_line[idx + 1..].iter().rev()) {
            acc = acc + *h * *x;
        }

        self.delay_idx = (idx + 1) % self.kernel.len();
        acc
    }

    fn reset(&mut self) {
        self.delay_line.fill(F::zero());
        self.delay_idx = 0;
    }

    fn change_kernel(&mut self, kernel: &[F]) -> Result<(), ConvolverError> {
        if kernel.len() != self.kernel.len() {
            tracing::warn!(
                expected = self.kernel.len(),
                actual = kernel.len(),
                "rejected kernel replacement"
            );
            return Err(ConvolverError::KernelLengthMismatch {
                expected: self.kernel.len(),
                actual: kernel.len(),
            });
        }
        self.kernel.copy_from_slice(kernel);
        tracing::trace!(kernel_len = kernel.len(), "direct filter kernel replaced");
        Ok(())
    }

    fn kernel_len(&self) -> usize {
        self.kernel.len()
    }

    fn latency(&self) -> usize {
        0
    }
}

/// Direct (time-domain) linear convolution, `signal.len() + kernel.len() - 1` samples.
///
/// Returns an empty vector if either operand is empty.
pub fn direct_convolve<F: FftNum>(signal: &[F], kernel: &[F]) -> Vec<F> {
    if signal.is_empty() || kernel.is_empty() {
        return Vec::new();
    }
    let mut output = vec![F::zero(); signal.len() + kernel.len() - 1];
    for (i, &s) in signal.iter().enumerate() {
        if s.is_zero() {
            continue;
        }
        for (j, &h) in kernel.iter().enumerate() {
            output[i + j] = output[i + j] + s * h;
        }
    }
    output
}
