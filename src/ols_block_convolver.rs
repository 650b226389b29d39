use realfft::FftError;
use rustfft::FftNum;

use crate::error::ConvolverError;
use crate::filter::StreamingFilter;
use crate::spectral_block::SpectralBlock;
use crate::utilities::transform_size_for;

/// OlsBlockConvolver
/// Streaming FFT convolution using the overlap-save method.
///
/// Every block transforms a full `fft_size` window made of the last
/// `kernel_len - 1` input samples of the previous block followed by
/// `hop_size` new samples. The first `kernel_len - 1` samples of the circular
/// result are wrapped around and discarded; the remaining `hop_size` samples
/// are valid linear convolution output. No overlap needs to be added.
///
/// Like [`crate::OlaBlockConvolver`], output is delayed by `hop_size - 1`
/// samples and processing does not allocate.
#[derive(Debug, Clone)]
pub struct OlsBlockConvolver<F: FftNum> {
    block: SpectralBlock<F>,
    /// `kernel_len - 1` carried input samples followed by `hop_size` new ones
    window: Vec<F>,
    input_buffer_fill: usize,
    /// Valid output starts at `kernel_len - 1`
    output_buffer: Vec<F>,
    output_buffer_pos: usize,
}

pub type OlsBlockConvolver32 = OlsBlockConvolver<f32>;
pub type OlsBlockConvolver64 = OlsBlockConvolver<f64>;

impl<F: FftNum> OlsBlockConvolver<F> {
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
        tracing::debug!(
            fft_size,
            hop_size = block.hop_size(),
            kernel_len = kernel.len(),
            "created overlap-save convolver"
        );

        Ok(Self {
            block,
            window: vec![F::zero(); fft_size],
            input_buffer_fill: 0,
            output_buffer: vec![F::zero(); fft_size],
            output_buffer_pos: kernel.len() - 1,
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
        self.block.hop_size()
    }

    pub fn kernel(&self) -> &[F] {
        self.block.kernel()
    }

    fn overlap_len(&self) -> usize {
        self.block.kernel().len() - 1
    }

    fn process_frame(&mut self) -> Result<(), FftError> {
        let overlap_len = self.overlap_len();
        let hop_size = self.hop_size();
        let transformed = self.block.convolve(&self.window);

        // the newest overlap_len inputs lead the next window, even if this one failed
        self.window.copy_within(hop_size.., 0);
        transformed?;

        // the first overlap_len samples are aliased
        self.output_buffer[overlap_len..].copy_from_slice(&self.block.result()[overlap_len..]);
        Ok(())
    }
}

impl<F: FftNum> StreamingFilter<F> for OlsBlockConvolver<F> {
    fn process(&mut self, sample: F) -> F {
        let overlap_len = self.overlap_len();
        self.window[overlap_len + self.input_buffer_fill] = sample;
        self.input_buffer_fill += 1;

        if self.input_buffer_fill == self.hop_size() {
            if let Err(err) = self.process_frame() {
                tracing::error!(%err, "overlap-save block transform failed");
                self.output_buffer.fill(F::zero());
            }
            self.input_buffer_fill = 0;
            self.output_buffer_pos = overlap_len;
        }

        let output = self.output_buffer[self.output_buffer_pos];
        self.output_buffer_pos += 1;
        output
    }

    fn reset(&mut self) {
        self.window.fill(F::zero());
        self.output_buffer.fill(F::zero());
        self.input_buffer_fill = 0;
        self.output_buffer_pos = self.overlap_len();
    }

    fn change_kernel(&mut self, kernel: &[F]) -> Result<(), ConvolverError> {
        if let Err(err) = self.block.set_kernel(kernel) {
            tracing::warn!(%err, "rejected kernel replacement");
            return Err(err);
        }
        tracing::trace!(kernel_len = kernel.len(), "overlap-save kernel replaced");
        Ok(())
    }

    fn kernel_len(&self) -> usize {
        self.block.kernel().len()
    }

    fn latency(&self) -> usize {
        self.hop_size() - 1
    }
}
