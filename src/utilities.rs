use num::Zero;
use rustfft::num_complex::Complex;
use rustfft::FftNum;

/// Number of non-redundant bins of a real transform of length `size`.
pub fn complex_size(size: usize) -> usize {
    (size / 2) + 1
}

/// Copies `src` to the front of `dst` and zeroes the rest.
pub fn copy_and_pad<T: Copy + Zero>(dst: &mut [T], src: &[T]) {
    assert!(dst.len() >= src.len());
    dst[..src.len()].copy_from_slice(src);
    dst[src.len()..].fill(T::zero());
}

/// Pointwise spectral product, `result[i] *= other[i]`.
pub fn complex_multiply<F: FftNum>(result: &mut [Complex<F>], other: &[Complex<F>]) {
    assert_eq!(result.len(), other.len());
    for (r, o) in result.iter_mut().zip(other) {
        let re = r.re * o.re - r.im * o.im;
        let im = r.re * o.im + r.im * o.re;
        r.re = re;
        r.im = im;
    }
}

/// Adds `src` onto `dst` sample by sample.
pub fn add_assign<F: FftNum>(dst: &mut [F], src: &[F]) {
    assert_eq!(dst.len(), src.len());
    for (d, s) in dst.iter_mut().zip(src) {
        *d = *d + *s;
    }
}

/// Smallest power of two that is `>= value`, but at least 2.
pub fn transform_size_for(value: usize) -> usize {
    value.max(2).next_power_of_two()
}
