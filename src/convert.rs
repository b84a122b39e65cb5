//! Sample format conversion.
//!
//! The bladeRF delivers SC16 Q11 samples: interleaved I/Q pairs of 16-bit integers carrying
//! 12-bit values with 11 fractional bits, so full scale is ±2048.
use fixed::types::I5F11;
use num_complex::Complex32;

/// Full-scale value of an SC16 Q11 sample.
pub const SC16_Q11_SCALE: f32 = 2048.0;

/// Convert a single SC16 Q11 value to floating point.
#[inline]
pub fn sc16_q11_to_f32(v: i16) -> f32 {
    I5F11::from_bits(v).to_num::<f32>()
}

/// Convert interleaved SC16 Q11 I/Q pairs into complex floats.
///
/// # Panics
///  * If `input` does not hold exactly two values per output sample.
pub fn sc16_q11_to_cf32(input: &[i16], output: &mut [Complex32]) {
    assert_eq!(input.len(), 2 * output.len());
    for (o, iq) in output.iter_mut().zip(input.chunks_exact(2)) {
        *o = Complex32::new(sc16_q11_to_f32(iq[0]), sc16_q11_to_f32(iq[1]));
    }
}
