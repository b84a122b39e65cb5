use crate::Error;

/// Scratch space for raw interleaved SC16 Q11 I/Q samples.
///
/// Grows on demand and never shrinks. Capacity is counted in complex samples, i.e., pairs of
/// `i16`.
#[derive(Debug, Default)]
pub struct ConvBuffer {
    raw: Vec<i16>,
}

impl ConvBuffer {
    pub fn new() -> Self {
        Self { raw: Vec::new() }
    }

    /// Number of complex samples the buffer can hold without growing.
    pub fn capacity(&self) -> usize {
        self.raw.len() / 2
    }

    /// Make room for at least `samples` complex samples.
    ///
    /// Fails with [`Error::Alloc`] if the allocation cannot be satisfied.
    pub fn reserve(&mut self, samples: usize) -> Result<(), Error> {
        if samples <= self.capacity() {
            return Ok(());
        }
        let len = samples.checked_mul(2).ok_or(Error::Alloc(samples))?;
        self.raw
            .try_reserve_exact(len - self.raw.len())
            .or(Err(Error::Alloc(samples)))?;
        self.raw.resize(len, 0);
        log::debug!("conversion buffer grown to {samples} samples");
        Ok(())
    }

    /// Interleaved I/Q storage for the first `samples` complex samples.
    ///
    /// # Panics
    ///  * If `samples` exceeds the [capacity](ConvBuffer::capacity).
    pub fn samples_mut(&mut self, samples: usize) -> &mut [i16] {
        &mut self.raw[..2 * samples]
    }

    pub fn samples(&self, samples: usize) -> &[i16] {
        &self.raw[..2 * samples]
    }
}
