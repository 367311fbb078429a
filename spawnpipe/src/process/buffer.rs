//! Capture buffer with a guaranteed amount of free space.

/// Contiguous bytes plus a used-length counter.
///
/// The backing vector is kept initialised up to its full length, so the
/// free region can be handed to `read` as a plain `&mut [u8]`.
#[derive(Debug)]
pub struct GrowableBuffer {
    data: Vec<u8>,
    used: usize,
    min_slack: usize,
}

impl GrowableBuffer {
    /// Empty buffer that already has `min_slack` bytes of room.
    pub fn with_slack(min_slack: usize) -> Self {
        let min_slack = min_slack.max(1);
        Self {
            data: vec![0; min_slack],
            used: 0,
            min_slack,
        }
    }

    /// Bytes captured so far.
    pub const fn len(&self) -> usize {
        self.used
    }

    pub const fn is_empty(&self) -> bool {
        self.used == 0
    }

    /// Free bytes available to the next read.
    pub fn slack(&self) -> usize {
        self.data.len() - self.used
    }

    /// The captured bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data[..self.used]
    }

    /// Free region; at least `min_slack` bytes long.
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.used..]
    }

    /// Record `n` freshly written bytes at the start of the free region,
    /// then grow back to the minimum slack if needed.
    ///
    /// # Panics
    ///
    /// If `n` exceeds the current slack.
    pub fn advance(&mut self, n: usize) {
        assert!(n <= self.slack(), "advance past end of buffer");
        self.used += n;
        self.ensure_slack();
    }

    /// Grow to exactly `used + min_slack` when the slack has dropped below
    /// the minimum. `Vec` amortises the reallocations.
    pub fn ensure_slack(&mut self) {
        if self.slack() < self.min_slack {
            self.data.resize(self.used + self.min_slack, 0);
        }
    }

    /// Freeze into the captured bytes.
    pub fn into_bytes(mut self) -> Vec<u8> {
        self.data.truncate(self.used);
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_buffer_has_slack() {
        let mut buf = GrowableBuffer::with_slack(4096);
        assert!(buf.is_empty());
        assert_eq!(buf.slack(), 4096);
        assert_eq!(buf.spare_mut().len(), 4096);
    }

    #[test]
    fn test_zero_slack_is_raised() {
        let buf = GrowableBuffer::with_slack(0);
        assert_eq!(buf.slack(), 1);
    }

    #[test]
    fn test_advance_keeps_slack_invariant() {
        let mut buf = GrowableBuffer::with_slack(16);
        for step in [1, 15, 16, 3, 16, 7] {
            buf.spare_mut()[..step].fill(b'x');
            buf.advance(step);
            assert!(buf.slack() >= 16, "slack dropped after writing {step}");
        }
        assert_eq!(buf.len(), 58);
    }

    #[test]
    fn test_growth_is_used_plus_slack() {
        let mut buf = GrowableBuffer::with_slack(8);
        buf.spare_mut()[..5].copy_from_slice(b"hello");
        buf.advance(5);
        assert_eq!(buf.slack(), 8);
        assert_eq!(buf.data.len(), 13);
    }

    #[test]
    fn test_no_growth_while_slack_suffices() {
        let mut buf = GrowableBuffer::with_slack(8);
        buf.ensure_slack();
        assert_eq!(buf.data.len(), 8);
        buf.advance(0);
        assert_eq!(buf.data.len(), 8);
    }

    #[test]
    fn test_into_bytes_drops_slack() {
        let mut buf = GrowableBuffer::with_slack(4);
        buf.spare_mut()[..3].copy_from_slice(b"abc");
        buf.advance(3);
        buf.spare_mut()[..4].copy_from_slice(b"defg");
        buf.advance(4);
        assert_eq!(buf.as_bytes(), b"abcdefg");
        assert_eq!(buf.into_bytes(), b"abcdefg".to_vec());
    }

    #[test]
    #[should_panic(expected = "advance past end")]
    fn test_advance_past_slack_panics() {
        let mut buf = GrowableBuffer::with_slack(4);
        buf.advance(5);
    }
}
