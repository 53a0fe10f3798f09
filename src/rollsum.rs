/// Weak rolling checksum of a byte window.
///
/// Keeps two 16-bit sums `a` (plain sum of bytes) and `b` (sum weighted by
/// the distance to the end of the window), plus the window length. All
/// arithmetic wraps modulo 2^16, so windows longer than 65535 bytes wrap
/// the length counter.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct RollingChecksum {
    a: u16,
    b: u16,
    count: u16,
}

impl RollingChecksum {
    /// Create an empty checksum.
    pub fn new() -> Self {
        RollingChecksum::default()
    }

    /// Checksum of `window`, computed from scratch.
    pub fn of(window: &[u8]) -> u32 {
        let mut sum = RollingChecksum::new();
        sum.init(window);
        sum.sum()
    }

    /// Reset and compute the checksum of `window`.
    pub fn init(&mut self, window: &[u8]) {
        self.reset();
        self.count = window.len() as u16;
        for (i, &x) in window.iter().enumerate() {
            let x = u16::from(x);
            self.a = self.a.wrapping_add(x);
            self.b = self
                .b
                .wrapping_add(self.count.wrapping_sub(i as u16).wrapping_mul(x));
        }
    }

    /// Clear all counters.
    pub fn reset(&mut self) {
        *self = RollingChecksum::default();
    }

    /// Slide the window by one byte: `outgoing` leaves the front, `incoming`
    /// enters at the back. The window length is unchanged.
    #[inline]
    pub fn roll(&mut self, outgoing: u8, incoming: u8) {
        let outgoing = u16::from(outgoing);
        let incoming = u16::from(incoming);
        self.a = self.a.wrapping_add(incoming).wrapping_sub(outgoing);
        self.b = self
            .b
            .wrapping_add(self.a)
            .wrapping_sub(self.count.wrapping_mul(outgoing));
    }

    /// The 32-bit checksum `(b << 16) | a`.
    #[inline]
    pub fn sum(&self) -> u32 {
        (u32::from(self.b) << 16) | u32::from(self.a)
    }

    /// Current window length.
    pub fn count(&self) -> u16 {
        self.count
    }
}
