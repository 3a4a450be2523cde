/// The per-connection outbound buffer from spec §3: `sent_offset <=
/// length <= capacity`. Grows by doubling from an initial 4096 bytes
/// rather than relying on `Vec`'s own growth factor, so the capacity
/// story matches spec §4.4 exactly.
pub struct OutBuffer {
    buf: Vec<u8>,
    sent_offset: usize,
}

impl OutBuffer {
    pub fn new() -> Self {
        Self { buf: Vec::new(), sent_offset: 0 }
    }

    pub fn is_empty(&self) -> bool {
        self.sent_offset >= self.buf.len()
    }

    pub fn len(&self) -> usize {
        self.buf.len() - self.sent_offset
    }

    pub fn capacity(&self) -> usize {
        self.buf.capacity()
    }

    pub fn append(&mut self, bytes: &[u8]) {
        if bytes.is_empty() {
            return;
        }
        let needed = self.buf.len() + bytes.len();
        if needed > self.buf.capacity() {
            let mut target = self.buf.capacity().max(crate::prelude::OUTBOUND_BUFFER_INITIAL);
            while target < needed {
                target *= 2;
            }
            self.buf.reserve(target - self.buf.len());
        }
        self.buf.extend_from_slice(bytes);
    }

    pub fn pending(&self) -> &[u8] {
        &self.buf[self.sent_offset..]
    }

    /// Advances `sent_offset` by `n` bytes sent; once fully drained,
    /// resets both offset and length to 0 so the next `append` starts
    /// fresh rather than growing the buffer unboundedly.
    pub fn advance(&mut self, n: usize) {
        self.sent_offset += n;
        if self.sent_offset >= self.buf.len() {
            self.buf.clear();
            self.sent_offset = 0;
        }
    }
}

impl Default for OutBuffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prelude::OUTBOUND_BUFFER_INITIAL;

    #[test]
    fn first_append_grows_to_the_initial_capacity() {
        let mut buf = OutBuffer::new();
        buf.append(b"hello");
        assert!(buf.capacity() >= OUTBOUND_BUFFER_INITIAL);
        assert_eq!(buf.len(), 5);
    }

    #[test]
    fn capacity_doubles_rather_than_growing_linearly() {
        let mut buf = OutBuffer::new();
        let chunk = vec![b'x'; OUTBOUND_BUFFER_INITIAL];
        buf.append(&chunk);
        let first_cap = buf.capacity();
        buf.append(&chunk);
        assert!(buf.capacity() >= first_cap * 2 || buf.capacity() > OUTBOUND_BUFFER_INITIAL);
    }

    #[test]
    fn advance_drains_and_resets_once_fully_sent() {
        let mut buf = OutBuffer::new();
        buf.append(b"abcdef");
        buf.advance(3);
        assert_eq!(buf.pending(), b"def");
        assert!(!buf.is_empty());

        buf.advance(3);
        assert!(buf.is_empty());
        assert_eq!(buf.len(), 0);
    }

    #[test]
    fn appends_after_a_full_drain_start_fresh() {
        let mut buf = OutBuffer::new();
        buf.append(b"first");
        buf.advance(5);
        assert!(buf.is_empty());

        buf.append(b"second");
        assert_eq!(buf.pending(), b"second");
    }
}
