use std::fmt;
use hex_slice::AsHex;
use rand::random;

/// Upper bound on how far a sequence may grow while generating. Hitting it
/// aborts the run as invalid rather than looping forever on a predicate
/// that never stops drawing.
pub const MAX_SEQUENCE_BYTES: usize = 64 * 1024;

/// The reasons why drawing data from a sequence can stop a run early.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum DataError {
    /// A read past the end of a fixed byte sequence.
    Overrun,
    /// One of our combinators said that we should not test this value.
    SkipItem,
}

pub type Maybe<T> = Result<T, DataError>;

/// The byte buffer that all generated data is drawn from, together with a
/// read cursor and one recorded `(start, end)` interval per draw.
///
/// A freshly created sequence grows on demand with random bytes; a sequence
/// built over a fixed buffer signals [`Overrun`](enum.DataError.html) when a
/// draw would pass the end. Generators only ever read; the shrinker edits
/// bytes through the copying operations below and re-runs the predicate.
#[derive(Clone, PartialEq, Eq)]
pub struct ChoiceSequence {
    data: Vec<u8>,
    cursor: usize,
    intervals: Vec<(usize, usize)>,
    grow: bool,
}

impl fmt::Debug for ChoiceSequence {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.debug_struct("ChoiceSequence")
            .field("data", &format_args!("{:x}", self.data.as_hex()))
            .field("cursor", &self.cursor)
            .field("intervals", &self.intervals)
            .finish()
    }
}

impl ChoiceSequence {
    /// Create an empty sequence that replenishes itself with random bytes
    /// as draws demand them.
    pub fn fresh() -> Self {
        ChoiceSequence {
            data: Vec::new(),
            cursor: 0,
            intervals: Vec::new(),
            grow: true,
        }
    }

    /// Create a sequence over a fixed buffer. Draws past the end overrun.
    pub fn of_vec(data: Vec<u8>) -> Self {
        ChoiceSequence {
            data: data,
            cursor: 0,
            intervals: Vec::new(),
            grow: false,
        }
    }

    /// Read `n` bytes at the cursor, record one interval covering them, and
    /// advance. A growing sequence extends itself with uniform random bytes
    /// first; a fixed one fails with `Overrun`.
    pub fn draw(&mut self, n: usize) -> Maybe<Vec<u8>> {
        if n == 0 {
            return Ok(Vec::new());
        }
        let start = self.cursor;
        let end = start + n;
        if end > self.data.len() {
            if !self.grow || end > MAX_SEQUENCE_BYTES {
                trace!("overrun: {}..{} of {}", start, end, self.data.len());
                return Err(DataError::Overrun);
            }
            while self.data.len() < end {
                self.data.push(random());
            }
        }
        let bytes = self.data[start..end].to_vec();
        self.cursor = end;
        self.intervals.push((start, end));
        Ok(bytes)
    }

    /// Single-byte convenience form of [`draw`](#method.draw).
    pub fn draw_u8(&mut self) -> Maybe<u8> {
        self.draw(1).map(|bytes| bytes[0])
    }

    /// A copy truncated to the consumed prefix, cursor back at the start,
    /// with the intervals the run recorded. This is the shape we keep a
    /// counterexample in between predicate runs.
    pub fn rewind(&self) -> ChoiceSequence {
        ChoiceSequence {
            data: self.data[..self.cursor].to_vec(),
            cursor: 0,
            intervals: self.intervals.clone(),
            grow: false,
        }
    }

    /// A copy with the interval record emptied, ready for a re-run to record
    /// its own draws.
    pub fn cleared(&self) -> ChoiceSequence {
        ChoiceSequence {
            data: self.data.clone(),
            cursor: self.cursor,
            intervals: Vec::new(),
            grow: self.grow,
        }
    }

    /// A copy with the byte at `i` replaced by `val`.
    pub fn set_byte(&self, i: usize, val: u8) -> ChoiceSequence {
        let mut copy = self.clone();
        copy.data[i] = val;
        copy
    }

    /// A copy with the bytes of `span` replaced by `bytes` (same length).
    pub fn replaced(&self, span: (usize, usize), bytes: Vec<u8>) -> ChoiceSequence {
        let (start, end) = span;
        debug_assert_eq!(end - start, bytes.len());
        let mut copy = self.clone();
        copy.data[start..end].copy_from_slice(&bytes);
        copy
    }

    /// A copy with the bytes of two equal-length, non-overlapping spans
    /// exchanged.
    pub fn swapped(&self, a: (usize, usize), b: (usize, usize)) -> ChoiceSequence {
        debug_assert_eq!(a.1 - a.0, b.1 - b.0);
        let mut copy = self.clone();
        for off in 0..(a.1 - a.0) {
            copy.data.swap(a.0 + off, b.0 + off);
        }
        copy
    }

    /// Allows access to the underlying buffer.
    pub fn buffer(&self) -> &[u8] {
        &*self.data
    }

    /// The intervals recorded by draws so far, in draw order.
    pub fn intervals(&self) -> &[(usize, usize)] {
        &*self.intervals
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// How many bytes the current run has consumed.
    pub fn consumed(&self) -> usize {
        self.cursor
    }
}
