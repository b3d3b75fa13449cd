use data::source::*;

/// Minimises a failing choice sequence by editing its bytes and re-running
/// the predicate on each candidate.
///
/// `run` re-executes the predicate over a candidate sequence and returns the
/// rewound sequence (with the intervals that run recorded) when the failure
/// still reproduces, or `None` when it does not — including when the
/// candidate overruns. A candidate is adopted only on reproduction, so every
/// intermediate state of the minimiser is itself a counterexample.
///
/// The passes run once, in a fixed order, each looping until a whole scan of
/// its dimension adopts nothing. Later passes can in principle unlock
/// earlier ones again; we do not go back for those. The `budget` counts
/// predicate runs, successful or not, and stops everything when spent.
pub struct Shrinker<F> {
    best: ChoiceSequence,
    budget: usize,
    run: F,
}

impl<F> Shrinker<F>
where
    F: FnMut(ChoiceSequence) -> Option<ChoiceSequence>,
{
    /// `seed` must already be rewound and known to reproduce the failure.
    pub fn new(seed: ChoiceSequence, budget: usize, run: F) -> Self {
        Shrinker {
            best: seed,
            budget: budget,
            run: run,
        }
    }

    /// Runs the full pass pipeline and returns the smallest reproducing
    /// sequence found.
    pub fn minimize(mut self) -> ChoiceSequence {
        debug!("shrinking {:?} within {} runs", self.best, self.budget);
        self.interval_pass("zero-interval", zero_span);
        self.byte_pass();
        self.swap_pass();
        self.interval_pass("shift-right", shift_span_right);
        self.interval_pass("subtract-10", |span| subtract_from_span(span, 10));
        self.interval_pass("subtract-1", |span| subtract_from_span(span, 1));
        debug!("shrunk to {:?} ({} runs unused)", self.best, self.budget);
        self.best
    }

    fn spent(&self) -> bool {
        self.budget == 0
    }

    /// Runs one candidate; adopts it when the failure reproduces.
    fn attempt(&mut self, candidate: ChoiceSequence) -> bool {
        self.budget -= 1;
        trace!("candidate {:?}; {} runs left", candidate, self.budget);
        match (self.run)(candidate) {
            Some(better) => {
                debug!("adopted {:?}", better);
                self.best = better;
                true
            }
            None => false,
        }
    }

    /// Walks the recorded intervals, proposing a replacement span for each,
    /// until a full scan changes nothing.
    fn interval_pass<P>(&mut self, name: &str, propose: P)
    where
        P: Fn(&[u8]) -> Option<Vec<u8>>,
    {
        trace!("pass: {}", name);
        loop {
            let mut changed = false;
            let mut i = 0;
            while i < self.best.intervals().len() {
                if self.spent() {
                    return;
                }
                let proposal = {
                    let (start, end) = self.best.intervals()[i];
                    propose(&self.best.buffer()[start..end])
                        .map(|bytes| ((start, end), bytes))
                };
                if let Some((span, bytes)) = proposal {
                    if self.attempt(self.best.replaced(span, bytes)) {
                        changed = true;
                    }
                }
                i += 1;
            }
            if !changed {
                return;
            }
        }
    }

    /// Tries to zero each byte individually. Catches reductions that span
    /// interval boundaries or that the interval record missed.
    fn byte_pass(&mut self) {
        trace!("pass: zero-byte");
        loop {
            let mut changed = false;
            let mut i = 0;
            while i < self.best.len() {
                if self.spent() {
                    return;
                }
                if self.best.buffer()[i] != 0 {
                    if self.attempt(self.best.set_byte(i, 0)) {
                        changed = true;
                    }
                }
                i += 1;
            }
            if !changed {
                return;
            }
        }
    }

    /// For each pair of equal-length intervals whose later bytes compare
    /// lexicographically below the earlier ones, tries the swap. This
    /// normalises the order of drawn values so the smaller one comes first.
    fn swap_pass(&mut self) {
        trace!("pass: swap-intervals");
        loop {
            let mut changed = false;
            let mut i = 0;
            while i < self.best.intervals().len() {
                let mut j = i + 1;
                while j < self.best.intervals().len() {
                    if self.spent() {
                        return;
                    }
                    let (a, b) = (self.best.intervals()[i], self.best.intervals()[j]);
                    let worth_swapping = a.1 - a.0 == b.1 - b.0 && {
                        let buf = self.best.buffer();
                        buf[b.0..b.1] < buf[a.0..a.1]
                    };
                    if worth_swapping {
                        if self.attempt(self.best.swapped(a, b)) {
                            changed = true;
                        }
                    }
                    j += 1;
                }
                i += 1;
            }
            if !changed {
                return;
            }
        }
    }
}

/// All-zero replacement, or `None` if the span already is.
fn zero_span(span: &[u8]) -> Option<Vec<u8>> {
    if span.iter().all(|&b| b == 0) {
        None
    } else {
        Some(vec![0; span.len()])
    }
}

/// The span read as a big-endian integer, shifted right one bit.
fn shift_span_right(span: &[u8]) -> Option<Vec<u8>> {
    if span.iter().all(|&b| b == 0) {
        return None;
    }
    let mut out = Vec::with_capacity(span.len());
    let mut carry = 0u8;
    for &b in span {
        out.push((b >> 1) | (carry << 7));
        carry = b & 1;
    }
    Some(out)
}

/// Big-endian subtraction with borrow, saturating short of zero: a span
/// whose value would not stay positive is left to the zero pass.
fn subtract_from_span(span: &[u8], amount: u8) -> Option<Vec<u8>> {
    let last = span.len() - 1;
    if span[..last].iter().all(|&b| b == 0) && span[last] <= amount {
        return None;
    }
    let mut out = span.to_vec();
    if out[last] >= amount {
        out[last] -= amount;
    } else {
        let borrow = out[..last]
            .iter()
            .rposition(|&b| b > 0)
            .expect("a nonzero byte to borrow from");
        out[borrow] -= 1;
        for b in &mut out[borrow + 1..last] {
            *b = 0xff;
        }
        out[last] = out[last].wrapping_sub(amount);
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    extern crate env_logger;
    use super::*;
    use data::source::*;

    /// Re-runs `check` over the candidate's bytes the way the runner would:
    /// reproducing candidates come back rewound with fresh intervals.
    fn reproducer<C>(check: C) -> impl FnMut(ChoiceSequence) -> Option<ChoiceSequence>
    where
        C: Fn(&mut ChoiceSequence) -> Maybe<bool>,
    {
        move |candidate: ChoiceSequence| {
            let mut sequence = candidate.cleared();
            match check(&mut sequence) {
                Ok(true) => Some(sequence.rewind()),
                _ => None,
            }
        }
    }

    fn seeded<C>(bytes: Vec<u8>, check: &C) -> ChoiceSequence
    where
        C: Fn(&mut ChoiceSequence) -> Maybe<bool>,
    {
        let mut sequence = ChoiceSequence::of_vec(bytes);
        assert_eq!(check(&mut sequence), Ok(true), "seed must reproduce");
        sequence.rewind()
    }

    #[test]
    fn zeroes_everything_under_an_indifferent_predicate() {
        let check = |s: &mut ChoiceSequence| {
            s.draw(2)?;
            Ok(true)
        };
        let seed = seeded(vec![0xab, 0xcd], &check);
        let min = Shrinker::new(seed, 200, reproducer(check)).minimize();
        assert_eq!(min.buffer(), &[0, 0]);
    }

    #[test]
    fn a_zero_budget_returns_the_seed_unchanged() {
        let check = |s: &mut ChoiceSequence| {
            s.draw(2)?;
            Ok(true)
        };
        let seed = seeded(vec![0xab, 0xcd], &check);
        let min = Shrinker::new(seed, 0, reproducer(check)).minimize();
        assert_eq!(min.buffer(), &[0xab, 0xcd]);
    }

    #[test]
    fn finds_the_smallest_byte_satisfying_a_threshold() {
        env_logger::init().unwrap_or(());
        let check = |s: &mut ChoiceSequence| Ok(s.draw_u8()? >= 13);
        let seed = seeded(vec![0xff], &check);
        let min = Shrinker::new(seed, 200, reproducer(check)).minimize();
        assert_eq!(min.buffer(), &[13]);
    }

    #[test]
    fn swaps_a_larger_draw_in_front_of_a_smaller_one() {
        let check = |s: &mut ChoiceSequence| {
            let a = s.draw_u8()?;
            let b = s.draw_u8()?;
            Ok(a == 7 || b == 7)
        };
        let seed = seeded(vec![7, 0], &check);
        let min = Shrinker::new(seed, 200, reproducer(check)).minimize();
        assert_eq!(min.buffer(), &[0, 7]);
    }

    #[test]
    fn subtraction_borrows_across_byte_boundaries() {
        let check = |s: &mut ChoiceSequence| {
            let bytes = s.draw(2)?;
            let value = ((bytes[0] as u16) << 8) | bytes[1] as u16;
            Ok(value >= 250)
        };
        // 0x012c is 300; the minimum lives below the byte boundary.
        let seed = seeded(vec![0x01, 0x2c], &check);
        let min = Shrinker::new(seed, 200, reproducer(check)).minimize();
        assert_eq!(min.buffer(), &[0, 250]);
    }

    #[test]
    fn shift_right_halves_an_interval_quickly() {
        let check = |s: &mut ChoiceSequence| {
            let bytes = s.draw(2)?;
            let value = ((bytes[0] as u16) << 8) | bytes[1] as u16;
            Ok(value >= 1)
        };
        let seed = seeded(vec![0xff, 0xff], &check);
        // Too few runs to count down from 65535, plenty to halve there.
        let min = Shrinker::new(seed, 60, reproducer(check)).minimize();
        assert_eq!(min.buffer(), &[0, 1]);
    }

    #[test]
    fn an_overrunning_candidate_is_never_adopted() {
        // Shrinking the first byte to zero sends the predicate down a
        // branch that wants more data than the sequence holds.
        let check = |s: &mut ChoiceSequence| {
            let a = s.draw_u8()?;
            if a == 0 {
                let extra = s.draw(2)?;
                Ok(extra.iter().any(|&b| b > 0))
            } else {
                Ok(a >= 16)
            }
        };
        let seed = seeded(vec![0x10], &check);
        let min = Shrinker::new(seed, 200, reproducer(check)).minimize();
        assert_eq!(min.buffer(), &[0x10]);
    }

    #[test]
    fn subtract_never_produces_an_all_zero_span() {
        assert_eq!(subtract_from_span(&[0, 5], 10), None);
        assert_eq!(subtract_from_span(&[0, 10], 10), None);
        assert_eq!(subtract_from_span(&[0, 11], 10), Some(vec![0, 1]));
        assert_eq!(subtract_from_span(&[1, 0], 10), Some(vec![0, 246]));
    }

    #[test]
    fn shift_right_carries_into_the_next_byte() {
        assert_eq!(shift_span_right(&[1, 0]), Some(vec![0, 0x80]));
        assert_eq!(shift_span_right(&[0, 0]), None);
    }
}
