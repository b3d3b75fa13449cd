use std::any::Any;
use std::fmt;
use std::panic;

use data::*;
use generators::*;

/// Invalid runs (filtered values, overruns) do not count toward the example
/// budget, but we stop rather than spin forever on a predicate that skips
/// nearly everything.
const SKIP_MULTIPLIER: usize = 10;

/// The work bounds for one property check: how many fresh inputs the search
/// tries, and how many predicate runs the shrinker may spend afterwards.
#[derive(Debug, Clone)]
pub struct CheckConfig {
    max_examples: usize,
    max_shrinks: usize,
}

impl Default for CheckConfig {
    fn default() -> Self {
        CheckConfig {
            max_examples: 100,
            max_shrinks: 200,
        }
    }
}

/// This represents a configuration for a particular test: a generator plus
/// the check parameters.
pub struct Property<G> {
    gen: G,
    config: CheckConfig,
}

/// This represents something that a check can return.
pub trait CheckResult {
    /// Check whether this result witnesses a failure.
    fn is_failure(&self) -> bool;
}

impl CheckResult for bool {
    fn is_failure(&self) -> bool {
        !self
    }
}

impl CheckResult for () {
    fn is_failure(&self) -> bool {
        false
    }
}

impl<O: CheckResult, E> CheckResult for Result<O, E> {
    fn is_failure(&self) -> bool {
        self.as_ref().map(|r| r.is_failure()).unwrap_or(true)
    }
}

/// The diagnostic payload for a minimal counterexample: the values the
/// replay recorded under their given names, and what the failing run came
/// back with.
#[derive(Debug)]
pub struct FailureReport {
    bindings: Vec<Binding>,
    outcome: String,
}

impl FailureReport {
    pub fn bindings(&self) -> &[Binding] {
        &*self.bindings
    }
}

impl fmt::Display for FailureReport {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Found counterexample")?;
        for &(name, ref value) in &self.bindings {
            write!(fmt, "; {} = {}", name, value)?;
        }
        write!(fmt, " ({})", self.outcome)
    }
}

enum RunStatus {
    Passed,
    Invalid,
    Failed(String),
}

/// Checks the predicate with the default configuration, panicking with a
/// [`FailureReport`](struct.FailureReport.html) on the minimal
/// counterexample found.
pub fn check<R, F>(subject: F)
where
    R: CheckResult + fmt::Debug,
    F: Fn(&mut Scope) -> Maybe<R>,
{
    CheckConfig::default().check(subject)
}

/// This is the main entry point for generator-first use of the library.
pub fn property<G: Generator>(gen: G) -> Property<G> {
    CheckConfig::default().property(gen)
}

impl CheckConfig {
    pub fn max_examples(mut self, n: usize) -> Self {
        self.max_examples = n;
        self
    }

    pub fn max_shrinks(mut self, n: usize) -> Self {
        self.max_shrinks = n;
        self
    }

    pub fn property<G: Generator>(self, gen: G) -> Property<G> {
        Property {
            gen: gen,
            config: self,
        }
    }

    /// Runs `subject` against up to `max_examples` fresh choice sequences.
    /// The first falsified or panicking run becomes the counterexample; it
    /// is shrunk, replayed for its named bindings, and reported by
    /// panicking. Returning normally means the property held every time.
    pub fn check<R, F>(self, subject: F)
    where
        R: CheckResult + fmt::Debug,
        F: Fn(&mut Scope) -> Maybe<R>,
    {
        let mut tests_run = 0usize;
        let mut items_skipped = 0usize;
        while tests_run < self.max_examples {
            let mut pool = ChoiceSequence::fresh();
            match execute(&subject, &mut pool, None) {
                RunStatus::Passed => {
                    tests_run += 1;
                }
                RunStatus::Invalid => {
                    items_skipped += 1;
                    if items_skipped >= self.max_examples * SKIP_MULTIPLIER {
                        panic!(
                            "Could not finish on {}/{} tests (have skipped {} times)",
                            tests_run, self.max_examples, items_skipped
                        );
                    }
                }
                RunStatus::Failed(outcome) => {
                    debug!(
                        "counterexample after {} tests ({}): {:?}",
                        tests_run, outcome, pool
                    );
                    let minimal = self.shrink(&subject, pool.rewind());
                    let report = replay(&subject, &minimal);
                    panic!("{}", report);
                }
            }
        }
        trace!("{} tests passed", tests_run);
    }

    fn shrink<R, F>(&self, subject: &F, seed: ChoiceSequence) -> ChoiceSequence
    where
        R: CheckResult + fmt::Debug,
        F: Fn(&mut Scope) -> Maybe<R>,
    {
        let run = |candidate: ChoiceSequence| {
            let mut pool = candidate.cleared();
            match execute(subject, &mut pool, None) {
                RunStatus::Failed(_) => Some(pool.rewind()),
                _ => None,
            }
        };
        Shrinker::new(seed, self.max_shrinks, run).minimize()
    }
}

impl<G: Generator> Property<G>
where
    G::Item: fmt::Debug,
{
    /// Use this function to specify the thing you wish to check. The
    /// generated value is drawn under the name "input".
    pub fn check<R, F>(self, subject: F)
    where
        R: CheckResult + fmt::Debug,
        F: Fn(G::Item) -> R,
    {
        let Property { gen, config } = self;
        config.check(move |scope: &mut Scope| {
            let input = scope.draw("input", &gen)?;
            Ok(subject(input))
        })
    }
}

/// One predicate run over `pool`, optionally capturing named draws into
/// `record`. Panics from inside the predicate count as failures; running
/// out of data or skipping does not.
fn execute<R, F>(
    subject: &F,
    pool: &mut ChoiceSequence,
    record: Option<&mut Vec<Binding>>,
) -> RunStatus
where
    R: CheckResult + fmt::Debug,
    F: Fn(&mut Scope) -> Maybe<R>,
{
    let res = {
        let mut scope = match record {
            Some(record) => Scope::recording(pool, record),
            None => Scope::new(pool),
        };
        panic::catch_unwind(panic::AssertUnwindSafe(|| subject(&mut scope)))
    };
    match res {
        Ok(Ok(ref r)) if !r.is_failure() => RunStatus::Passed,
        Ok(Ok(r)) => RunStatus::Failed(format!("check returned {:?}", r)),
        Ok(Err(DataError::Overrun)) | Ok(Err(DataError::SkipItem)) => RunStatus::Invalid,
        Err(err) => RunStatus::Failed(panic_message(err)),
    }
}

/// Re-runs the predicate over the minimal sequence with a replay record
/// attached, harvesting the named values for the report.
fn replay<R, F>(subject: &F, minimal: &ChoiceSequence) -> FailureReport
where
    R: CheckResult + fmt::Debug,
    F: Fn(&mut Scope) -> Maybe<R>,
{
    let mut bindings = Vec::new();
    let mut pool = minimal.cleared();
    let outcome = match execute(subject, &mut pool, Some(&mut bindings)) {
        RunStatus::Failed(outcome) => outcome,
        _ => {
            // Determinism should make this unreachable; report what we
            // have rather than lose the counterexample.
            debug!("minimal sequence did not fail on replay: {:?}", minimal);
            "predicate did not fail on replay".to_string()
        }
    };
    FailureReport {
        bindings: bindings,
        outcome: outcome,
    }
}

fn panic_message(err: Box<dyn Any + Send>) -> String {
    if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.to_string()
    } else {
        format!("Unrecognised panic result: {:?}", err)
    }
}
