extern crate env_logger;
extern crate refutations;

use std::cmp::min;

use refutations::*;
use refutations::generators::*;

// Run this with:
// ```
// cargo run --example die-hard
// ```
// You should see output of the form:
// ```
// thread 'main' panicked at 'Found counterexample;
// steps = [FillBigJug, BigToSmall, EmptySmallJug, BigToSmall, FillBigJug, BigToSmall]
// (check returned Err(State { big: 4, small: 3 }))'
// ```

#[derive(Debug, Clone)]
pub enum Op {
    FillSmallJug,
    FillBigJug,
    EmptySmallJug,
    EmptyBigJug,
    SmallToBig,
    BigToSmall,
}

#[derive(Debug, Default, Clone)]
pub struct State {
    big: usize,
    small: usize,
}

impl State {
    fn apply(&mut self, op: &Op) {
        match op {
            &Op::FillSmallJug => self.small = 3,
            &Op::FillBigJug => self.big = 5,
            &Op::EmptySmallJug => self.small = 0,
            &Op::EmptyBigJug => self.big = 0,
            &Op::SmallToBig => {
                let old = self.clone();
                self.big = min(old.big + self.small, 5);
                self.small -= self.big - old.big
            }
            &Op::BigToSmall => {
                let old = self.clone();
                self.small = min(old.big + self.small, 3);
                self.big -= self.small - old.small
            }
        }
    }

    fn assert_invariants(&self) {
        assert!(self.big <= 5);
        assert!(self.small <= 3);
    }

    fn finished(&self) -> bool {
        self.big == 4
    }
}

fn ops() -> Choices<Op> {
    choices(vec![
        Op::FillSmallJug,
        Op::FillBigJug,
        Op::EmptySmallJug,
        Op::EmptyBigJug,
        Op::SmallToBig,
        Op::BigToSmall,
    ])
}

fn main() {
    env_logger::init().unwrap_or(());
    CheckConfig::default()
        .max_examples(200_000)
        .check(|scope: &mut Scope| {
            let xs = scope.draw("steps", &vecs(ops()))?;
            let mut st = State::default();
            for op in xs.iter() {
                st.apply(op);
                st.assert_invariants();
                if st.finished() {
                    return Ok(Err(st));
                }
            }
            Ok(Ok(()))
        });

    panic!("No solution found")
}
