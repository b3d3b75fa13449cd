use std::fmt;

use data::*;

/// Something that can turn drawn bytes into a typed value.
///
/// Generators must be biased toward smallness: byte-wise smaller input has
/// to produce a value that is smaller in the domain's natural order, and
/// shorter input a shorter value, so that shrinking the underlying sequence
/// shrinks what the user sees.
pub trait Generator {
    type Item;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<Self::Item>;

    /// Generates from a copy of the given sequence's bytes. (Mostly used
    /// for testing generators.)
    fn generate_from(&self, pool: &ChoiceSequence) -> Maybe<Self::Item>
    where
        Self: Sized,
    {
        let mut replay = ChoiceSequence::of_vec(pool.buffer().to_vec());
        self.generate(&mut replay)
    }

    fn map<U, F: Fn(Self::Item) -> U>(self, f: F) -> Mapped<Self, F>
    where
        Self: Sized,
    {
        Mapped(self, f)
    }

    fn filter<F: Fn(&Self::Item) -> bool>(self, pred: F) -> Filtered<Self, F>
    where
        Self: Sized,
    {
        Filtered(self, pred)
    }

    fn filter_map<U, F: Fn(Self::Item) -> Maybe<U>>(self, f: F) -> FilterMapped<Self, F>
    where
        Self: Sized,
    {
        FilterMapped(self, f)
    }

    fn boxed(self) -> Box<dyn Generator<Item = Self::Item>>
    where
        Self: Sized + 'static,
    {
        Box::new(self)
    }
}

impl<'a, G: Generator + ?Sized> Generator for &'a G {
    type Item = G::Item;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<Self::Item> {
        (**self).generate(src)
    }
}

impl<G: Generator + ?Sized> Generator for Box<G> {
    type Item = G::Item;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<Self::Item> {
        (**self).generate(src)
    }
}

/// A named value captured while replaying a counterexample, rendered via
/// `Debug` at the moment it was drawn.
pub type Binding = (&'static str, String);

/// Hands a predicate access to the ambient choice sequence, and names the
/// values it draws so the failure report can echo them back.
///
/// Draws made through [`draw`](#method.draw) are top level: they appear in
/// the report when a replay record is attached. Draws a generator makes
/// internally go straight to the sequence and stay anonymous.
pub struct Scope<'a> {
    source: &'a mut ChoiceSequence,
    record: Option<&'a mut Vec<Binding>>,
}

impl<'a> Scope<'a> {
    pub fn new(source: &'a mut ChoiceSequence) -> Self {
        Scope {
            source: source,
            record: None,
        }
    }

    pub fn recording(source: &'a mut ChoiceSequence, record: &'a mut Vec<Binding>) -> Self {
        Scope {
            source: source,
            record: Some(record),
        }
    }

    /// Draws one value from `gen`, recording it under `name` when a replay
    /// record is attached.
    pub fn draw<G: Generator>(&mut self, name: &'static str, gen: &G) -> Maybe<G::Item>
    where
        G::Item: fmt::Debug,
    {
        let val = gen.generate(self.source)?;
        if let Some(ref mut record) = self.record {
            record.push((name, format!("{:?}", val)));
        }
        Ok(val)
    }
}

/// See [`booleans`](fn.booleans.html)
#[derive(Debug, Clone)]
pub struct BoolGenerator;

/// A generator of bools; a byte in the upper half of the range reads as
/// true, so false is the smaller value.
pub fn booleans() -> BoolGenerator {
    BoolGenerator
}

impl Generator for BoolGenerator {
    type Item = bool;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<bool> {
        src.draw_u8().map(|b| b >= 0x80)
    }
}

/// See [`consts`](fn.consts.html)
#[derive(Debug, Clone)]
pub struct Const<V>(V);

/// A generator that always yields a clone of `val` and draws nothing.
pub fn consts<V: Clone>(val: V) -> Const<V> {
    Const(val)
}

impl<V: Clone> Generator for Const<V> {
    type Item = V;
    fn generate(&self, _: &mut ChoiceSequence) -> Maybe<V> {
        Ok(self.0.clone())
    }
}

/// See [`choices`](fn.choices.html)
#[derive(Debug, Clone)]
pub struct Choices<V>(Vec<V>);

/// Picks one of up to 256 candidate values from a single byte. When the
/// count is a power of two the pick is uniform; otherwise the byte is
/// reduced modulo the count, biasing toward earlier entries. Either way a
/// zero byte selects the first value, so candidates should be listed
/// smallest first.
pub fn choices<V: Clone>(values: Vec<V>) -> Choices<V> {
    assert!(!values.is_empty(), "choices requires at least one value");
    assert!(
        values.len() <= 256,
        "choices supports at most 256 values; got {}",
        values.len()
    );
    Choices(values)
}

impl<V: Clone> Generator for Choices<V> {
    type Item = V;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<V> {
        let byte = src.draw_u8()? as usize;
        let n = self.0.len();
        let idx = if n.is_power_of_two() {
            byte * n / 256
        } else {
            byte % n
        };
        Ok(self.0[idx].clone())
    }
}

/// See [`generator_fn`](fn.generator_fn.html)
pub struct GeneratorFn<F>(F);

/// Makes it slightly easier to implement one-off or recursive generators,
/// by allowing the user to specify a function rather than needing to build
/// it from combinators or a new Generator instance.
pub fn generator_fn<T, F: Fn(&mut ChoiceSequence) -> Maybe<T>>(f: F) -> GeneratorFn<F> {
    GeneratorFn(f)
}

impl<T, F: Fn(&mut ChoiceSequence) -> Maybe<T>> Generator for GeneratorFn<F> {
    type Item = T;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<T> {
        (self.0)(src)
    }
}

/// See [`Generator::map`](trait.Generator.html#method.map)
#[derive(Debug, Clone)]
pub struct Mapped<G, F>(G, F);

impl<G: Generator, U, F: Fn(G::Item) -> U> Generator for Mapped<G, F> {
    type Item = U;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<U> {
        let &Mapped(ref gen, ref f) = self;
        gen.generate(src).map(f)
    }
}

/// See [`Generator::filter`](trait.Generator.html#method.filter)
#[derive(Debug, Clone)]
pub struct Filtered<G, F>(G, F);

impl<G: Generator, F: Fn(&G::Item) -> bool> Generator for Filtered<G, F> {
    type Item = G::Item;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<G::Item> {
        let &Filtered(ref gen, ref pred) = self;
        let val = gen.generate(src)?;
        if pred(&val) {
            Ok(val)
        } else {
            Err(DataError::SkipItem)
        }
    }
}

/// See [`Generator::filter_map`](trait.Generator.html#method.filter_map)
#[derive(Debug, Clone)]
pub struct FilterMapped<G, F>(G, F);

impl<G: Generator, U, F: Fn(G::Item) -> Maybe<U>> Generator for FilterMapped<G, F> {
    type Item = U;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<U> {
        let &FilterMapped(ref gen, ref f) = self;
        let val = gen.generate(src)?;
        f(val)
    }
}

macro_rules! tuple_generator_impl {
    ($($gen_n:ident: $var_n:ident: $type_n:ident),+) => (
        impl<$($type_n: Generator),+> Generator for ($($type_n),+,) {
            type Item = ($($type_n::Item),+,);
            fn generate(&self, src: &mut ChoiceSequence) -> Maybe<Self::Item> {
                let &($(ref $gen_n),+,) = self;
                $(let $var_n = $gen_n.generate(src)?;)+
                Ok(($($var_n),+,))
            }
        }
    );
}

tuple_generator_impl!(ga: a: A);
tuple_generator_impl!(ga: a: A, gb: b: B);
tuple_generator_impl!(ga: a: A, gb: b: B, gc: c: C);
tuple_generator_impl!(ga: a: A, gb: b: B, gc: c: C, gd: d: D);
tuple_generator_impl!(ga: a: A, gb: b: B, gc: c: C, gd: d: D, ge: e: E);
tuple_generator_impl!(ga: a: A, gb: b: B, gc: c: C, gd: d: D, ge: e: E, gf: f: F);

/// Finds the smallest choice sequence whose generated value still satisfies
/// `matches`, starting from a sequence known to. The seed should be
/// rewound, as [`ChoiceSequence::rewind`](../data/struct.ChoiceSequence.html#method.rewind)
/// leaves it.
pub fn find_minimal<G, F>(gen: &G, seed: ChoiceSequence, shrinks: usize, matches: F) -> ChoiceSequence
where
    G: Generator,
    F: Fn(&G::Item) -> bool,
{
    let run = |candidate: ChoiceSequence| {
        let mut pool = candidate.cleared();
        match gen.generate(&mut pool) {
            Ok(ref val) if matches(val) => Some(pool.rewind()),
            _ => None,
        }
    };
    Shrinker::new(seed, shrinks, run).minimize()
}
