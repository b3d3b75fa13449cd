use std::iter;
use std::marker::PhantomData;

use data::*;
use super::core::*;
use super::numbers::*;

/// Keep drawing elements while the continuation byte stays above the
/// threshold; 50 gives each element roughly a one in five chance of being
/// the last, and an all-zero sequence the empty collection.
const VEC_CONTINUE_THRESHOLD: u8 = 50;
/// Strings stop about half as often, so they run a little longer.
const STRING_CONTINUE_THRESHOLD: u8 = 25;

/// See [`vecs`](fn.vecs.html)
#[derive(Debug, Clone)]
pub struct VecGenerator<G> {
    inner: G,
}

/// Generates vectors with items given by `inner`. Shorter byte input gives
/// shorter vectors, and zeroing a continuation byte drops the tail.
pub fn vecs<G>(inner: G) -> VecGenerator<G> {
    VecGenerator { inner: inner }
}

impl<G: Generator> Generator for VecGenerator<G> {
    type Item = Vec<G::Item>;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<Self::Item> {
        let mut result = Vec::new();
        while src.draw_u8()? > VEC_CONTINUE_THRESHOLD {
            result.push(self.inner.generate(src)?);
        }
        Ok(result)
    }
}

/// See [`collections`](fn.collections.html)
#[derive(Debug, Clone)]
pub struct CollectionGenerator<C, G> {
    witness: PhantomData<C>,
    inner: G,
}

/// Generates a collection of the given type, populated with elements from
/// the item generator.
///
/// To generate values of BTreeSet<u8>:
///
/// ```
/// use std::collections::BTreeSet;
/// use refutations::generators::*;
/// let gen = collections::<BTreeSet<_>, _>(u8s());
/// ```
pub fn collections<C, G: Generator>(item: G) -> CollectionGenerator<C, G>
where
    C: Extend<G::Item>,
{
    CollectionGenerator {
        witness: PhantomData,
        inner: item,
    }
}

impl<G: Generator, C: Default + Extend<G::Item>> Generator for CollectionGenerator<C, G> {
    type Item = C;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<Self::Item> {
        let mut coll: C = Default::default();
        while src.draw_u8()? > VEC_CONTINUE_THRESHOLD {
            let item = self.inner.generate(src)?;
            coll.extend(iter::once(item));
        }
        Ok(coll)
    }
}

/// See [`strings`](fn.strings.html)
#[derive(Debug, Clone)]
pub struct StringGenerator;

/// Generates strings of printable ASCII characters; all-zero input is the
/// empty string.
pub fn strings() -> StringGenerator {
    StringGenerator
}

impl Generator for StringGenerator {
    type Item = String;
    fn generate(&self, src: &mut ChoiceSequence) -> Maybe<String> {
        let chars = ascii_chars();
        let mut result = String::new();
        while src.draw_u8()? > STRING_CONTINUE_THRESHOLD {
            result.push(chars.generate(src)?);
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use super::*;
    use data::*;
    use generators::core::*;

    #[test]
    fn vecs_are_empty_on_zeroed_input() {
        let gen = vecs(booleans());
        assert_eq!(
            gen.generate_from(&ChoiceSequence::of_vec(vec![0; 16])),
            Ok(vec![])
        );
    }

    #[test]
    fn vecs_alternate_continuations_and_elements() {
        let gen = vecs(booleans());
        // continue, true; continue, false; stop.
        let pool = ChoiceSequence::of_vec(vec![0xff, 0xff, 0xff, 0x00, 0x00]);
        assert_eq!(gen.generate_from(&pool), Ok(vec![true, false]));
    }

    #[test]
    fn vecs_should_generate_same_output_given_same_input() {
        let gen = vecs(u8s());
        let mut pool = ChoiceSequence::fresh();
        gen.generate(&mut pool).expect("generated value");
        let rewound = pool.rewind();
        assert_eq!(gen.generate_from(&rewound), gen.generate_from(&rewound));
    }

    #[test]
    fn vec_bools_minimize_to_empty() {
        let gen = vecs(booleans());
        let mut pool = ChoiceSequence::fresh();
        gen.generate(&mut pool).expect("generated value");
        let min = find_minimal(&gen, pool.rewind(), 200, |_| true);
        assert_eq!(gen.generate_from(&min), Ok(vec![]));
    }

    #[test]
    fn vec_bools_can_minimise_with_predicate() {
        let gen = vecs(booleans());
        let mut pool = ChoiceSequence::fresh();
        while !gen
            .generate(&mut pool)
            .map(|v| v.len() > 2)
            .unwrap_or(false)
        {
            pool = ChoiceSequence::fresh();
        }
        let min = find_minimal(&gen, pool.rewind(), 500, |v| v.len() > 2);
        assert_eq!(
            gen.generate_from(&min),
            Ok(vec![false, false, false])
        );
    }

    #[test]
    fn collections_fill_sets_like_vecs() {
        let gen = collections::<BTreeSet<_>, _>(u8s());
        let pool = ChoiceSequence::of_vec(vec![0xff, 7, 0xff, 7, 0x00]);
        let set = gen.generate_from(&pool).expect("generated value");
        assert_eq!(set.into_iter().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn collections_minimize_to_empty() {
        let gen = collections::<BTreeSet<_>, _>(u8s());
        let mut pool = ChoiceSequence::fresh();
        gen.generate(&mut pool).expect("generated value");
        let min = find_minimal(&gen, pool.rewind(), 200, |_| true);
        assert_eq!(gen.generate_from(&min), Ok(BTreeSet::new()));
    }

    #[test]
    fn strings_are_empty_on_zeroed_input() {
        let gen = strings();
        assert_eq!(
            gen.generate_from(&ChoiceSequence::of_vec(vec![0; 16])),
            Ok("".to_string())
        );
    }

    #[test]
    fn strings_map_zero_characters_to_spaces() {
        let gen = strings();
        let pool = ChoiceSequence::of_vec(vec![0xff, 0x00, 0xff, 0x00, 0x00]);
        assert_eq!(gen.generate_from(&pool), Ok("  ".to_string()));
    }

    #[test]
    fn lengths_should_cluster_around_the_continuation_odds() {
        let gen = vecs(u8s());
        let trials = 1024usize;
        let mut total = 0usize;
        for _ in 0..trials {
            let mut pool = ChoiceSequence::fresh();
            total += gen.generate(&mut pool).expect("a trial").len();
        }
        let mean = total as f64 / trials as f64;
        // Continuation odds of 205/256 put the expected length near four.
        assert!(
            mean > 2.5 && mean < 6.0,
            "Expected mean length near 4; got {}",
            mean
        );
    }
}
