//! Random `adjective_scientist` source names.

use rand::seq::SliceRandom;
use rand::Rng;

const LEFT: &[&str] = &[
    "happy", "jolly", "dreamy", "sad", "angry", "pensive", "focused", "sleepy", "grave",
    "distracted", "determined", "stoic", "stupefied", "sharp", "agitated", "cocky", "tender",
    "goofy", "furious", "desperate", "hopeful", "compassionate", "silly", "lonely",
    "condescending", "naughty", "kickass", "drunk", "boring", "nostalgic", "ecstatic", "insane",
    "cranky", "mad", "jovial", "sick", "hungry", "thirsty", "elegant", "backstabbing", "clever",
    "trusting", "loving", "suspicious", "berserk", "high", "romantic", "prickly", "evil",
];

const RIGHT: &[&str] = &[
    "lovelace", "franklin", "tesla", "einstein", "bohr", "davinci", "pasteur", "nobel", "curie",
    "darwin", "turing", "ritchie", "torvalds", "pike", "thompson", "wozniak", "galileo", "euclid",
    "newton", "fermat", "archimedes", "poincare", "heisenberg", "feynman", "hawking", "fermi",
    "pare", "mccarthy", "engelbart", "babbage", "albattani", "ptolemy", "bell", "wright",
    "lumiere", "morse", "mclean", "brown", "bardeen", "brattain", "shockley",
];

/// Collision retries before giving up.
const MAX_RETRIES: usize = 10;

/// Largest numeric suffix appended on collision.
const MAX_SUFFIX: u32 = 100;

/// Generates source names, suffixing candidates that are already taken.
pub struct NameGenerator<R: Rng> {
    rng: R,
}

impl NameGenerator<rand::rngs::ThreadRng> {
    pub fn new() -> Self {
        Self::with_rng(rand::thread_rng())
    }
}

impl Default for NameGenerator<rand::rngs::ThreadRng> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Rng> NameGenerator<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// A fresh name for which `is_taken` is false, or `None` after
    /// `MAX_RETRIES` collisions. Each collision appends `_<0..=100>` to the
    /// current candidate.
    pub fn generate<F>(&mut self, mut is_taken: F) -> Option<String>
    where
        F: FnMut(&str) -> bool,
    {
        let left = LEFT.choose(&mut self.rng)?;
        let right = RIGHT.choose(&mut self.rng)?;
        let mut name = format!("{left}_{right}");

        for _ in 0..MAX_RETRIES {
            if !is_taken(&name) {
                return Some(name);
            }
            let suffix = self.rng.gen_range(0..=MAX_SUFFIX);
            name = format!("{name}_{suffix}");
        }

        tracing::warn!(candidate = %name, "name generation exhausted retries");
        None
    }
}
