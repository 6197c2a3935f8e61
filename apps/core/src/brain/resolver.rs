//! Response resolution: tag + output language -> reply text.
//!
//! Lookup chain: the tag's intent, else the `fallback` intent, else a built-in
//! localized string. Within an intent: the language pool, else the English pool,
//! else the built-in string. The reply is picked at random from the chosen pool,
//! so identical queries may get different replies; the picker is injectable so
//! tests can seed it.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Mutex;

use super::dataset::Dataset;
use super::language::Language;

/// Reply used when neither the intent nor the fallback intent has a response.
pub fn no_answer(lang: Language) -> &'static str {
    match lang {
        Language::English => "Sorry, I couldn't find an answer.",
        Language::Arabic => "عذراً، لم أتمكن من العثور على إجابة.",
    }
}

/// Picks one reply out of a non-empty pool.
pub trait ReplyPicker: Send + Sync {
    /// Returns an index into `pool`. Callers never pass an empty pool.
    fn pick(&self, pool: &[String]) -> usize;
}

/// Uniform random picker backed by a seedable RNG.
pub struct RandomPicker {
    rng: Mutex<StdRng>,
}

impl RandomPicker {
    /// Deterministic picker for tests and reproducible sessions.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl Default for RandomPicker {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl std::fmt::Debug for RandomPicker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RandomPicker").finish_non_exhaustive()
    }
}

impl ReplyPicker for RandomPicker {
    fn pick(&self, pool: &[String]) -> usize {
        if pool.is_empty() {
            return 0;
        }
        // A poisoned lock only means another thread panicked mid-pick; the RNG
        // state is still usable.
        let mut rng = match self.rng.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        rng.gen_range(0..pool.len())
    }
}

/// Always picks the first reply. Useful where variety is unwanted.
#[derive(Debug, Default, Clone, Copy)]
pub struct FirstPicker;

impl ReplyPicker for FirstPicker {
    fn pick(&self, _pool: &[String]) -> usize {
        0
    }
}

/// Resolve the reply for `tag` in `lang`.
pub fn resolve_response(
    dataset: &Dataset,
    tag: &str,
    lang: Language,
    picker: &dyn ReplyPicker,
) -> String {
    let Some(intent) = dataset.get(tag).or_else(|| dataset.fallback()) else {
        return no_answer(lang).to_string();
    };

    let pool = match intent.responses.get(lang) {
        pool if !pool.is_empty() => pool,
        _ => intent.responses.get(Language::English),
    };
    if pool.is_empty() {
        return no_answer(lang).to_string();
    }

    let i = picker.pick(pool).min(pool.len() - 1);
    pool[i].clone()
}
