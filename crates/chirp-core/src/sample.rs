//! Uniform sampling without replacement, used to pick ticket winners.

use rand::{Rng, seq::SliceRandom};

/// How many of `total` items `percent` percent is, rounded half up.
///
/// `percent` above 100 is treated as 100.
pub fn sample_size(total: usize, percent: u8) -> usize {
  let percent = usize::from(percent.min(100));
  (total * percent + 50) / 100
}

/// Draw `k` items uniformly at random without replacement.
///
/// Shuffles a copy of `population` (every permutation equally likely) and
/// keeps the first `k`. If `k` exceeds the population, all items are
/// returned in shuffled order.
pub fn sample<T, R>(population: &[T], k: usize, rng: &mut R) -> Vec<T>
where
  T: Clone,
  R: Rng + ?Sized,
{
  let mut shuffled = population.to_vec();
  shuffled.shuffle(rng);
  shuffled.truncate(k);
  shuffled
}
