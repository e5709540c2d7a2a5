//! Synthetic observation stream driven by a hidden ground truth.

use rand::Rng;

use super::{Hypothesis, LikelihoodTable, Observation};

/// Lazily draws `steps` observations for a fixed ground truth.
///
/// Each step consumes one uniform `f64` from the borrowed RNG and emits
/// [`Observation::Suspicious`] when the draw falls strictly below
/// `P(SUSPICIOUS | truth)`. The stream cannot be rewound; reseeding the RNG is the only way
/// to replay it.
#[derive(Debug)]
pub struct ObservationStream<'r, R: Rng + ?Sized> {
    rng: &'r mut R,
    suspicion_rate: f64,
    remaining: usize,
}

impl<'r, R: Rng + ?Sized> ObservationStream<'r, R> {
    pub fn new(
        truth: Hypothesis,
        table: &LikelihoodTable,
        steps: usize,
        rng: &'r mut R,
    ) -> Self {
        Self {
            rng,
            suspicion_rate: table.suspicion_rate(truth),
            remaining: steps,
        }
    }
}

impl<R: Rng + ?Sized> Iterator for ObservationStream<'_, R> {
    type Item = Observation;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let draw: f64 = self.rng.r#gen();
        if draw < self.suspicion_rate {
            Some(Observation::Suspicious)
        } else {
            Some(Observation::Normal)
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R: Rng + ?Sized> ExactSizeIterator for ObservationStream<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn yields_exactly_requested_steps() {
        let table = LikelihoodTable::default();
        let mut rng = StdRng::seed_from_u64(1);
        let stream = ObservationStream::new(Hypothesis::Hacking, &table, 17, &mut rng);
        assert_eq!(stream.len(), 17);
        assert_eq!(stream.count(), 17);
    }

    #[test]
    fn zero_steps_is_empty_and_leaves_rng_untouched() {
        let table = LikelihoodTable::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut reference = StdRng::seed_from_u64(9);
        let drawn: Vec<_> =
            ObservationStream::new(Hypothesis::Safe, &table, 0, &mut rng).collect();
        assert!(drawn.is_empty());
        assert_eq!(rng.r#gen::<u64>(), reference.r#gen::<u64>());
    }

    #[test]
    fn certain_rates_produce_constant_streams() {
        let always = LikelihoodTable::from_suspicion_rates(0.0, 1.0).expect("valid");
        let mut rng = StdRng::seed_from_u64(3);

        let hacking: Vec<_> =
            ObservationStream::new(Hypothesis::Hacking, &always, 25, &mut rng).collect();
        assert!(hacking.iter().all(|obs| obs.is_suspicious()));

        let safe: Vec<_> =
            ObservationStream::new(Hypothesis::Safe, &always, 25, &mut rng).collect();
        assert!(safe.iter().all(|obs| *obs == Observation::Normal));
    }

    #[test]
    fn hacking_agent_is_mostly_suspicious() {
        let table = LikelihoodTable::default();
        let mut rng = StdRng::seed_from_u64(2024);
        let suspicious = ObservationStream::new(Hypothesis::Hacking, &table, 2_000, &mut rng)
            .filter(|obs| obs.is_suspicious())
            .count();
        let rate = suspicious as f64 / 2_000.0;
        assert!((0.85..0.95).contains(&rate), "rate {rate}");
    }

    #[test]
    fn same_seed_replays_same_stream() {
        let table = LikelihoodTable::default();
        let mut rng_a = StdRng::seed_from_u64(77);
        let mut rng_b = StdRng::seed_from_u64(77);
        let a: Vec<_> = ObservationStream::new(Hypothesis::Hacking, &table, 64, &mut rng_a).collect();
        let b: Vec<_> = ObservationStream::new(Hypothesis::Hacking, &table, 64, &mut rng_b).collect();
        assert_eq!(a, b);
    }
}
