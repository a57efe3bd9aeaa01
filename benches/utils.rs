#![allow(dead_code)]
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// right skewed scores, like most detector outputs
pub(crate) fn create_scores(n_samples: usize) -> Vec<f64> {
    // reproducible seed
    let mut rng = StdRng::seed_from_u64(1903);
    (0..n_samples)
        .map(|_| {
            let u: f64 = rng.gen_range(f64::EPSILON..1.0);
            -u.ln()
        })
        .collect()
}
