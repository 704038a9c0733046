//! Multi-factor standard-normal draws.
//!
//! Evolvers never own their randomness: a `&mut dyn FactorGenerator` is
//! handed to every evolution call, and each call consumes exactly one draw.

use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::{MathError, MathResult};

/// One value per volatility factor.
pub type FactorVector = DVector<f64>;

/// Source of independent multivariate standard-normal vectors.
pub trait FactorGenerator: Send {
    /// Dimension of every draw.
    fn num_factors(&self) -> usize;

    /// Next draw.
    fn random(&mut self) -> MathResult<FactorVector>;
}

/// Pseudo-random generator backed by a seeded [`StdRng`].
///
/// ```rust
/// use bgm_math::factors::{FactorGenerator, GaussianFactorGenerator};
///
/// let mut a = GaussianFactorGenerator::new(3, 42).unwrap();
/// let mut b = GaussianFactorGenerator::new(3, 42).unwrap();
/// assert_eq!(a.random().unwrap(), b.random().unwrap());
/// ```
#[derive(Debug, Clone)]
pub struct GaussianFactorGenerator {
    num_factors: usize,
    rng: StdRng,
}

impl GaussianFactorGenerator {
    /// Creates a generator with `num_factors` factors, seeded with `seed`.
    pub fn new(num_factors: usize, seed: u64) -> MathResult<Self> {
        if num_factors == 0 {
            return Err(MathError::invalid_input("factor count must be positive"));
        }
        Ok(Self {
            num_factors,
            rng: StdRng::seed_from_u64(seed),
        })
    }
}

impl FactorGenerator for GaussianFactorGenerator {
    fn num_factors(&self) -> usize {
        self.num_factors
    }

    fn random(&mut self) -> MathResult<FactorVector> {
        let rng = &mut self.rng;
        Ok(DVector::from_fn(self.num_factors, |_, _| {
            StandardNormal.sample(rng)
        }))
    }
}

/// Replays a fixed list of draws, optionally cycling through them.
#[derive(Debug, Clone)]
pub struct SequenceFactorGenerator {
    draws: Vec<FactorVector>,
    next: usize,
    cycle: bool,
}

impl SequenceFactorGenerator {
    /// Replays `draws` once, then fails with `SequenceExhausted`.
    pub fn new(draws: Vec<FactorVector>) -> MathResult<Self> {
        let Some(first) = draws.first() else {
            return Err(MathError::insufficient_data(1, 0));
        };
        let dim = first.len();
        if dim == 0 {
            return Err(MathError::invalid_input("factor count must be positive"));
        }
        if let Some(bad) = draws.iter().find(|d| d.len() != dim) {
            return Err(MathError::DimensionMismatch {
                expected: dim,
                actual: bad.len(),
            });
        }
        Ok(Self {
            draws,
            next: 0,
            cycle: false,
        })
    }

    /// Replays `draws` forever.
    pub fn cycling(draws: Vec<FactorVector>) -> MathResult<Self> {
        let mut generator = Self::new(draws)?;
        generator.cycle = true;
        Ok(generator)
    }

    /// Always returns `draw`.
    pub fn repeating(draw: FactorVector) -> MathResult<Self> {
        Self::cycling(vec![draw])
    }

    /// Draws served so far.
    #[must_use]
    pub fn draws_served(&self) -> usize {
        self.next
    }
}

impl FactorGenerator for SequenceFactorGenerator {
    fn num_factors(&self) -> usize {
        self.draws[0].len()
    }

    fn random(&mut self) -> MathResult<FactorVector> {
        let index = if self.cycle {
            self.next % self.draws.len()
        } else {
            self.next
        };
        let draw = self
            .draws
            .get(index)
            .cloned()
            .ok_or(MathError::SequenceExhausted { draws: self.next })?;
        self.next += 1;
        Ok(draw)
    }
}
