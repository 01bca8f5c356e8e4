/// Range of ray parameters, used for hit tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// Create a new interval given min and max values.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if x is strictly within the interval (min, max) (exclusive).
    ///
    /// NaN is never surrounded, which is what lets intersection code return
    /// raw NaN/inf parameters for misses.
    pub fn surrounds(&self, x: f64) -> bool {
        self.min < x && x < self.max
    }

    /// The open interval of valid hit distances in front of a ray origin.
    pub fn ahead_of(epsilon: f64) -> Interval {
        Interval::new(epsilon, f64::INFINITY)
    }
}
