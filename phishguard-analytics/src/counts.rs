use phishguard_types::Variant;
use serde::{Deserialize, Serialize};

/// Per-variant tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantCounts {
    pub variant_a: usize,
    pub variant_b: usize,
}

impl VariantCounts {
    pub const fn new(variant_a: usize, variant_b: usize) -> Self {
        Self {
            variant_a,
            variant_b,
        }
    }

    pub fn add(&mut self, variant: Variant) {
        match variant {
            Variant::A => self.variant_a += 1,
            Variant::B => self.variant_b += 1,
        }
    }

    pub fn get(&self, variant: Variant) -> usize {
        match variant {
            Variant::A => self.variant_a,
            Variant::B => self.variant_b,
        }
    }

    pub fn total(&self) -> usize {
        self.variant_a + self.variant_b
    }

    /// Component-wise sum.
    #[must_use]
    pub fn plus(self, other: Self) -> Self {
        Self::new(self.variant_a + other.variant_a, self.variant_b + other.variant_b)
    }
}

impl FromIterator<Variant> for VariantCounts {
    fn from_iter<I: IntoIterator<Item = Variant>>(iter: I) -> Self {
        let mut counts = Self::default();
        for variant in iter {
            counts.add(variant);
        }
        counts
    }
}

/// `count / total * 100`, or 0 for an empty total.
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}
