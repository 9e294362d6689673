// Test modules for all components
pub mod test_agent;

use rand::rngs::StdRng;
use rand::SeedableRng;

pub(crate) fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
