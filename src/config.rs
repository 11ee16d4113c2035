//! Shell configuration assembled at startup.

use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::render::RenderConfig;

/// Settings that stay fixed for a whole session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShellConfig {
    pub render: RenderConfig,
    /// Fixed seed for `rd`; drawn from the OS when unset.
    pub seed: Option<u64>,
}

impl ShellConfig {
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}
