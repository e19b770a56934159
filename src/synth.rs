//! Response synthesis: turning a matched definition into the concrete
//! delay and response to emit.

use crate::registry::EndpointDefinition;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tracing::warn;

/// The concrete response computed for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedResponse {
    /// Artificial delay to apply before writing anything.
    pub delay: Duration,
    pub status: u16,
    pub headers: HashMap<String, Vec<String>>,
    pub body: String,
}

/// Computes mock responses from endpoint definitions.
///
/// Holds the process-wide random source for delay sampling. Seedable so
/// tests can assert exact delays.
pub struct ResponseSynthesizer {
    rng: Mutex<StdRng>,
}

impl ResponseSynthesizer {
    /// Create a synthesizer seeded from OS entropy.
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Create a synthesizer with a fixed seed. Same seed, same delay
    /// sequence.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Compute the delay and response triple for a matched definition.
    ///
    /// The caller is expected to sleep for `delay` before writing the
    /// response to the connection.
    pub fn synthesize(&self, def: &EndpointDefinition) -> SynthesizedResponse {
        SynthesizedResponse {
            delay: self.sample_delay(def),
            status: def.return_code,
            headers: def.return_headers.clone(),
            body: def.return_body.clone(),
        }
    }

    /// Sample the artificial delay for a definition.
    ///
    /// Equal bounds give a fixed delay; otherwise the draw is uniform in
    /// `[min, max)`. The registry never accepts an inverted range, but a
    /// definition carrying one degrades to the minimum rather than
    /// faulting.
    pub fn sample_delay(&self, def: &EndpointDefinition) -> Duration {
        let ms = if def.delay_max_ms > def.delay_min_ms {
            let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
            rng.gen_range(def.delay_min_ms..def.delay_max_ms)
        } else {
            if def.delay_max_ms < def.delay_min_ms {
                warn!(
                    path = %def.path,
                    delay_min_ms = def.delay_min_ms,
                    delay_max_ms = def.delay_max_ms,
                    "Inverted delay range on stored definition, using minimum"
                );
            }
            def.delay_min_ms
        };
        Duration::from_millis(ms)
    }
}

impl Default for ResponseSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}
