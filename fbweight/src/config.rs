//! Execution settings for the forward-backward facade.
//!
//! Settings only affect scheduling; scores are identical for every setting.
//! `FbConfig::from_env()` reads overrides from the environment:
//!
//! | Variable                      | Effect                                   |
//! |-------------------------------|------------------------------------------|
//! | `FBWEIGHT_PARALLEL`           | `0`/`false`/`off` disables parallel passes |
//! | `FBWEIGHT_PARALLEL_MIN_ARCS`  | arc count at which passes run in parallel |

/// Environment variable toggling parallel passes.
pub const ENV_PARALLEL: &str = "FBWEIGHT_PARALLEL";
/// Environment variable setting the parallel arc threshold.
pub const ENV_PARALLEL_MIN_ARCS: &str = "FBWEIGHT_PARALLEL_MIN_ARCS";

const DEFAULT_PARALLEL_MIN_ARCS: usize = 4096;

/// How the facade schedules the forward and backward passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FbConfig {
    /// Run forward and backward on separate rayon workers.
    pub parallel: bool,
    /// Below this many arcs the passes run back to back on the caller's
    /// thread; the join overhead dominates for small automata.
    pub parallel_min_arcs: usize,
}

impl Default for FbConfig {
    fn default() -> Self {
        FbConfig { parallel: true, parallel_min_arcs: DEFAULT_PARALLEL_MIN_ARCS }
    }
}

impl FbConfig {
    /// Always run both passes on the calling thread.
    pub fn sequential() -> Self {
        FbConfig { parallel: false, ..Self::default() }
    }

    /// Defaults, overridden by `FBWEIGHT_*` environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by `lookup`. Unparseable values are ignored with a
    /// warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(ENV_PARALLEL) {
            match parse_flag(&raw) {
                Some(flag) => config.parallel = flag,
                None => tracing::warn!("ignoring {}={:?}: expected a boolean", ENV_PARALLEL, raw),
            }
        }

        if let Some(raw) = lookup(ENV_PARALLEL_MIN_ARCS) {
            match raw.trim().parse::<usize>() {
                Ok(n) => config.parallel_min_arcs = n,
                Err(e) => tracing::warn!("ignoring {}={:?}: {}", ENV_PARALLEL_MIN_ARCS, raw, e),
            }
        }

        config
    }

    /// Whether an automaton with `num_arcs` arcs should use parallel passes.
    #[inline]
    pub fn use_parallel(&self, num_arcs: usize) -> bool {
        self.parallel && num_arcs >= self.parallel_min_arcs
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}
