pub mod adaptive;
pub mod red;

use crate::config::RedConfig;
use crate::fuzzy::{self, MembershipMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub use adaptive::{MaxPController, Status};

/// How the instantaneous drop probability is derived from the average queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DropCurve {
    /// Classic RED ramp between the thresholds.
    #[default]
    Linear,
    /// Fuzzy inference over the average queue ratio and the current max_p.
    Fuzzy,
}

/// Threshold context a curve is evaluated in.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CurveParams {
    pub min_th: f64,
    pub max_th: f64,
    pub gentle: bool,
    pub membership: MembershipMode,
}

impl DropCurve {
    pub fn probability(&self, q_avg: f64, max_p: f64, params: &CurveParams) -> f64 {
        let p = match self {
            Self::Linear => red::linear_probability(q_avg, params.min_th, params.max_th, params.gentle, max_p),
            Self::Fuzzy => {
                let ratio = if params.max_th > 0.0 { q_avg / params.max_th } else { 0.0 };
                fuzzy::infer_drop_probability(ratio, max_p, params.membership)
            }
        };
        debug_assert!(p.is_finite());
        p.clamp(0.0, 1.0)
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Linear => "linear",
            Self::Fuzzy => "fuzzy",
        }
    }
}

impl fmt::Display for DropCurve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

type Preset = Box<dyn Fn() -> RedConfig + Send + Sync>;

/// Named configurations selectable from the command line.
pub struct StrategyRegistry {
    presets: HashMap<String, Preset>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            presets: HashMap::new(),
        };
        registry.register_builtin();
        registry
    }

    fn register_builtin(&mut self) {
        self.register("red", RedConfig::default);
        self.register("red-classic", || RedConfig::default().with_gentle(false));
        self.register("ared", || RedConfig::default().with_ared(true));
        self.register("adaptive-red", || RedConfig::default().with_ared(true));
        self.register("csfl-red", || RedConfig::default().with_curve(DropCurve::Fuzzy));
        self.register("csflred", || RedConfig::default().with_curve(DropCurve::Fuzzy));
        self.register("fuzzy-red", || {
            RedConfig::default()
                .with_curve(DropCurve::Fuzzy)
                .with_membership(MembershipMode::Standard)
        });
    }

    pub fn register<F>(&mut self, name: &str, factory: F)
    where
        F: Fn() -> RedConfig + Send + Sync + 'static,
    {
        self.presets.insert(name.to_lowercase(), Box::new(factory));
    }

    pub fn create(&self, name: &str) -> Option<RedConfig> {
        self.presets.get(&name.to_lowercase()).map(|factory| factory())
    }

    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self.presets.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn global() -> &'static StrategyRegistry {
        use std::sync::OnceLock;
        static REGISTRY: OnceLock<StrategyRegistry> = OnceLock::new();
        REGISTRY.get_or_init(StrategyRegistry::new)
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::new()
    }
}
