//! Connascence detectors
//!
//! This module provides the detector framework and one detector per
//! violation family.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     DetectorEngine                          │
//! │  - Registers detectors                                      │
//! │  - Runs them sequentially or on the rayon pool              │
//! │  - Isolates panics, marks low-confidence results            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Detector Trait                         │
//! │  - name(): Unique identifier                                │
//! │  - kind(): Violation family emitted                         │
//! │  - detect(facts): Pure function over CollectedFacts         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Detectors
//!
//! - `ParameterCouplingDetector` - too many parameters (position)
//! - `MagicLiteralDetector` - unexplained literals (meaning)
//! - `GodObjectDetector` - classes with too many methods
//! - `AlgorithmDuplicationDetector` - repeated control-flow shapes (algorithm)
//! - `TimingCouplingDetector` - sleep/wait calls (timing)
//! - `GlobalCouplingDetector` - many `global` declarations (identity)

mod algorithm_duplication;
mod base;
mod engine;
mod global_coupling;
mod god_object;
mod magic_literal;
mod parameter_coupling;
mod timing_coupling;

pub use algorithm_duplication::{AlgorithmDuplicationDetector, AlgorithmDuplicationThresholds};
pub use base::{DetectionSummary, Detector, DetectorResult};
pub use engine::DetectorEngine;
pub(crate) use engine::panic_message;
pub use global_coupling::{GlobalCouplingDetector, GlobalCouplingThresholds};
pub use god_object::{GodObjectDetector, GodObjectThresholds};
pub use magic_literal::{MagicLiteralDetector, MagicLiteralThresholds};
pub use parameter_coupling::{ParameterCouplingDetector, ParameterCouplingThresholds};
pub use timing_coupling::{TimingCouplingDetector, TimingCouplingThresholds};

use crate::config::Thresholds;
use std::sync::Arc;

/// Create all built-in detectors configured from `thresholds`
pub fn default_detectors(thresholds: &Thresholds) -> Vec<Arc<dyn Detector>> {
    vec![
        Arc::new(ParameterCouplingDetector::with_thresholds(
            ParameterCouplingThresholds {
                max_parameters: thresholds.max_parameters,
            },
        )),
        Arc::new(MagicLiteralDetector::with_thresholds(MagicLiteralThresholds {
            allowlist: thresholds.magic_literal_allowlist.clone(),
            ..Default::default()
        })),
        Arc::new(GodObjectDetector::with_thresholds(GodObjectThresholds {
            max_methods: thresholds.max_methods,
        })),
        Arc::new(AlgorithmDuplicationDetector::with_thresholds(
            AlgorithmDuplicationThresholds {
                min_control_flow_nodes: thresholds.min_duplicate_complexity,
            },
        )),
        Arc::new(TimingCouplingDetector::with_thresholds(
            TimingCouplingThresholds {
                primitives: thresholds.timing_primitives.clone(),
            },
        )),
        Arc::new(GlobalCouplingDetector::with_thresholds(
            GlobalCouplingThresholds {
                max_global_declarations: thresholds.max_global_declarations,
            },
        )),
    ]
}
