//! Preference learning: decayed per-category scores and usage insights

mod aggregator;
mod insights;

pub use aggregator::{
    action_weight, carry_forward, decay_factor, recompute, PreferenceScore, PreferenceScores,
    PreferenceSnapshot,
};
pub use insights::Insights;
