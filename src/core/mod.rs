mod engine;
mod numeric;
mod reconciler;
mod types;

pub use engine::{
    compute_agent_fees, compute_delta, compute_gross_area, compute_gross_rent, compute_lease,
    compute_ner_tiers, evaluate, evaluate_with, months_billed, waterfall,
};
pub use numeric::{EPSILON, finite_or_zero, non_negative, parse_decimal, safe_ratio};
pub use reconciler::FitOutReconciler;
pub use types::{
    FitOutField, FitOutInput, FitOutMode, LeaseParameters, LeaseResult, NerDeltas, NerTiers,
    WaterfallStep,
};
