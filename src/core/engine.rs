use super::numeric::{EPSILON, finite_or_zero, non_negative};
use super::reconciler::FitOutReconciler;
use super::types::{FitOutInput, LeaseParameters, LeaseResult, NerDeltas, NerTiers, WaterfallStep};

pub fn compute_gross_area(net_area: f64, add_on_percent: f64) -> f64 {
    finite_or_zero(net_area * (1.0 + add_on_percent / 100.0))
}

/// Rent-free months shorten the billed duration; a rent-free period longer
/// than the term bills nothing rather than going negative.
pub fn months_billed(lease_term_months: f64, rent_free_months: f64) -> f64 {
    (lease_term_months - rent_free_months).max(0.0)
}

pub fn compute_gross_rent(
    headline_rent: f64,
    gross_area: f64,
    lease_term_months: f64,
    rent_free_months: f64,
) -> f64 {
    let billed = months_billed(lease_term_months, rent_free_months);
    finite_or_zero(headline_rent * gross_area * billed)
}

/// Agent fees are a number of months of full headline rent on the gross area.
pub fn compute_agent_fees(agent_fee_months: f64, headline_rent: f64, gross_area: f64) -> f64 {
    finite_or_zero(agent_fee_months * headline_rent * gross_area)
}

/// Each tier deducts one more cost category from the previous numerator, in
/// the fixed order fit-out, agent fees, unforeseen costs. All tiers share the
/// same denominator (full term over gross area). A degenerate or overflowing
/// computation yields all-zero tiers.
pub fn compute_ner_tiers(
    gross_rent: f64,
    total_fit_out_cost: f64,
    agent_fees: f64,
    unforeseen_costs: f64,
    lease_term_months: f64,
    gross_area: f64,
) -> NerTiers {
    let zero = NerTiers {
        ner1: 0.0,
        ner2: 0.0,
        ner3: 0.0,
        ner4: 0.0,
    };
    let area_months = lease_term_months * gross_area;
    if !area_months.is_finite() || area_months < EPSILON {
        return zero;
    }

    let after_fit_out = gross_rent - total_fit_out_cost;
    let after_agent_fees = after_fit_out - agent_fees;
    let after_unforeseen = after_agent_fees - unforeseen_costs;
    let tiers = NerTiers {
        ner1: gross_rent / area_months,
        ner2: after_fit_out / area_months,
        ner3: after_agent_fees / area_months,
        ner4: after_unforeseen / area_months,
    };
    let all_finite = [tiers.ner1, tiers.ner2, tiers.ner3, tiers.ner4]
        .iter()
        .all(|v| v.is_finite());
    if all_finite { tiers } else { zero }
}

/// Percentage by which `tier_value` sits below `headline_rent`. Negative when
/// the tier exceeds headline.
pub fn compute_delta(tier_value: f64, headline_rent: f64) -> f64 {
    if headline_rent > 0.0 {
        (headline_rent - tier_value) / headline_rent * 100.0
    } else {
        0.0
    }
}

pub fn compute_lease(params: &LeaseParameters, total_fit_out_cost: f64) -> LeaseResult {
    let params = params.normalized();
    let total_fit_out_cost = non_negative(total_fit_out_cost);

    let gross_area = compute_gross_area(params.net_area, params.add_on_percent);
    let billed = months_billed(params.lease_term_months, params.rent_free_months);
    let gross_rent_due = compute_gross_rent(
        params.headline_rent,
        gross_area,
        params.lease_term_months,
        params.rent_free_months,
    );
    let agent_fee_cost =
        compute_agent_fees(params.agent_fee_months, params.headline_rent, gross_area);
    let tiers = compute_ner_tiers(
        gross_rent_due,
        total_fit_out_cost,
        agent_fee_cost,
        params.unforeseen_costs,
        params.lease_term_months,
        gross_area,
    );
    let deltas = NerDeltas {
        delta1: compute_delta(tiers.ner1, params.headline_rent),
        delta2: compute_delta(tiers.ner2, params.headline_rent),
        delta3: compute_delta(tiers.ner3, params.headline_rent),
        delta4: compute_delta(tiers.ner4, params.headline_rent),
    };

    LeaseResult {
        gross_area,
        months_billed: billed,
        gross_rent_due,
        total_fit_out_cost,
        agent_fee_cost,
        unforeseen_costs: params.unforeseen_costs,
        tiers,
        deltas,
    }
}

/// Reconciles the fit-out entry against the parameters' areas, then runs the
/// full computation. Returns the result together with the reconciled fit-out
/// fields for display.
pub fn evaluate(params: &LeaseParameters, fit_out: FitOutInput) -> (LeaseResult, FitOutInput) {
    let mut reconciler = FitOutReconciler::new(fit_out);
    evaluate_with(params, &mut reconciler)
}

/// Same as [`evaluate`] but drives a caller-owned reconciler, so a focus
/// marker set by the input layer is honoured.
pub fn evaluate_with(
    params: &LeaseParameters,
    reconciler: &mut FitOutReconciler,
) -> (LeaseResult, FitOutInput) {
    let params = params.normalized();
    let gross_area = compute_gross_area(params.net_area, params.add_on_percent);
    reconciler.on_area_changed(params.net_area, gross_area);
    let result = compute_lease(&params, reconciler.resolve_total_fit_out_cost());
    (result, reconciler.snapshot())
}

pub fn waterfall(result: &LeaseResult, headline_rent: f64) -> Vec<WaterfallStep> {
    let headline_rent = non_negative(headline_rent);
    let tiers = &result.tiers;
    vec![
        WaterfallStep {
            label: "headline-rent",
            deduction: 0.0,
            ner: headline_rent,
        },
        WaterfallStep {
            label: "rent-free",
            deduction: headline_rent - tiers.ner1,
            ner: tiers.ner1,
        },
        WaterfallStep {
            label: "fit-out",
            deduction: tiers.ner1 - tiers.ner2,
            ner: tiers.ner2,
        },
        WaterfallStep {
            label: "agent-fees",
            deduction: tiers.ner2 - tiers.ner3,
            ner: tiers.ner3,
        },
        WaterfallStep {
            label: "unforeseen-costs",
            deduction: tiers.ner3 - tiers.ner4,
            ner: tiers.ner4,
        },
    ]
}
