use serde::Serialize;

use super::numeric::non_negative;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitOutMode {
    PerNetArea,
    PerGrossArea,
    Total,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitOutField {
    PerNetArea,
    PerGrossArea,
    Total,
}

impl FitOutMode {
    pub fn authoritative_field(self) -> FitOutField {
        match self {
            FitOutMode::PerNetArea => FitOutField::PerNetArea,
            FitOutMode::PerGrossArea => FitOutField::PerGrossArea,
            FitOutMode::Total => FitOutField::Total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LeaseParameters {
    pub net_area: f64,
    pub add_on_percent: f64,
    pub headline_rent: f64,
    pub lease_term_months: f64,
    pub rent_free_months: f64,
    pub agent_fee_months: f64,
    pub unforeseen_costs: f64,
}

impl LeaseParameters {
    /// Copy with every field clamped to a finite, non-negative value.
    pub fn normalized(&self) -> Self {
        Self {
            net_area: non_negative(self.net_area),
            add_on_percent: non_negative(self.add_on_percent),
            headline_rent: non_negative(self.headline_rent),
            lease_term_months: non_negative(self.lease_term_months),
            rent_free_months: non_negative(self.rent_free_months),
            agent_fee_months: non_negative(self.agent_fee_months),
            unforeseen_costs: non_negative(self.unforeseen_costs),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FitOutInput {
    pub mode: FitOutMode,
    pub per_net_area_rate: f64,
    pub per_gross_area_rate: f64,
    pub total_amount: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NerTiers {
    pub ner1: f64,
    pub ner2: f64,
    pub ner3: f64,
    pub ner4: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NerDeltas {
    pub delta1: f64,
    pub delta2: f64,
    pub delta3: f64,
    pub delta4: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaseResult {
    pub gross_area: f64,
    pub months_billed: f64,
    pub gross_rent_due: f64,
    pub total_fit_out_cost: f64,
    pub agent_fee_cost: f64,
    pub unforeseen_costs: f64,
    #[serde(flatten)]
    pub tiers: NerTiers,
    #[serde(flatten)]
    pub deltas: NerDeltas,
}

/// One bar of the headline-to-NER waterfall. `deduction` is how much this
/// step lowered the rent per area-month; `ner` is the level after it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallStep {
    pub label: &'static str,
    pub deduction: f64,
    pub ner: f64,
}
