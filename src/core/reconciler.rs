use super::numeric::{non_negative, safe_ratio};
use super::types::{FitOutField, FitOutInput, FitOutMode};

/// Keeps the three fit-out representations (per net area, per gross area,
/// total) consistent with each other and with the current areas.
///
/// Only the field selected by `mode` is ever taken as the source of truth.
/// The other two are display values, refreshed on area changes and on
/// authoritative edits, except while the input layer reports them focused.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOutReconciler {
    mode: FitOutMode,
    per_net_area_rate: f64,
    per_gross_area_rate: f64,
    total_amount: f64,
    net_area: f64,
    gross_area: f64,
    focus: Option<FitOutField>,
}

impl FitOutReconciler {
    pub fn new(input: FitOutInput) -> Self {
        Self {
            mode: input.mode,
            per_net_area_rate: non_negative(input.per_net_area_rate),
            per_gross_area_rate: non_negative(input.per_gross_area_rate),
            total_amount: non_negative(input.total_amount),
            net_area: 0.0,
            gross_area: 0.0,
            focus: None,
        }
    }

    pub fn mode(&self) -> FitOutMode {
        self.mode
    }

    pub fn focus(&self) -> Option<FitOutField> {
        self.focus
    }

    /// Switches the authoritative field. Values are left as they are; the
    /// next area change or edit recomputes along the new path.
    pub fn set_mode(&mut self, mode: FitOutMode) {
        self.mode = mode;
    }

    pub fn set_focus(&mut self, focus: Option<FitOutField>) {
        self.focus = focus;
    }

    pub fn on_area_changed(&mut self, net_area: f64, gross_area: f64) {
        self.net_area = non_negative(net_area);
        self.gross_area = non_negative(gross_area);
        self.refresh_derived();
    }

    /// Applies an edit to `field`. Returns `false` and changes nothing when
    /// `field` is not the authoritative one for the current mode.
    pub fn on_field_edited(&mut self, field: FitOutField, value: f64) -> bool {
        if field != self.mode.authoritative_field() {
            return false;
        }
        self.write(field, non_negative(value));
        self.refresh_derived();
        true
    }

    /// Blur: drops the focus marker and runs the refresh it was holding back.
    pub fn on_field_committed(&mut self) {
        self.focus = None;
        self.refresh_derived();
    }

    pub fn resolve_total_fit_out_cost(&self) -> f64 {
        let total = match self.mode {
            FitOutMode::PerNetArea => self.per_net_area_rate * self.net_area,
            FitOutMode::PerGrossArea => self.per_gross_area_rate * self.gross_area,
            FitOutMode::Total => self.total_amount,
        };
        non_negative(total)
    }

    pub fn snapshot(&self) -> FitOutInput {
        FitOutInput {
            mode: self.mode,
            per_net_area_rate: self.per_net_area_rate,
            per_gross_area_rate: self.per_gross_area_rate,
            total_amount: self.total_amount,
        }
    }

    fn refresh_derived(&mut self) {
        let total = self.resolve_total_fit_out_cost();
        let per_net = safe_ratio(total, self.net_area);
        let per_gross = safe_ratio(total, self.gross_area);
        let authoritative = self.mode.authoritative_field();

        for (field, value) in [
            (FitOutField::PerNetArea, per_net),
            (FitOutField::PerGrossArea, per_gross),
            (FitOutField::Total, total),
        ] {
            if field != authoritative && self.focus != Some(field) {
                self.write(field, value);
            }
        }
    }

    fn write(&mut self, field: FitOutField, value: f64) {
        match field {
            FitOutField::PerNetArea => self.per_net_area_rate = value,
            FitOutField::PerGrossArea => self.per_gross_area_rate = value,
            FitOutField::Total => self.total_amount = value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::{prop_assert, proptest};

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn per_net_area(rate: f64) -> FitOutReconciler {
        FitOutReconciler::new(FitOutInput {
            mode: FitOutMode::PerNetArea,
            per_net_area_rate: rate,
            per_gross_area_rate: 0.0,
            total_amount: 0.0,
        })
    }

    #[test]
    fn per_net_area_mode_derives_total_and_gross_rate() {
        let mut reconciler = per_net_area(150.0);
        reconciler.on_area_changed(1_000.0, 1_050.0);

        let snapshot = reconciler.snapshot();
        assert_approx(reconciler.resolve_total_fit_out_cost(), 150_000.0);
        assert_approx(snapshot.total_amount, 150_000.0);
        assert_approx(snapshot.per_gross_area_rate, 150_000.0 / 1_050.0);
        assert_approx(snapshot.per_net_area_rate, 150.0);
    }

    #[test]
    fn per_gross_area_mode_derives_total_and_net_rate() {
        let mut reconciler = FitOutReconciler::new(FitOutInput {
            mode: FitOutMode::PerGrossArea,
            per_net_area_rate: 0.0,
            per_gross_area_rate: 100.0,
            total_amount: 0.0,
        });
        reconciler.on_area_changed(1_000.0, 1_050.0);

        let snapshot = reconciler.snapshot();
        assert_approx(reconciler.resolve_total_fit_out_cost(), 105_000.0);
        assert_approx(snapshot.total_amount, 105_000.0);
        assert_approx(snapshot.per_net_area_rate, 105.0);
    }

    #[test]
    fn total_mode_derives_both_rates() {
        let mut reconciler = FitOutReconciler::new(FitOutInput {
            mode: FitOutMode::Total,
            per_net_area_rate: 0.0,
            per_gross_area_rate: 0.0,
            total_amount: 210_000.0,
        });
        reconciler.on_area_changed(1_000.0, 1_050.0);

        let snapshot = reconciler.snapshot();
        assert_approx(reconciler.resolve_total_fit_out_cost(), 210_000.0);
        assert_approx(snapshot.per_net_area_rate, 210.0);
        assert_approx(snapshot.per_gross_area_rate, 200.0);
    }

    #[test]
    fn mode_switch_alone_does_not_recompute() {
        let mut reconciler = per_net_area(150.0);
        reconciler.on_area_changed(1_000.0, 1_050.0);
        let before = reconciler.snapshot();

        reconciler.set_mode(FitOutMode::PerGrossArea);

        let after = reconciler.snapshot();
        assert_eq!(after.per_net_area_rate, before.per_net_area_rate);
        assert_eq!(after.per_gross_area_rate, before.per_gross_area_rate);
        assert_eq!(after.total_amount, before.total_amount);
        assert_approx(reconciler.resolve_total_fit_out_cost(), 150_000.0);
    }

    #[test]
    fn zero_net_area_yields_zero_total_without_nan() {
        let mut reconciler = per_net_area(150.0);
        reconciler.on_area_changed(0.0, 0.0);

        let snapshot = reconciler.snapshot();
        assert_eq!(reconciler.resolve_total_fit_out_cost(), 0.0);
        assert_eq!(snapshot.total_amount, 0.0);
        assert_eq!(snapshot.per_gross_area_rate, 0.0);
        assert!(!snapshot.per_net_area_rate.is_nan());
    }

    #[test]
    fn total_mode_with_zero_area_keeps_total_and_zeroes_rates() {
        let mut reconciler = FitOutReconciler::new(FitOutInput {
            mode: FitOutMode::Total,
            per_net_area_rate: 7.0,
            per_gross_area_rate: 7.0,
            total_amount: 50_000.0,
        });
        reconciler.on_area_changed(0.0, 0.0);

        let snapshot = reconciler.snapshot();
        assert_approx(reconciler.resolve_total_fit_out_cost(), 50_000.0);
        assert_eq!(snapshot.per_net_area_rate, 0.0);
        assert_eq!(snapshot.per_gross_area_rate, 0.0);
    }

    #[test]
    fn focused_field_survives_area_change() {
        let mut reconciler = FitOutReconciler::new(FitOutInput {
            mode: FitOutMode::Total,
            per_net_area_rate: 0.0,
            per_gross_area_rate: 0.0,
            total_amount: 100_000.0,
        });
        reconciler.on_area_changed(1_000.0, 1_000.0);
        reconciler.set_focus(Some(FitOutField::PerNetArea));

        reconciler.on_area_changed(2_000.0, 2_100.0);

        let snapshot = reconciler.snapshot();
        assert_approx(snapshot.per_net_area_rate, 100.0);
        assert_approx(snapshot.per_gross_area_rate, 100_000.0 / 2_100.0);

        reconciler.on_field_committed();
        assert_eq!(reconciler.focus(), None);
        assert_approx(reconciler.snapshot().per_net_area_rate, 50.0);
    }

    #[test]
    fn typing_into_authoritative_field_updates_others_on_next_read() {
        let mut reconciler = per_net_area(150.0);
        reconciler.on_area_changed(1_000.0, 1_050.0);
        reconciler.set_focus(Some(FitOutField::PerNetArea));

        reconciler.on_area_changed(1_200.0, 1_260.0);

        let snapshot = reconciler.snapshot();
        assert_eq!(snapshot.per_net_area_rate, 150.0);
        assert_approx(snapshot.total_amount, 180_000.0);
        assert_approx(snapshot.per_gross_area_rate, 180_000.0 / 1_260.0);
        assert_approx(reconciler.resolve_total_fit_out_cost(), 180_000.0);
    }

    #[test]
    fn authoritative_edit_recomputes_immediately() {
        let mut reconciler = per_net_area(150.0);
        reconciler.on_area_changed(1_000.0, 1_050.0);
        reconciler.set_focus(Some(FitOutField::PerNetArea));

        assert!(reconciler.on_field_edited(FitOutField::PerNetArea, 200.0));

        let snapshot = reconciler.snapshot();
        assert_approx(snapshot.per_net_area_rate, 200.0);
        assert_approx(snapshot.total_amount, 200_000.0);
        assert_approx(snapshot.per_gross_area_rate, 200_000.0 / 1_050.0);
    }

    #[test]
    fn non_authoritative_edit_is_ignored() {
        let mut reconciler = per_net_area(150.0);
        reconciler.on_area_changed(1_000.0, 1_050.0);
        let before = reconciler.snapshot();

        assert!(!reconciler.on_field_edited(FitOutField::Total, 1.0));
        assert_eq!(reconciler.snapshot(), before);
    }

    #[test]
    fn negative_and_nan_edits_are_clamped() {
        let mut reconciler = per_net_area(150.0);
        reconciler.on_area_changed(1_000.0, 1_050.0);

        reconciler.on_field_edited(FitOutField::PerNetArea, -20.0);
        assert_eq!(reconciler.resolve_total_fit_out_cost(), 0.0);

        reconciler.on_field_edited(FitOutField::PerNetArea, f64::NAN);
        assert_eq!(reconciler.resolve_total_fit_out_cost(), 0.0);
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_per_net_round_trip_survives_mode_switch(
            rate_cents in 0u32..100_000,
            net_area in 1u32..50_000,
            add_on_bp in 0u32..5_000
        ) {
            let rate = rate_cents as f64 / 100.0;
            let net = net_area as f64;
            let gross = net * (1.0 + add_on_bp as f64 / 10_000.0);

            let mut reconciler = per_net_area(rate);
            reconciler.on_area_changed(net, gross);
            let total = reconciler.resolve_total_fit_out_cost();
            let tol = 1e-9 * total.max(1.0);

            prop_assert!((total - rate * net).abs() <= tol);
            prop_assert!((reconciler.snapshot().per_gross_area_rate - total / gross).abs() <= tol);

            for mode in [FitOutMode::PerGrossArea, FitOutMode::Total] {
                reconciler.set_mode(mode);
                prop_assert!((reconciler.resolve_total_fit_out_cost() - total).abs() <= tol);
            }
        }
    }
}
