//! Reorder engine tests
//!
//! Covers the derivation pipeline contracts:
//! - status and reorder-quantity rules
//! - demand-window mapping (ALL aliases 15D)
//! - filter commutativity and stability
//! - sort stability and toggle semantics
//! - KPI aggregation ("unknown" average vs zero)

use proptest::prelude::*;

use shared::engine::{self, CRITICAL_DOS_THRESHOLD};
use shared::models::{
    DemandWindow, DerivedRow, ReorderFilter, ReorderRow, SortDir, SortKey, StatusFilter,
    StockStatus, ViewState, FILTER_ALL,
};

fn row(warehouse: &str, brand: &str, product: &str, stock: f64, drr_15d: Option<f64>) -> ReorderRow {
    ReorderRow {
        warehouse: warehouse.to_string(),
        product_name: product.to_string(),
        brand: brand.to_string(),
        current_stock: stock,
        drr_7d: None,
        drr_15d,
        drr_30d: None,
        drr_ytd: None,
    }
}

fn raw_of(derived: &[DerivedRow]) -> Vec<ReorderRow> {
    derived.iter().map(|d| d.row.clone()).collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_status_examples() {
        // stock=0, any drr -> CRITICAL
        let d = engine::derive(&[row("W", "B", "P", 0.0, Some(5.0))], DemandWindow::All);
        assert_eq!(d[0].status, StockStatus::Critical);

        // stock=100, drr=5 -> dos=20 -> HEALTHY
        let d = engine::derive(&[row("W", "B", "P", 100.0, Some(5.0))], DemandWindow::All);
        assert_eq!(d[0].dos, Some(20.0));
        assert_eq!(d[0].status, StockStatus::Healthy);
    }

    #[test]
    fn test_reorder_qty_zero_above_seven_days() {
        // stock=50, drr=5 -> dos=10 -> no reorder
        let d = engine::derive(&[row("W", "B", "P", 50.0, Some(5.0))], DemandWindow::All);
        assert_eq!(d[0].dos, Some(10.0));
        assert_eq!(d[0].reorder_qty, 0);
    }

    #[test]
    fn test_reorder_formula() {
        // stock=10, drr=10 -> dos=1 -> ceil(10*15 - 10) = 140
        let d = engine::derive(&[row("W", "B", "P", 10.0, Some(10.0))], DemandWindow::All);
        assert_eq!(d[0].reorder_qty, 140);
    }

    #[test]
    fn test_all_window_maps_to_fifteen_day() {
        let r = ReorderRow {
            drr_7d: Some(1.0),
            drr_15d: Some(2.0),
            drr_30d: Some(3.0),
            drr_ytd: Some(4.0),
            ..row("W", "B", "P", 10.0, None)
        };
        let d = engine::derive(&[r], DemandWindow::All);
        assert_eq!(d[0].effective_drr, Some(2.0));
    }

    #[test]
    fn test_each_window_selects_its_own_rate() {
        let r = ReorderRow {
            drr_7d: Some(1.0),
            drr_15d: Some(2.0),
            drr_30d: Some(3.0),
            drr_ytd: Some(4.0),
            ..row("W", "B", "P", 10.0, None)
        };
        for (window, expected) in [
            (DemandWindow::SevenDay, 1.0),
            (DemandWindow::FifteenDay, 2.0),
            (DemandWindow::ThirtyDay, 3.0),
            (DemandWindow::Ytd, 4.0),
        ] {
            let d = engine::derive(std::slice::from_ref(&r), window);
            assert_eq!(d[0].effective_drr, Some(expected));
        }
    }

    #[test]
    fn test_zero_drr_gives_unknown_dos() {
        let d = engine::derive(&[row("W", "B", "P", 10.0, Some(0.0))], DemandWindow::All);
        assert_eq!(d[0].dos, None);
        assert_eq!(d[0].reorder_qty, 0);
    }

    #[test]
    fn test_avg_dos_unavailable_when_no_row_has_one() {
        let d = engine::derive(
            &[
                row("W", "B", "P1", 5.0, None),
                row("W", "B", "P2", 8.0, Some(0.0)),
            ],
            DemandWindow::All,
        );
        let summary = engine::summarize(&d);
        assert_eq!(summary.avg_dos, None);
        assert_eq!(summary.total_count, 2);
    }

    #[test]
    fn test_avg_dos_averages_only_known_rows() {
        let d = engine::derive(
            &[
                row("W", "B", "P1", 100.0, Some(10.0)), // dos = 10
                row("W", "B", "P2", 5.0, None),         // unknown, excluded
                row("W", "B", "P3", 100.0, Some(5.0)),  // dos = 20
            ],
            DemandWindow::All,
        );
        assert_eq!(engine::summarize(&d).avg_dos, Some(15.0));
    }

    #[test]
    fn test_search_below_three_chars_is_no_op() {
        let d = engine::derive(
            &[row("W", "B", "Blue Widget", 5.0, Some(1.0))],
            DemandWindow::All,
        );
        let view = ViewState {
            search: "xq".to_string(),
            ..ViewState::default()
        };
        assert_eq!(engine::filter(d, &view).len(), 1);
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let d = engine::derive(
            &[
                row("W", "B", "Blue Widget", 5.0, Some(1.0)),
                row("W", "B", "Red Gadget", 5.0, Some(1.0)),
            ],
            DemandWindow::All,
        );
        let view = ViewState {
            search: "WIDG".to_string(),
            ..ViewState::default()
        };
        let filtered = engine::filter(d, &view);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].row.product_name, "Blue Widget");
    }

    #[test]
    fn test_search_matches_mid_string_not_just_prefix() {
        let d = engine::derive(
            &[row("W", "B", "Blue Widget", 5.0, Some(1.0))],
            DemandWindow::All,
        );
        let view = ViewState {
            search: "idget".to_string(),
            ..ViewState::default()
        };
        assert_eq!(engine::filter(d, &view).len(), 1);
    }

    #[test]
    fn test_reorder_only_filter() {
        let d = engine::derive(
            &[
                row("W", "B", "Low", 10.0, Some(10.0)),  // reorder 140
                row("W", "B", "Fine", 100.0, Some(5.0)), // reorder 0
            ],
            DemandWindow::All,
        );
        let view = ViewState {
            reorder: ReorderFilter::ReorderOnly,
            ..ViewState::default()
        };
        let filtered = engine::filter(d, &view);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].row.product_name, "Low");
    }

    #[test]
    fn test_sort_all_ties_keeps_original_order() {
        let mut d = engine::derive(
            &[
                row("W", "B", "First", 5.0, Some(1.0)),
                row("W", "B", "Second", 5.0, Some(1.0)),
                row("W", "B", "Third", 5.0, Some(1.0)),
            ],
            DemandWindow::All,
        );
        engine::sort(&mut d, Some(SortKey::CurrentStock), SortDir::Asc);
        let names: Vec<&str> = d.iter().map(|r| r.row.product_name.as_str()).collect();
        assert_eq!(names, ["First", "Second", "Third"]);
    }

    #[test]
    fn test_toggle_same_key_flips_direction() {
        let mut view = ViewState::default();
        engine::toggle_sort(&mut view, SortKey::Dos);
        assert_eq!(view.sort_key, Some(SortKey::Dos));
        assert_eq!(view.sort_dir, SortDir::Asc);

        engine::toggle_sort(&mut view, SortKey::Dos);
        assert_eq!(view.sort_dir, SortDir::Desc);

        // a new key resets to ascending
        engine::toggle_sort(&mut view, SortKey::ReorderQty);
        assert_eq!(view.sort_key, Some(SortKey::ReorderQty));
        assert_eq!(view.sort_dir, SortDir::Asc);
    }

    #[test]
    fn test_toggling_twice_restores_ascending_on_original_input() {
        let raw = vec![
            row("W", "B", "C-prod", 3.0, Some(1.0)),
            row("W", "B", "A-prod", 1.0, Some(1.0)),
            row("W", "B", "B-prod", 2.0, Some(1.0)),
        ];
        let mut view = ViewState::default();
        engine::toggle_sort(&mut view, SortKey::ProductName);
        engine::toggle_sort(&mut view, SortKey::ProductName);
        engine::toggle_sort(&mut view, SortKey::ProductName);

        // asc -> desc -> asc; each recomputation starts from the raw set, so
        // the result equals a single ascending sort, not a cumulative artifact
        let (after_toggles, _) = engine::view(&raw, &view);
        let mut expected = engine::derive(&raw, view.window);
        engine::sort(&mut expected, Some(SortKey::ProductName), SortDir::Asc);
        assert_eq!(after_toggles, expected);
    }

    #[test]
    fn test_null_sorts_as_zero_in_comparator() {
        let mut d = engine::derive(
            &[
                row("W", "B", "Known", 100.0, Some(10.0)), // dos = 10
                row("W", "B", "Unknown", 100.0, None),     // dos = None, sorts as 0
            ],
            DemandWindow::All,
        );
        engine::sort(&mut d, Some(SortKey::Dos), SortDir::Asc);
        assert_eq!(d[0].row.product_name, "Unknown");
    }

    #[test]
    fn test_pipeline_derives_before_filtering() {
        // a status filter over the full view only makes sense because derive
        // ran on the complete row set first
        let raw = vec![
            row("W1", "B", "Critical item", 0.0, Some(1.0)),
            row("W2", "B", "Healthy item", 100.0, Some(1.0)),
        ];
        let view = ViewState {
            status: StatusFilter::Critical,
            ..ViewState::default()
        };
        let (rows, summary) = engine::view(&raw, &view);
        assert_eq!(rows.len(), 1);
        assert_eq!(summary.critical_count, 1);
        assert_eq!(summary.total_count, 1);
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    fn arb_drr() -> impl Strategy<Value = Option<f64>> {
        prop_oneof![Just(None), (0.0f64..50.0).prop_map(Some)]
    }

    prop_compose! {
        fn arb_row()(
            warehouse in prop_oneof![Just("WH-A"), Just("WH-B"), Just("WH-C")],
            brand in prop_oneof![Just("Brand-X"), Just("Brand-Y")],
            product in "[a-z]{3,12}",
            stock in 0.0f64..1000.0,
            drr_7d in arb_drr(),
            drr_15d in arb_drr(),
            drr_30d in arb_drr(),
            drr_ytd in arb_drr(),
        ) -> ReorderRow {
            ReorderRow {
                warehouse: warehouse.to_string(),
                product_name: product,
                brand: brand.to_string(),
                current_stock: stock,
                drr_7d,
                drr_15d,
                drr_30d,
                drr_ytd,
            }
        }
    }

    proptest! {
        /// status == CRITICAL iff stock <= 0 or (dos known and dos < 7)
        #[test]
        fn prop_status_rule(rows in prop::collection::vec(arb_row(), 1..40)) {
            for d in engine::derive(&rows, DemandWindow::All) {
                let expected_critical = d.row.current_stock <= 0.0
                    || d.dos.map(|v| v < CRITICAL_DOS_THRESHOLD).unwrap_or(false);
                prop_assert_eq!(d.status == StockStatus::Critical, expected_critical);
            }
        }

        /// reorder_qty == 0 whenever drr or dos is unknown, or dos > 7
        #[test]
        fn prop_reorder_qty_gating(rows in prop::collection::vec(arb_row(), 1..40)) {
            for d in engine::derive(&rows, DemandWindow::All) {
                let gated = d.effective_drr.is_none()
                    || d.dos.is_none()
                    || d.dos.map(|v| v > CRITICAL_DOS_THRESHOLD).unwrap_or(false);
                if gated {
                    prop_assert_eq!(d.reorder_qty, 0);
                }
            }
        }

        /// derive never panics and yields one output per input, in order
        #[test]
        fn prop_derive_is_total_and_order_preserving(
            rows in prop::collection::vec(arb_row(), 0..40),
            window in prop_oneof![
                Just(DemandWindow::All),
                Just(DemandWindow::SevenDay),
                Just(DemandWindow::FifteenDay),
                Just(DemandWindow::ThirtyDay),
                Just(DemandWindow::Ytd),
            ],
        ) {
            let derived = engine::derive(&rows, window);
            prop_assert_eq!(derived.len(), rows.len());
            for (d, r) in derived.iter().zip(&rows) {
                prop_assert_eq!(&d.row, r);
            }
        }

        /// warehouse-then-brand filtering equals brand-then-warehouse
        #[test]
        fn prop_filter_commutes(
            rows in prop::collection::vec(arb_row(), 0..40),
            warehouse in prop_oneof![Just(FILTER_ALL), Just("WH-A"), Just("WH-B")],
            brand in prop_oneof![Just(FILTER_ALL), Just("Brand-X"), Just("Brand-Y")],
        ) {
            let derived = engine::derive(&rows, DemandWindow::All);

            let warehouse_only = ViewState {
                warehouse: warehouse.to_string(),
                ..ViewState::default()
            };
            let brand_only = ViewState {
                brand: brand.to_string(),
                ..ViewState::default()
            };

            let wh_then_brand =
                engine::filter(engine::filter(derived.clone(), &warehouse_only), &brand_only);
            let brand_then_wh =
                engine::filter(engine::filter(derived.clone(), &brand_only), &warehouse_only);

            prop_assert_eq!(wh_then_brand, brand_then_wh);
        }

        /// filtering preserves the input's relative order
        #[test]
        fn prop_filter_is_stable(
            rows in prop::collection::vec(arb_row(), 0..40),
            warehouse in prop_oneof![Just(FILTER_ALL), Just("WH-A")],
        ) {
            let derived = engine::derive(&rows, DemandWindow::All);
            let view = ViewState {
                warehouse: warehouse.to_string(),
                ..ViewState::default()
            };
            let filtered = engine::filter(derived.clone(), &view);

            // the filtered set is a subsequence of the input
            let mut cursor = derived.iter();
            for kept in &filtered {
                prop_assert!(cursor.any(|d| d == kept));
            }
        }

        /// re-deriving the raw fields of a derived set changes nothing
        #[test]
        fn prop_derive_is_idempotent(rows in prop::collection::vec(arb_row(), 0..40)) {
            let once = engine::derive(&rows, DemandWindow::ThirtyDay);
            let twice = engine::derive(&raw_of(&once), DemandWindow::ThirtyDay);
            prop_assert_eq!(once, twice);
        }

        /// summary counts always agree with the row set they describe
        #[test]
        fn prop_summary_consistency(rows in prop::collection::vec(arb_row(), 0..40)) {
            let derived = engine::derive(&rows, DemandWindow::All);
            let summary = engine::summarize(&derived);

            prop_assert_eq!(summary.total_count, derived.len());
            prop_assert!(summary.critical_count <= summary.total_count);
            if derived.iter().all(|d| d.dos.is_none()) {
                prop_assert_eq!(summary.avg_dos, None);
            } else {
                prop_assert!(summary.avg_dos.is_some());
            }
        }

        /// sorting twice in the same direction is a fixpoint (stability)
        #[test]
        fn prop_sort_is_stable_fixpoint(rows in prop::collection::vec(arb_row(), 0..40)) {
            let derived = engine::derive(&rows, DemandWindow::All);
            let mut once = derived.clone();
            engine::sort(&mut once, Some(SortKey::CurrentStock), SortDir::Asc);
            let mut twice = once.clone();
            engine::sort(&mut twice, Some(SortKey::CurrentStock), SortDir::Asc);
            prop_assert_eq!(once, twice);
        }
    }
}
