// ==========================================
// Allocation calculator tests
// ==========================================
// Pure waterfall behavior over in-memory queue snapshots.
// ==========================================

#[cfg(test)]
mod allocation_calculator_test {
    use chrono::Utc;
    use production_core::domain::{MaterialReservation, ReservationStatus};
    use production_core::engine::allocation::AllocationError;
    use production_core::engine::AllocationCalculator;
    use production_core::repository::ReservationWithLot;

    fn entry(id: &str, lp_id: &str, reserved: f64, consumed: f64, seq: i64) -> ReservationWithLot {
        let now = Utc::now();
        ReservationWithLot {
            reservation: MaterialReservation {
                id: id.to_string(),
                org_id: "org-a".to_string(),
                wo_id: "wo-1".to_string(),
                lp_id: lp_id.to_string(),
                reserved_qty: reserved,
                consumed_qty: consumed,
                uom: "kg".to_string(),
                sequence_number: seq,
                status: if consumed >= reserved {
                    ReservationStatus::Exhausted
                } else {
                    ReservationStatus::Active
                },
                created_at: now,
                updated_at: now,
            },
            lp_number: format!("IN-{}", lp_id),
        }
    }

    #[test]
    fn test_waterfall_follows_sequence_order() {
        let queue = vec![
            entry("res-1", "lp-1", 30.0, 0.0, 10),
            entry("res-2", "lp-2", 20.0, 0.0, 20),
            entry("res-3", "lp-3", 50.0, 0.0, 30),
        ];

        let plan = AllocationCalculator::new().allocate(&queue, 40.0).unwrap();

        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].reservation_id, "res-1");
        assert_eq!(plan.lines[0].qty_drawn, 30.0);
        assert_eq!(plan.lines[1].reservation_id, "res-2");
        assert_eq!(plan.lines[1].qty_drawn, 10.0);
        assert_eq!(plan.total_drawn(), 40.0);
        assert!(!plan.is_over_consumption);
        assert_eq!(plan.remaining_unallocated, 0.0);
        assert_eq!(plan.total_reserved, 100.0);
        assert_eq!(plan.cumulative_after, 40.0);
    }

    #[test]
    fn test_partially_consumed_reservations_offer_only_their_remainder() {
        let queue = vec![
            entry("res-1", "lp-1", 30.0, 25.0, 10),
            entry("res-2", "lp-2", 20.0, 0.0, 20),
        ];

        let plan = AllocationCalculator::new().allocate(&queue, 15.0).unwrap();

        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[0].qty_drawn, 5.0);
        assert_eq!(plan.lines[1].qty_drawn, 10.0);
        assert_eq!(plan.cumulative_after, 40.0);
    }

    #[test]
    fn test_exhausted_reservations_are_skipped_without_a_line() {
        let queue = vec![
            entry("res-1", "lp-1", 30.0, 30.0, 10),
            entry("res-2", "lp-2", 20.0, 0.0, 20),
        ];

        let plan = AllocationCalculator::new().allocate(&queue, 10.0).unwrap();

        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].reservation_id, "res-2");
        assert_eq!(plan.lines[0].qty_drawn, 10.0);
    }

    #[test]
    fn test_over_consumption_reports_the_shortfall() {
        let queue = vec![entry("res-1", "lp-1", 100.0, 100.0, 10)];

        let plan = AllocationCalculator::new().allocate(&queue, 50.0).unwrap();

        assert!(plan.is_over_consumption);
        assert!(plan.lines.is_empty());
        assert_eq!(plan.remaining_unallocated, 50.0);
        assert_eq!(plan.total_reserved, 100.0);
        assert_eq!(plan.cumulative_after, 150.0);
    }

    #[test]
    fn test_invalid_quantity_is_rejected() {
        let queue = vec![entry("res-1", "lp-1", 30.0, 0.0, 10)];
        let calc = AllocationCalculator::new();

        assert!(matches!(
            calc.allocate(&queue, 0.0),
            Err(AllocationError::InvalidQuantity(_))
        ));
        assert!(matches!(
            calc.allocate(&queue, -5.0),
            Err(AllocationError::InvalidQuantity(_))
        ));
    }

    #[test]
    fn test_empty_queue_yields_a_fully_unallocated_plan() {
        let plan = AllocationCalculator::new().allocate(&[], 25.0).unwrap();

        assert!(plan.lines.is_empty());
        assert!(plan.is_over_consumption);
        assert_eq!(plan.remaining_unallocated, 25.0);
        assert_eq!(plan.total_reserved, 0.0);
    }

    #[test]
    fn test_same_snapshot_allocates_identically() {
        let queue = vec![
            entry("res-1", "lp-1", 10.0, 3.0, 10),
            entry("res-2", "lp-2", 40.0, 0.0, 20),
            entry("res-3", "lp-3", 5.0, 5.0, 30),
        ];
        let calc = AllocationCalculator::new();

        let a = calc.allocate(&queue, 30.0).unwrap();
        let b = calc.allocate(&queue, 30.0).unwrap();

        assert_eq!(a.lines.len(), b.lines.len());
        for (la, lb) in a.lines.iter().zip(b.lines.iter()) {
            assert_eq!(la.reservation_id, lb.reservation_id);
            assert_eq!(la.qty_drawn, lb.qty_drawn);
        }
    }

    #[test]
    fn test_confirmed_overdraw_widens_the_last_line() {
        let queue = vec![
            entry("res-1", "lp-1", 30.0, 0.0, 10),
            entry("res-2", "lp-2", 20.0, 0.0, 20),
        ];
        let calc = AllocationCalculator::new();

        let mut plan = calc.allocate(&queue, 60.0).unwrap();
        assert_eq!(plan.remaining_unallocated, 10.0);

        calc.absorb_confirmed_overdraw(&mut plan, &queue);

        assert_eq!(plan.remaining_unallocated, 0.0);
        assert_eq!(plan.lines.len(), 2);
        assert_eq!(plan.lines[1].reservation_id, "res-2");
        assert_eq!(plan.lines[1].qty_drawn, 30.0);
        assert_eq!(plan.total_drawn(), 60.0);
    }

    #[test]
    fn test_confirmed_overdraw_on_an_exhausted_queue_targets_the_last_entry() {
        let queue = vec![
            entry("res-1", "lp-1", 30.0, 30.0, 10),
            entry("res-2", "lp-2", 20.0, 20.0, 20),
        ];
        let calc = AllocationCalculator::new();

        let mut plan = calc.allocate(&queue, 15.0).unwrap();
        assert!(plan.lines.is_empty());

        calc.absorb_confirmed_overdraw(&mut plan, &queue);

        assert_eq!(plan.lines.len(), 1);
        assert_eq!(plan.lines[0].reservation_id, "res-2");
        assert_eq!(plan.lines[0].qty_drawn, 15.0);
    }
}
