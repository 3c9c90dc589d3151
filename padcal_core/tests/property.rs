use padcal_core::{
    convert_weight, select_for_center, CalibrationPosition, CalibrationRegistry, LinearModel,
    SelectionSettings,
};
use proptest::prelude::*;

fn position_strategy() -> impl Strategy<Value = (String, CalibrationPosition)> {
    (
        "[a-z]{1,8}",
        0.0f64..64.0,
        0.0f64..64.0,
        0.0f64..5000.0,
        -500.0f64..500.0,
        0.0f64..=1.0,
    )
        .prop_map(|(id, x, y, slope, intercept, r_squared)| {
            (
                id.clone(),
                CalibrationPosition {
                    name: id,
                    x,
                    y,
                    calibration: LinearModel {
                        slope,
                        intercept,
                        r_squared,
                        measurement_count: 1,
                        last_updated: String::new(),
                    },
                },
            )
        })
}

proptest! {
    // Selection is total: any centroid and any registry contents yield a
    // usable calibration with finite slope and intercept.
    #[test]
    fn selection_always_yields_usable_parameters(
        positions in proptest::collection::vec(position_strategy(), 0..6),
        cx in 0.0f64..64.0,
        cy in 0.0f64..64.0,
        max_distance in 0.0f64..100.0,
        min_r2 in 0.0f64..=1.0,
    ) {
        let mut registry = CalibrationRegistry::new(SelectionSettings {
            max_distance_threshold: max_distance,
            min_r_squared_threshold: min_r2,
            ..SelectionSettings::default()
        });
        for (id, p) in positions {
            registry.insert_position(id, p);
        }
        let sel = select_for_center(&registry, (cx, cy));
        prop_assert!(sel.slope.is_finite());
        prop_assert!(sel.intercept.is_finite());
        if let Some(id) = &sel.position_id {
            prop_assert!(registry.get(id).is_some());
        }
        if !sel.is_fallback {
            prop_assert!(sel.distance <= max_distance);
            prop_assert!(sel.r_squared >= min_r2);
        }
    }

    // Converted weights are never negative, tared or not.
    #[test]
    fn converted_weight_is_never_negative(
        pressure in 0.0f64..10.0,
        zero in proptest::option::of(0.0f64..10.0),
        slope in 0.0f64..5000.0,
        intercept in -500.0f64..500.0,
    ) {
        let registry = CalibrationRegistry::default();
        let mut sel = select_for_center(&registry, (1.0, 1.0));
        sel.slope = slope;
        sel.intercept = intercept;
        let r = convert_weight(pressure, zero, sel);
        prop_assert!(r.grams >= 0.0);
        prop_assert!(r.grams.is_finite());
    }

    // Tared conversion is translation invariant: shifting both the tare
    // point and the reading by the same offset leaves the weight unchanged.
    // Tare references are strictly positive; a zero reference means the
    // pad was quiet and the full model applies instead.
    #[test]
    fn tare_is_translation_invariant(
        net in 0.0f64..5.0,
        zero_a in 1e-6f64..5.0,
        zero_b in 1e-6f64..5.0,
        slope in 0.0f64..5000.0,
    ) {
        let registry = CalibrationRegistry::default();
        let mut sel = select_for_center(&registry, (1.0, 1.0));
        sel.slope = slope;
        let a = convert_weight(zero_a + net, Some(zero_a), sel.clone());
        let b = convert_weight(zero_b + net, Some(zero_b), sel);
        prop_assert!((a.grams - b.grams).abs() < 1e-6 * (1.0 + a.grams.abs()));
    }
}
