//! End-to-end scenarios: matched interfaces, free reflection and failure verdicts


use approx::assert_abs_diff_eq;
use stresswave::analysis::hydrostatic::StressExtremes;
use stresswave::domain::simulation::prepare;
use stresswave::prelude::*;
use test_utils::*;

fn params(duration: f64) -> SimulationParams {
    SimulationParams {
        time_step: DT,
        duration: Duration::Total(duration),
        execution: Execution::Serial,
    }
}

#[test]
fn test_matched_impedance_transmits_fully() {
    let specs = [soft(1.0), soft(2.0)];
    let initial = [InitialWave::new(0, Boundary::Start, Load::Stress(1.0))];
    let (mut engine, _) = prepare(&specs, &initial, &params(2.5)).unwrap();

    let c = *engine.table().boundary(0).unwrap();
    assert_eq!(c.transmit_forward, 1.0);
    assert_eq!(c.reflect_forward, 0.0);

    advance_by(&mut engine, 9);

    let left = engine.layers()[0].waves();
    let right = engine.layers()[1].waves();
    assert_eq!(left.len(), 1);
    assert_eq!(left[0].value, 0.0);
    assert_eq!(right.len(), 1);
    assert_eq!(right[0].value, 1.0);
    assert_eq!(right[0].direction, Direction::TowardEnd);

    // Nothing travels back: layer 0 keeps the incident stress and no more
    assert!(engine.layers()[0].mesh().iter().all(|&v| v == 0.0 || v == 1.0));
}

#[test]
fn test_single_layer_never_amplifies() {
    let specs = [soft(1.0)];
    let initial = [InitialWave::new(0, Boundary::Start, Load::Stress(1.0))];
    let result = simulate(&specs, &initial, &params(125.0)).unwrap();

    let layer = &result.layers[0];
    assert_eq!(layer.mesh().nrows(), 1000);
    assert!(max_abs(layer.mesh()) <= 1.0);
    assert_eq!(max_abs(layer.mesh()), 1.0);

    // The same single wave keeps bouncing with its full magnitude
    assert_eq!(layer.waves().len(), 1);
    assert_eq!(layer.waves()[0].value.abs(), 1.0);
}

#[test]
fn test_runs_are_deterministic() {
    let specs = [
        dense(2.0).with_relevance(false),
        stiff(1.5),
        soft(0.625),
        dense(3.0).with_tension_limit(5e7),
    ];
    let initial = impact(-436.0);
    let params = SimulationParams {
        time_step: DT,
        duration: Duration::Reverberations(3.0),
        execution: Execution::Serial,
    };

    let first = simulate(&specs, &initial, &params).unwrap();
    let second = simulate(&specs, &initial, &params).unwrap();
    let parallel = simulate(
        &specs,
        &initial,
        &SimulationParams {
            execution: Execution::Parallel,
            ..params.clone()
        },
    )
    .unwrap();

    for ((a, b), c) in first.layers.iter().zip(&second.layers).zip(&parallel.layers) {
        assert_eq!(a.mesh(), b.mesh());
        assert_eq!(a.mesh(), c.mesh());
    }
    assert_eq!(first.summary, second.summary);
    assert_eq!(first.evaluate(), second.evaluate());
}

#[test]
fn test_wave_count_stays_bounded() {
    let specs = [dense(2.0), stiff(1.5), soft(0.625), dense(3.0)];
    let result = simulate(&specs, &impact(-100.0), &params(200.0)).unwrap();

    let nodes: usize = result.layers.iter().map(|l| 2 * l.node_count()).sum();
    assert!(result.summary.merged > 0);
    assert!(result.summary.peak_waves <= nodes);
}

/// Three matched layers with Poisson ratio 0.5, so hydrostatic stress equals
/// the axial stress and the peak in layer 2 equals the applied stress
fn matched_stack(limit: f64) -> Vec<LayerSpec> {
    let spec = |h: f64| LayerSpec::new(h, 1e9, 1000.0, 0.0, 0.5);
    vec![
        spec(1.0).with_relevance(false),
        spec(1.5).with_relevance(false),
        spec(2.0).with_tension_limit(limit).with_compression_limit(limit),
    ]
}

#[test]
fn test_verdict_flips_at_the_limit() {
    let limit = 100e6;
    let run = |stress: f64| {
        let initial = [InitialWave::new(0, Boundary::Start, Load::Stress(stress))];
        simulate(&matched_stack(limit), &initial, &params(30.0))
            .unwrap()
            .evaluate()
            .unwrap()
    };

    assert!(run(0.99 * limit).is_pass());

    let verdict = run(1.01 * limit);
    assert!(!verdict.is_pass());
    assert_eq!(verdict.reasons().len(), 1);
    assert_eq!(verdict.reasons()[0].layer, 2);
    assert_eq!(verdict.reasons()[0].mode, FailureMode::Tension);
    assert!(verdict.to_string().contains("layer #2"));
}

#[test]
fn test_verdict_flips_in_mismatched_stack() {
    let limit = 250e6;
    let specs = |limit: f64| {
        vec![
            dense(1.0).with_relevance(false),
            stiff(2.0).with_relevance(false),
            soft(1.5).with_tension_limit(limit),
        ]
    };
    let run = |stress: f64| {
        let initial = [InitialWave::new(0, Boundary::Start, Load::Stress(stress))];
        simulate(&specs(limit), &initial, &params(40.0)).unwrap()
    };

    // The field is linear in the load, so a unit run gives the peak per pascal
    let unit = run(1.0);
    let extremes = StressExtremes::of(&unit.layers[2]);
    let peak = extremes.max_tension.max(-extremes.max_compression);
    assert!(peak > 0.0);

    assert!(run(0.99 * limit / peak).evaluate().unwrap().is_pass());

    let verdict = run(1.01 * limit / peak).evaluate().unwrap();
    let layers: Vec<usize> = verdict.reasons().iter().map(|r| r.layer).collect();
    assert_eq!(layers, vec![2]);
}

#[test]
fn test_missing_limit_is_not_a_failure() {
    let specs = [soft(1.0), soft(1.0).with_tension_limit(1.0), soft(1.0)];
    let initial = [InitialWave::new(0, Boundary::Start, Load::Stress(1e9))];
    let result = simulate(&specs, &initial, &params(10.0)).unwrap();

    assert_eq!(
        result.evaluate().unwrap_err(),
        WaveError::MissingThreshold { layer: 2 }
    );
}

#[test]
fn test_configuration_errors_surface_before_stepping() {
    let initial = [InitialWave::new(0, Boundary::Start, Load::Stress(1.0))];

    let err = simulate(&[], &initial, &params(1.0)).unwrap_err();
    assert_eq!(err, WaveError::EmptyStack);

    let err = simulate(&[soft(0.01)], &initial, &params(1.0)).unwrap_err();
    assert!(matches!(err, WaveError::CoarseTimeStep { .. }));

    let stray = [InitialWave::new(4, Boundary::End, Load::Stress(1.0))];
    let err = simulate(&[soft(1.0)], &stray, &params(1.0)).unwrap_err();
    assert!(err.is_configuration());

    let velocity = [InitialWave::new(0, Boundary::Start, Load::Velocity(10.0))];
    assert!(simulate(&[soft(1.0)], &velocity, &params(1.0)).is_err());
}

#[test]
fn test_snapped_thickness_and_contact_stress() {
    let specs = [soft(1.06), dense(2.0)];
    let result = simulate(&specs, &impact(-200.0), &params(1.0)).unwrap();

    // round(8.48) + 1 nodes of 0.125 mm
    assert_abs_diff_eq!(result.layers[0].thickness(), 1.125, epsilon = 1e-12);
    let expected = -200.0 / (1.0 / 1e6 + 1.0 / 4e6);
    assert_abs_diff_eq!(result.layers[1].mesh()[[0, 0]], expected, epsilon = 1e-6);
}
