// End-to-end decision scenarios over the public API.

use fractal_kernel::{
    resolve, Blocker, ConflictLevel, DecisionKernel, Direction, Horizon, HorizonSignal,
    KernelConfig, KernelError, ResolveInput, TradeMode,
};

fn input(dirs: [(Direction, f64); 6]) -> ResolveInput {
    let horizons = Horizon::ALL
        .into_iter()
        .zip(dirs)
        .map(|(h, (d, conf))| {
            let mut s = HorizonSignal::new(d, conf, 0.75);
            s.phase_risk = 0.1;
            (h, s)
        })
        .collect();
    ResolveInput {
        horizons,
        global_entropy: 0.3,
        mc_p95_dd: 0.35,
    }
}

const HOLD: (Direction, f64) = (Direction::Flat, 0.5);

fn conflict_input() -> ResolveInput {
    input([
        (Direction::Up, 0.4),
        (Direction::Up, 0.45),
        (Direction::Up, 0.5),
        HOLD,
        (Direction::Down, 0.6),
        (Direction::Down, 0.7),
    ])
}

fn agreement_input(dir: Direction) -> ResolveInput {
    input([
        (dir, 0.4),
        (dir, 0.45),
        (dir, 0.5),
        (dir, 0.55),
        (dir, 0.6),
        (dir, 0.7),
    ])
}

fn cfg() -> KernelConfig {
    KernelConfig::default()
}

#[test]
fn conflict_scenario_is_counter_trend_and_small() {
    let r = resolve(&conflict_input(), &cfg()).unwrap();
    assert_eq!(r.bias.dir, Direction::Down);
    assert_eq!(r.timing.action, Direction::Up);
    assert_eq!(r.final_decision.mode, TradeMode::CounterTrend);
    assert_eq!(r.final_decision.action, Direction::Up);
    assert!(r.final_decision.size_multiplier < 0.3);
    assert!(r.final_decision.size_multiplier > 0.0);
    assert_eq!(r.final_decision.reason, "counter_trend:structure_bear_timing_bull");
}

#[test]
fn agreement_scenario_follows_the_trend() {
    let r = resolve(&agreement_input(Direction::Up), &cfg()).unwrap();
    assert_eq!(r.bias.dir, Direction::Up);
    assert_eq!(r.timing.action, Direction::Up);
    assert_eq!(r.final_decision.mode, TradeMode::TrendFollow);
    assert_eq!(r.final_decision.action, Direction::Up);
    assert!(r.final_decision.size_multiplier > 0.1);
}

#[test]
fn all_bearish_mirrors_agreement() {
    let bull = resolve(&agreement_input(Direction::Up), &cfg()).unwrap();
    let bear = resolve(&agreement_input(Direction::Down), &cfg()).unwrap();
    assert_eq!(bear.bias.dir, Direction::Down);
    assert_eq!(bear.timing.action, Direction::Down);
    assert_eq!(bear.final_decision.mode, TradeMode::TrendFollow);
    assert_eq!(bear.final_decision.action, Direction::Down);
    assert!((bear.final_decision.size_multiplier - bull.final_decision.size_multiplier).abs() < 1e-12);

    let v = serde_json::to_value(&bear).unwrap();
    assert_eq!(v["bias"]["dir"], "BEAR");
    assert_eq!(v["timing"]["action"], "EXIT");
    assert_eq!(v["final"]["action"], "SELL");
}

#[test]
fn neutral_bias_enters_at_reduced_size() {
    let r = resolve(
        &input([
            (Direction::Up, 0.6),
            (Direction::Up, 0.6),
            (Direction::Up, 0.6),
            HOLD,
            HOLD,
            HOLD,
        ]),
        &cfg(),
    )
    .unwrap();
    assert_eq!(r.bias.dir, Direction::Flat);
    assert_eq!(r.final_decision.mode, TradeMode::TrendFollow);
    assert_eq!(r.final_decision.action, Direction::Up);
    assert!(r.final_decision.size_multiplier < 0.5);
    assert_eq!(r.final_decision.reason, "neutral_bias:timing_bull");
}

#[test]
fn a_timing_blocker_forces_hold() {
    let mut i = agreement_input(Direction::Up);
    i.horizons
        .get_mut(&Horizon::D14)
        .unwrap()
        .blockers
        .insert(Blocker::HighEntropy);
    let r = resolve(&i, &cfg()).unwrap();
    assert_eq!(r.timing.action, Direction::Flat);
    assert_eq!(r.timing.blockers, vec![Blocker::HighEntropy]);
    assert_eq!(r.final_decision.action, Direction::Flat);
    assert_eq!(r.final_decision.mode, TradeMode::Hold);
    assert_eq!(r.final_decision.size_multiplier, 0.0);
    assert_eq!(r.final_decision.reason, "blocked:HIGH_ENTROPY");
}

#[test]
fn a_structure_blocker_does_not_gate_timing() {
    let mut i = agreement_input(Direction::Up);
    i.horizons
        .get_mut(&Horizon::D365)
        .unwrap()
        .blockers
        .insert(Blocker::LowSample);
    let r = resolve(&i, &cfg()).unwrap();
    assert_eq!(r.timing.action, Direction::Up);
    assert_eq!(r.final_decision.mode, TradeMode::TrendFollow);
}

#[test]
fn risk_context_shrinks_size() {
    let calm = resolve(&agreement_input(Direction::Up), &cfg()).unwrap();
    let mut noisy = agreement_input(Direction::Up);
    noisy.global_entropy = 0.9;
    noisy.mc_p95_dd = 0.8;
    let noisy = resolve(&noisy, &cfg()).unwrap();
    assert!(noisy.final_decision.size_multiplier < calm.final_decision.size_multiplier);
    assert_eq!(noisy.final_decision.mode, calm.final_decision.mode);
}

#[test]
fn long_structure_outweighs_shorter_structure() {
    let r = resolve(
        &input([
            HOLD,
            HOLD,
            HOLD,
            HOLD,
            (Direction::Up, 0.5),
            (Direction::Down, 0.6),
        ]),
        &cfg(),
    )
    .unwrap();
    assert_eq!(r.bias.dir, Direction::Down);
    assert_eq!(r.bias.dominant_horizon, Horizon::D365);
}

#[test]
fn thirty_day_dominates_timing() {
    let r = resolve(
        &input([HOLD, HOLD, (Direction::Down, 0.3), HOLD, HOLD, HOLD]),
        &cfg(),
    )
    .unwrap();
    assert_eq!(r.timing.dominant_horizon, Horizon::D30);
    assert_eq!(r.timing.action, Direction::Down);
}

#[test]
fn contract_errors_are_typed() {
    let mut missing = conflict_input();
    missing.horizons.remove(&Horizon::D180);
    assert_eq!(
        resolve(&missing, &cfg()).unwrap_err(),
        KernelError::MissingHorizon {
            horizon: Horizon::D180
        }
    );

    let mut nan = conflict_input();
    nan.horizons.get_mut(&Horizon::D7).unwrap().confidence = f64::NAN;
    assert!(matches!(
        resolve(&nan, &cfg()).unwrap_err(),
        KernelError::InvalidRange { .. }
    ));
}

#[test]
fn accepts_wire_json() {
    let json = r#"{
        "horizons": {
            "7d":   {"horizon":"7d",  "dir":"LONG",  "confidence":0.4,  "reliability":0.75, "phaseRisk":0.1, "blockers":[]},
            "14d":  {"horizon":"14d", "dir":"LONG",  "confidence":0.45, "reliability":0.75, "phaseRisk":0.1, "blockers":[]},
            "30d":  {"horizon":"30d", "dir":"LONG",  "confidence":0.5,  "reliability":0.75, "phaseRisk":0.1, "blockers":[]},
            "90d":  {"horizon":"90d", "dir":"HOLD",  "confidence":0.5,  "reliability":0.75, "phaseRisk":0.1, "blockers":[]},
            "180d": {"horizon":"180d","dir":"SHORT", "confidence":0.6,  "reliability":0.75, "phaseRisk":0.1, "blockers":[]},
            "365d": {"horizon":"365d","dir":"SHORT", "confidence":0.7,  "reliability":0.75, "phaseRisk":0.1, "blockers":[]}
        },
        "globalEntropy": 0.3,
        "mcP95_DD": 0.35
    }"#;
    let parsed: ResolveInput = serde_json::from_str(json).unwrap();
    assert_eq!(parsed, conflict_input());
}

#[test]
fn kernel_report_carries_all_three_engines() {
    let kernel = DecisionKernel::new(cfg()).unwrap();
    let report = kernel.evaluate(&conflict_input()).unwrap();
    assert_eq!(report.resolver, resolve(&conflict_input(), &cfg()).unwrap());
    assert_eq!(report.decision_kernel.conflict.result.level, ConflictLevel::Major);
    assert_eq!(report.decision_kernel.consensus.result.votes.len(), 6);
    assert_eq!(report.horizon_matrix[0].horizon, Horizon::D7);
}
