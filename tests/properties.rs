// Universal properties of the three engines, checked with proptest.

use proptest::prelude::*;

use fractal_kernel::{
    compute_consensus, consensus_to_multiplier, resolve, Blocker, DecisionKernel, Direction,
    Horizon, HorizonSignal, KernelConfig, ResolveInput, TradeMode,
};

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![
        Just(Direction::Up),
        Just(Direction::Down),
        Just(Direction::Flat)
    ]
}

fn signal() -> impl Strategy<Value = HorizonSignal> {
    (direction(), 0.0..=1.0f64, 0.0..=1.0f64, 0.0..=1.0f64).prop_map(|(d, conf, rel, risk)| {
        let mut s = HorizonSignal::new(d, conf, rel);
        s.phase_risk = risk;
        s
    })
}

fn unblocked_input() -> impl Strategy<Value = ResolveInput> {
    (
        proptest::collection::vec(signal(), 6),
        0.0..=1.0f64,
        0.0..=1.0f64,
    )
        .prop_map(|(signals, global_entropy, mc_p95_dd)| ResolveInput {
            horizons: Horizon::ALL.into_iter().zip(signals).collect(),
            global_entropy,
            mc_p95_dd,
        })
}

fn blocker() -> impl Strategy<Value = Blocker> {
    proptest::sample::select(Blocker::ALL.to_vec())
}

fn any_input() -> impl Strategy<Value = ResolveInput> {
    (
        unblocked_input(),
        proptest::collection::vec(proptest::option::of(blocker()), 6),
    )
        .prop_map(|(mut input, blockers)| {
            for (h, b) in Horizon::ALL.into_iter().zip(blockers) {
                if let (Some(b), Some(s)) = (b, input.horizons.get_mut(&h)) {
                    s.blockers.insert(b);
                }
            }
            input
        })
}

fn mirrored(input: &ResolveInput) -> ResolveInput {
    let mut out = input.clone();
    for s in out.horizons.values_mut() {
        s.direction = s.direction.opposite();
    }
    out
}

proptest! {
    #[test]
    fn outputs_stay_in_range(input in any_input()) {
        let cfg = KernelConfig::default();
        let r = resolve(&input, &cfg).unwrap();
        prop_assert!((0.0..=1.0).contains(&r.final_decision.size_multiplier));
        prop_assert!((0.0..=1.0).contains(&r.bias.strength));
        prop_assert!((0.0..=1.0).contains(&r.timing.strength));

        let report = DecisionKernel::new(cfg).unwrap().evaluate(&input).unwrap();
        let c = &report.decision_kernel.consensus.result;
        prop_assert!((0.0..=1.0).contains(&c.score));
        prop_assert!((c.score + c.dispersion - 1.0).abs() < 1e-12);
        let k = &report.decision_kernel.conflict.result;
        prop_assert!((0.0..=1.0).contains(&k.structure_vs_timing.divergence_score));
        prop_assert!((0.0..=1.0).contains(&k.sizing_penalty));
    }

    #[test]
    fn more_regime_risk_never_sizes_up(
        input in unblocked_input(),
        de in 0.01..=0.5f64,
        dd in 0.01..=0.5f64,
    ) {
        let cfg = KernelConfig::default();
        let base = resolve(&input, &cfg).unwrap().final_decision.size_multiplier;

        let mut noisier = input.clone();
        noisier.global_entropy = (input.global_entropy + de).min(1.0);
        let mut fatter = input.clone();
        fatter.mc_p95_dd = (input.mc_p95_dd + dd).min(1.0);

        for (bumped, moved) in [
            (noisier.clone(), noisier.global_entropy > input.global_entropy),
            (fatter.clone(), fatter.mc_p95_dd > input.mc_p95_dd),
        ] {
            let size = resolve(&bumped, &cfg).unwrap().final_decision.size_multiplier;
            prop_assert!(size <= base);
            if moved && base > 0.0 {
                prop_assert!(size < base);
            }
        }
    }

    #[test]
    fn any_timing_blocker_forces_hold(
        input in unblocked_input(),
        which in 0usize..3,
        b in blocker(),
    ) {
        let mut input = input;
        let h = [Horizon::D7, Horizon::D14, Horizon::D30][which];
        if let Some(s) = input.horizons.get_mut(&h) {
            s.blockers.insert(b);
        }
        let r = resolve(&input, &KernelConfig::default()).unwrap();
        prop_assert_eq!(r.timing.action, Direction::Flat);
        prop_assert_eq!(r.final_decision.action, Direction::Flat);
        prop_assert_eq!(r.final_decision.mode, TradeMode::Hold);
        prop_assert_eq!(r.final_decision.size_multiplier, 0.0);
        prop_assert!(r.final_decision.reason.starts_with("blocked:"));
    }

    #[test]
    fn consensus_is_symmetric(input in any_input()) {
        let cfg = KernelConfig::default();
        let a = compute_consensus(&input.horizons, &cfg.consensus).unwrap();
        prop_assume!((a.buy_weight - a.sell_weight).abs() > 1e-9);
        prop_assume!((a.buy_weight.max(a.sell_weight) - a.hold_weight).abs() > 1e-9);

        let b = compute_consensus(&mirrored(&input).horizons, &cfg.consensus).unwrap();
        prop_assert_eq!(b.dir, a.dir.opposite());
        prop_assert_eq!(b.score, a.score);
        prop_assert_eq!(b.dispersion, a.dispersion);
        prop_assert_eq!(b.buy_weight, a.sell_weight);
    }

    #[test]
    fn resolver_mirrors_direction(input in unblocked_input()) {
        let cfg = KernelConfig::default();
        let a = resolve(&input, &cfg).unwrap();
        let b = resolve(&mirrored(&input), &cfg).unwrap();
        prop_assert_eq!(b.final_decision.mode, a.final_decision.mode);
        prop_assert_eq!(b.final_decision.action, a.final_decision.action.opposite());
        prop_assert!((b.final_decision.size_multiplier - a.final_decision.size_multiplier).abs() < 1e-12);
    }

    #[test]
    fn evaluation_is_idempotent(input in any_input()) {
        let kernel = DecisionKernel::new(KernelConfig::default()).unwrap();
        prop_assert_eq!(kernel.resolve(&input).unwrap(), kernel.resolve(&input).unwrap());
        prop_assert_eq!(kernel.evaluate(&input).unwrap(), kernel.evaluate(&input).unwrap());
    }

    #[test]
    fn conflict_level_grows_with_entropy(input in unblocked_input(), de in 0.0..=0.5f64) {
        let kernel = DecisionKernel::new(KernelConfig::default()).unwrap();
        let mut noisier = input.clone();
        noisier.global_entropy = (input.global_entropy + de).min(1.0);
        let calm = kernel.evaluate(&input).unwrap().decision_kernel.conflict.result;
        let noisy = kernel.evaluate(&noisier).unwrap().decision_kernel.conflict.result;
        prop_assert!(noisy.level >= calm.level);
        prop_assert!(noisy.sizing_penalty >= calm.sizing_penalty);
    }

    #[test]
    fn consensus_multiplier_is_monotone(a in 0.0..=1.0f64, b in 0.0..=1.0f64) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let curve = KernelConfig::default().multipliers.consensus_curve;
        prop_assert!(consensus_to_multiplier(lo, &curve) <= consensus_to_multiplier(hi, &curve));
    }
}
