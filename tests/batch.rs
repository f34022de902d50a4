// Batch scoring over the tokio blocking pool.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use fractal_kernel::batch::{score_batch, BatchOutcome, BatchRequest, InstrumentRequest};
use fractal_kernel::derive::{DrawdownStats, ForwardStats, ReturnStats};
use fractal_kernel::{
    DecisionKernel, Direction, Horizon, HorizonSignal, HorizonStats, KernelConfig, ResolveInput,
};

fn kernel() -> Arc<DecisionKernel> {
    Arc::new(DecisionKernel::new(KernelConfig::default()).unwrap())
}

fn long_input() -> ResolveInput {
    ResolveInput {
        horizons: Horizon::ALL
            .into_iter()
            .map(|h| (h, HorizonSignal::new(Direction::Up, 0.6, 0.8)))
            .collect(),
        global_entropy: 0.2,
        mc_p95_dd: 0.3,
    }
}

fn bullish_stats() -> BTreeMap<Horizon, HorizonStats> {
    Horizon::ALL
        .into_iter()
        .map(|h| {
            (
                h,
                HorizonStats {
                    forward_stats: Some(ForwardStats {
                        returns: ReturnStats {
                            mean: 0.06,
                            p10: -0.02,
                            p50: 0.08,
                            p90: 0.14,
                        },
                        drawdown: DrawdownStats { p95: 0.2 },
                    }),
                    match_count: 20,
                },
            )
        })
        .collect()
}

#[tokio::test]
async fn outcomes_keep_request_order() {
    let mut broken = long_input();
    broken.horizons.remove(&Horizon::D7);

    let requests = vec![
        InstrumentRequest {
            symbol: "BTCUSD".into(),
            input: Some(long_input()),
            forward_stats: None,
        },
        InstrumentRequest {
            symbol: "SPX".into(),
            input: Some(broken),
            forward_stats: None,
        },
        InstrumentRequest {
            symbol: "DXY".into(),
            input: None,
            forward_stats: Some(bullish_stats()),
        },
    ];

    let outcomes = score_batch(kernel(), requests).await;
    let symbols: Vec<&str> = outcomes.iter().map(|o| o.symbol()).collect();
    assert_eq!(symbols, ["BTCUSD", "SPX", "DXY"]);

    match &outcomes[0] {
        BatchOutcome::Scored(env) => {
            let f = &env.report.resolver.final_decision;
            assert_eq!(f.action, Direction::Up);
            assert!(f.size_multiplier > 0.0);
        }
        BatchOutcome::Failed { error, .. } => panic!("unexpected failure: {error}"),
    }
    match &outcomes[1] {
        BatchOutcome::Failed { error, .. } => assert!(error.contains("7d")),
        BatchOutcome::Scored(_) => panic!("missing horizon was scored"),
    }
    match &outcomes[2] {
        BatchOutcome::Scored(env) => {
            assert_eq!(env.report.structure.global_bias, Direction::Up);
            assert_eq!(env.report.horizon_matrix.len(), 6);
        }
        BatchOutcome::Failed { error, .. } => panic!("unexpected failure: {error}"),
    }
}

#[tokio::test]
async fn empty_batch_is_empty() {
    assert!(score_batch(kernel(), Vec::new()).await.is_empty());
}

#[tokio::test]
async fn loads_batch_file_and_serialises_outcomes() {
    let request = BatchRequest {
        instruments: vec![InstrumentRequest {
            symbol: "ETHUSD".into(),
            input: Some(long_input()),
            forward_stats: None,
        }],
    };
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(serde_json::to_string(&request).unwrap().as_bytes())
        .unwrap();

    let loaded = BatchRequest::load(file.path()).unwrap();
    let outcomes = score_batch(kernel(), loaded.instruments).await;
    let v = serde_json::to_value(&outcomes).unwrap();
    assert_eq!(v[0]["symbol"], "ETHUSD");
    assert!(v[0]["id"].is_string());
    assert_eq!(v[0]["report"]["resolver"]["final"]["action"], "BUY");
}

#[test]
fn unreadable_batch_file_is_an_error() {
    let err = BatchRequest::load("/definitely/not/here.json").unwrap_err();
    assert!(err.to_string().contains("Failed to read batch file"));
}
