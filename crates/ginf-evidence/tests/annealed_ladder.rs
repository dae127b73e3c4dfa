mod common;

use common::{path_graph, BlockModel, PairwiseDataModel};
use ginf_evidence::{
    default_ladder, log_evidence_annealed, log_evidence_annealed_labels, AnnealingRule, DEFAULT_LADDER_STEPS,
};
use ginf_graph::{GraphModel, LabelModel};
use ginf_mcmc::{LabelMcmcConfig, McmcConfig};

fn short_chain() -> McmcConfig {
    McmcConfig {
        n_sweeps: 8,
        n_steps: 4,
        ..McmcConfig::default()
    }
}

#[test]
fn constant_likelihood_integrates_to_the_constant() {
    let mut model = PairwiseDataModel::new(4, 3, -2.0, 1);
    let evidence =
        log_evidence_annealed(&mut model, &[0.0, 0.5, 1.0], &short_chain(), AnnealingRule::ThermodynamicIntegration)
            .unwrap();
    assert!((evidence + 2.0).abs() < 1e-12, "evidence = {evidence}");
}

#[test]
fn both_rules_agree_on_the_default_ladder_for_constant_likelihood() {
    let betas = default_ladder(DEFAULT_LADDER_STEPS);
    for rule in [AnnealingRule::ThermodynamicIntegration, AnnealingRule::SteppingStone] {
        let mut model = PairwiseDataModel::new(4, 3, -2.0, 9);
        let before = model.graph();
        let evidence = log_evidence_annealed(&mut model, &betas, &short_chain(), rule).unwrap();
        assert!((evidence + 2.0).abs() < 1e-9, "{rule}: {evidence}");
        assert_eq!(model.graph(), before);
    }
}

#[test]
fn every_segment_runs_the_configured_chain() {
    let mut model = PairwiseDataModel::new(4, 3, 0.0, 2).with_weight(0, 1, 1.0);
    let config = McmcConfig {
        burn: 5,
        ..short_chain()
    };
    log_evidence_annealed(&mut model, &[0.0, 0.25, 0.5, 1.0], &config, AnnealingRule::default()).unwrap();
    // One burn sweep plus eight observed sweeps per segment.
    assert_eq!(model.sweeps, 3 * 9);
}

#[test]
fn malformed_ladders_fail_before_sweeping() {
    let mut model = PairwiseDataModel::new(4, 3, 0.0, 2);
    let before = model.graph();
    let err = log_evidence_annealed(&mut model, &[0.0, 0.8], &short_chain(), AnnealingRule::default()).unwrap_err();
    assert_eq!(err.info().code, "invalid-ladder");
    let empty = McmcConfig {
        n_sweeps: 0,
        ..short_chain()
    };
    let err = log_evidence_annealed(&mut model, &[0.0, 1.0], &empty, AnnealingRule::default()).unwrap_err();
    assert_eq!(err.info().code, "empty-segment");
    assert_eq!(model.sweeps, 0);
    assert_eq!(model.graph(), before);
}

#[test]
fn labeled_annealing_restores_graph_and_labels() {
    let mut model = BlockModel::new(path_graph(4), 0.5, 6);
    model.labels = vec![0, 1, 1, 0];
    let config = LabelMcmcConfig {
        base: short_chain(),
        resample_rate: 0.2,
        seed: 17,
    };
    let graph = ginf_graph::Multigraph::from_edge_list(4, &[(0, 2, 1), (1, 3, 1), (0, 3, 1)]).unwrap();
    let evidence =
        log_evidence_annealed_labels(&mut model, &graph, &[0.0, 0.5, 1.0], &config, AnnealingRule::default()).unwrap();
    assert!(evidence.is_finite());
    assert_eq!(model.label_sweeps, 2 * 8);
    assert_eq!(model.labels(), vec![0, 1, 1, 0]);
    assert_eq!(model.graph(), path_graph(4));
}
