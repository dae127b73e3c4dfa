mod common;

use common::{path_graph, BlockModel, MergeBackend, PairwiseDataModel};
use ginf_core::GinfError;
use ginf_evidence::{
    graph_log_evidence, labeled_graph_log_evidence, log_evidence, log_posterior, EstimatorConfig, EvidenceMethod,
};
use ginf_graph::{GenerativeModel, GraphModel, LabelModel, Multigraph};
use ginf_mcmc::{CommunityBackend, SweepKind};

fn quick_config() -> EstimatorConfig {
    EstimatorConfig {
        n_sweeps: 25,
        n_steps_per_vertex: 2,
        burn: 3,
        betas: Some(vec![0.0, 0.5, 1.0]),
        ..EstimatorConfig::default()
    }
}

fn data_model() -> PairwiseDataModel {
    PairwiseDataModel::new(4, 3, -1.0, 21)
        .with_weight(0, 1, 0.8)
        .with_weight(2, 3, -0.4)
}

fn target() -> Multigraph {
    Multigraph::from_edge_list(4, &[(0, 1, 1), (1, 2, 1), (1, 3, 1)]).unwrap()
}

const DATA_METHODS: [EvidenceMethod; 4] = [
    EvidenceMethod::Exact,
    EvidenceMethod::Meanfield,
    EvidenceMethod::ExactMeanfield,
    EvidenceMethod::Annealed,
];

#[test]
fn posterior_methods_restore_the_graph() {
    for method in DATA_METHODS {
        let mut model = data_model();
        let before = model.graph();
        let value = log_posterior(&mut model, &target(), method, &quick_config()).unwrap();
        assert!(value <= 1e-9 || method == EvidenceMethod::Annealed, "{method}: {value}");
        assert!(!value.is_nan(), "{method}");
        assert_eq!(model.graph(), before, "{method}");
    }
}

#[test]
fn evidence_methods_restore_the_graph() {
    for method in DATA_METHODS {
        let mut model = data_model();
        let before = model.graph();
        let value = log_evidence(&mut model, method, &quick_config()).unwrap();
        assert!(!value.is_nan(), "{method}");
        assert_eq!(model.graph(), before, "{method}");
    }
}

#[test]
fn exact_posterior_is_joint_minus_evidence() {
    let mut model = data_model();
    let config = quick_config();
    let evidence = log_evidence(&mut model, EvidenceMethod::Exact, &config).unwrap();
    let posterior = log_posterior(&mut model, &target(), EvidenceMethod::Exact, &config).unwrap();
    let mut probe = data_model();
    probe.set_graph(&target()).unwrap();
    let joint = probe.log_prior() + probe.log_likelihood();
    assert!((posterior - (joint - evidence)).abs() < 1e-10);
}

#[test]
fn partition_meanfield_has_no_posterior_form() {
    let mut model = data_model();
    let before = model.graph();
    let err = log_posterior(&mut model, &target(), EvidenceMethod::PartitionMeanfield, &quick_config()).unwrap_err();
    assert_eq!(err.info().code, "unsupported-method");
    let err = log_evidence(&mut model, EvidenceMethod::PartitionMeanfield, &quick_config()).unwrap_err();
    assert!(err.is_config());
    assert_eq!(model.graph(), before);
    assert_eq!(model.sweeps, 0);
}

#[test]
fn gibbs_on_metropolis_only_model_fails_before_mutation() {
    let mut model = data_model();
    let before = model.graph();
    let config = EstimatorConfig {
        sweep_kind: SweepKind::Gibbs,
        ..quick_config()
    };
    let err = log_posterior(&mut model, &target(), EvidenceMethod::Meanfield, &config).unwrap_err();
    assert_eq!(err.info().code, "gibbs-unsupported");
    assert_eq!(model.graph(), before);
    assert_eq!(model.sweeps, 0);
}

#[test]
fn model_failure_mid_chain_still_restores() {
    for method in [EvidenceMethod::Meanfield, EvidenceMethod::Annealed] {
        let mut model = data_model();
        model.fail_on_sweep = Some(4);
        let before = model.graph();
        let err = log_posterior(&mut model, &target(), method, &quick_config()).unwrap_err();
        assert!(matches!(err, GinfError::Model(_)), "{method}");
        assert_eq!(model.graph(), before, "{method}");
    }
}

#[test]
fn unlabeled_graph_evidence() {
    let mut model = data_model();
    let before = model.graph();
    let graph = target();

    let exact = graph_log_evidence(&mut model, &graph, EvidenceMethod::Exact, &quick_config()).unwrap();
    let mut probe = data_model();
    probe.set_graph(&graph).unwrap();
    assert_eq!(exact, probe.log_joint());

    let meanfield = graph_log_evidence(&mut model, &graph, EvidenceMethod::Meanfield, &quick_config()).unwrap();
    assert!(meanfield.is_finite() && meanfield <= 0.0);
    assert_eq!(model.graph(), before);

    let err = graph_log_evidence(&mut model, &graph, EvidenceMethod::Annealed, &quick_config()).unwrap_err();
    assert_eq!(err.info().code, "unsupported-method");
}

fn block_model() -> BlockModel {
    let mut model = BlockModel::new(path_graph(4), 0.6, 8);
    model.labels = vec![0, 0, 1, 1];
    model
}

#[test]
fn labeled_methods_restore_graph_and_labels() {
    let graph = Multigraph::from_edge_list(4, &[(0, 1, 1), (0, 2, 1), (2, 3, 1)]).unwrap();
    for method in [
        EvidenceMethod::Exact,
        EvidenceMethod::Meanfield,
        EvidenceMethod::PartitionMeanfield,
        EvidenceMethod::Annealed,
    ] {
        let mut model = block_model();
        let value = labeled_graph_log_evidence(&mut model, &graph, Some(method), &quick_config(), None).unwrap();
        assert!(!value.is_nan(), "{method}");
        assert_eq!(model.graph(), path_graph(4), "{method}");
        assert_eq!(model.labels(), vec![0, 0, 1, 1], "{method}");
    }
}

#[test]
fn labeled_default_is_exact_on_small_models() {
    let graph = path_graph(4);
    let mut model = block_model();
    let default = labeled_graph_log_evidence(&mut model, &graph, None, &quick_config(), None).unwrap();
    let exact =
        labeled_graph_log_evidence(&mut model, &graph, Some(EvidenceMethod::Exact), &quick_config(), None).unwrap();
    assert_eq!(default, exact);
    assert_eq!(model.label_sweeps, 0);
}

#[test]
fn labeled_exact_meanfield_is_rejected() {
    let mut model = block_model();
    let err = labeled_graph_log_evidence(
        &mut model,
        &path_graph(4),
        Some(EvidenceMethod::ExactMeanfield),
        &quick_config(),
        None,
    )
    .unwrap_err();
    assert_eq!(err.info().code, "unsupported-method");
}

#[test]
fn backend_is_forwarded_to_partition_meanfield() {
    let mut model = block_model();
    let mut backend = MergeBackend::default();
    let config = EstimatorConfig {
        use_backend: true,
        n_sweeps: 6,
        n_steps_per_vertex: 1,
        ..quick_config()
    };
    let value = labeled_graph_log_evidence(
        &mut model,
        &path_graph(4),
        Some(EvidenceMethod::PartitionMeanfield),
        &config,
        Some(&mut backend as &mut dyn CommunityBackend<BlockModel>),
    )
    .unwrap();
    assert!(value.is_finite());
    assert_eq!(backend.sweeps, 6 * 4);
    assert_eq!(model.label_sweeps, 0);
    assert_eq!(model.labels(), vec![0, 0, 1, 1]);
}
