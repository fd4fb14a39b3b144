//! Combine job and combiner tests against the mock aggregator.

use meshcombine::{
    BatchId, BatchMode, CombineError, CombineJob, CombineOptions, Combiner, DiagnosticKind, GroupingMode,
    GroupingStage, MaterialKey, StepStatus,
};
use meshcombine_test_utils::fixtures::{missing_mesh, renderable, renderables};
use meshcombine_test_utils::{AggregateCall, MockAggregator, MockCollider, MockMesh, MockScene};

type Job = CombineJob<MockMesh, MockCollider>;

fn two_materials() -> Vec<meshcombine::Renderable> {
    let mut input = renderables("a", 1, 3, 400);
    input.extend(renderables("b", 2, 2, 400));
    input
}

fn primary(group: u32, partition: u32) -> BatchId {
    BatchId::Primary { group, partition }
}

#[test]
fn test_one_group_per_step() {
    let options = CombineOptions::default().with_max_vertex_count(1000);
    let mut job = Job::new(two_materials(), options).unwrap();
    let aggregator = MockAggregator::new();

    assert_eq!(job.stage(), GroupingStage::Grouped);
    assert_eq!(job.progress(), (0, 2));

    assert_eq!(job.process_next_group(&aggregator), StepStatus::Pending);
    assert_eq!(aggregator.merge_order(), vec![primary(0, 0), primary(0, 1)]);
    assert!(job.grouping().group_at(0).unwrap().partitions().iter().all(|p| p.is_finalized()));
    assert!(!job.grouping().group_at(1).unwrap().partitions()[0].is_finalized());

    assert_eq!(job.process_next_group(&aggregator), StepStatus::Done);
    assert_eq!(job.progress(), (2, 2));
    assert!(job.is_done());
    assert_eq!(job.process_next_group(&aggregator), StepStatus::Done);
    assert_eq!(aggregator.count_merges(), 3);
}

#[test]
fn test_same_material_batches_merge_into_one_submesh() {
    let aggregator = MockAggregator::new();
    let report = Job::new(two_materials(), CombineOptions::default().with_max_vertex_count(1000))
        .unwrap()
        .run(&aggregator);

    assert_eq!(report.batches.len(), 3);
    for batch in &report.batches {
        assert_eq!(batch.mode, BatchMode::SameMaterial);
        assert_eq!(batch.mesh.submeshes.len(), 1);
        assert_eq!(batch.mesh.vertex_count, batch.vertex_total);
    }
    assert!(aggregator.calls().iter().all(|call| match call {
        AggregateCall::Merge {
            keep_submeshes_separate,
            ..
        } => !keep_submeshes_separate,
        AggregateCall::BuildCollider { .. } => true,
    }));
}

#[test]
fn test_deep_combine_step() {
    let options = CombineOptions::default()
        .with_max_vertex_count(2000)
        .with_deep_combine(true);
    let input = {
        let mut input = renderables("a", 1, 6, 400);
        input.extend(renderables("b", 2, 2, 400));
        input
    };
    let mut job = Job::new(input, options).unwrap();
    let aggregator = MockAggregator::new();

    assert_eq!(job.process_next_group(&aggregator), StepStatus::Pending);
    assert_eq!(job.process_next_group(&aggregator), StepStatus::Pending);
    assert_eq!(job.stage(), GroupingStage::DeepCombining);
    assert_eq!(job.process_next_group(&aggregator), StepStatus::Done);

    let report = job.into_report();
    // a: [2000] [400], b: [800], deep: [400 + 800]
    let deep: Vec<_> = report.deep().collect();
    assert_eq!(deep.len(), 1);
    assert_eq!(deep[0].id, BatchId::Deep { partition: 0 });
    assert_eq!(deep[0].mode, BatchMode::MixedMaterial);
    assert_eq!(deep[0].vertex_total, 1200);
    assert_eq!(deep[0].mesh.submeshes, vec![MaterialKey::new(1), MaterialKey::new(2)]);

    assert_eq!(report.batch(primary(0, 0)).unwrap().absorbed_into, None);
    assert_eq!(
        report.batch(primary(0, 1)).unwrap().absorbed_into,
        Some(BatchId::Deep { partition: 0 })
    );
    assert_eq!(
        report.batch(primary(1, 0)).unwrap().absorbed_into,
        Some(BatchId::Deep { partition: 0 })
    );
    assert_eq!(report.visible().count(), 2);

    assert_eq!(
        aggregator.calls().last(),
        Some(&AggregateCall::BuildCollider {
            batch: BatchId::Deep { partition: 0 }
        })
    );
    assert!(aggregator.calls().contains(&AggregateCall::Merge {
        batch: BatchId::Deep { partition: 0 },
        members: 2,
        vertex_total: 1200,
        keep_submeshes_separate: true,
    }));
}

#[test]
fn test_deep_batches_keep_nested_submeshes() {
    let options = CombineOptions::default()
        .with_max_vertex_count(5000)
        .with_deep_combine(true)
        .with_mode(GroupingMode::MixedMaterial);
    let input = vec![renderable("a", 1, 10), renderable("b", 2, 10), renderable("c", 1, 10)];
    let aggregator = MockAggregator::new();
    let report = Job::new(input, options).unwrap().run(&aggregator);

    let deep = report.batch(BatchId::Deep { partition: 0 }).unwrap();
    assert_eq!(deep.mesh.submeshes.len(), 3);
    assert_eq!(deep.materials.len(), 3);
}

#[test]
fn test_merge_failure_is_scoped_to_batch() {
    let aggregator = MockAggregator::new();
    aggregator.fail_merge(primary(0, 0));

    let report = Job::new(two_materials(), CombineOptions::default().with_max_vertex_count(1000))
        .unwrap()
        .run(&aggregator);

    assert!(report.batch(primary(0, 0)).is_none());
    assert!(report.batch(primary(0, 1)).is_some());
    assert!(report.batch(primary(1, 0)).is_some());

    let failures: Vec<_> = report.diagnostics.failures().collect();
    assert_eq!(failures.len(), 1);
    assert!(matches!(
        failures[0].kind,
        DiagnosticKind::AggregationFailed { batch, .. } if batch == primary(0, 0)
    ));
}

#[test]
fn test_failed_representative_is_left_out_of_deep_pass() {
    let aggregator = MockAggregator::new();
    aggregator.fail_merge(primary(0, 1));
    let options = CombineOptions::default()
        .with_max_vertex_count(1000)
        .with_deep_combine(true);

    let report = Job::new(two_materials(), options).unwrap().run(&aggregator);

    let deep = report.batch(BatchId::Deep { partition: 0 }).unwrap();
    assert_eq!(deep.vertex_total, 800);
    assert_eq!(deep.sources.len(), 1);
    assert!(report.diagnostics.iter().any(|d| matches!(
        d.kind,
        DiagnosticKind::RepresentativeUnavailable { batch } if batch == primary(0, 1)
    )));
}

#[test]
fn test_collider_failure_keeps_mesh() {
    let aggregator = MockAggregator::new();
    aggregator.fail_collider(primary(1, 0));

    let report = Job::new(two_materials(), CombineOptions::default().with_max_vertex_count(1000))
        .unwrap()
        .run(&aggregator);

    let batch = report.batch(primary(1, 0)).unwrap();
    assert!(batch.collider.is_none());
    assert_eq!(batch.mesh.vertex_count, 800);
    assert!(report.batch(primary(0, 0)).unwrap().collider.is_some());
}

#[test]
fn test_colliders_can_be_disabled() {
    let aggregator = MockAggregator::new();
    let options = CombineOptions::default()
        .with_max_vertex_count(1000)
        .with_create_collider(false);

    let report = Job::new(two_materials(), options).unwrap().run(&aggregator);

    assert_eq!(aggregator.count_colliders(), 0);
    assert!(report.batches.iter().all(|b| b.collider.is_none()));
}

#[test]
fn test_invalid_mesh_reaches_report() {
    let input = vec![renderable("a", 1, 100), missing_mesh("ghost", 1)];
    let aggregator = MockAggregator::new();
    let report = Job::new(input, CombineOptions::default()).unwrap().run(&aggregator);

    assert_eq!(report.batches.len(), 1);
    assert_eq!(report.batches[0].sources.len(), 1);
    let skipped: Vec<_> = report.diagnostics.invalid_meshes().collect();
    assert_eq!(skipped[0].source_id, "ghost");
    assert!(!aggregator.hidden().contains(&"ghost".to_string()));
}

#[test]
fn test_cancel_keeps_partial_results() {
    let mut job = Job::new(two_materials(), CombineOptions::default().with_max_vertex_count(1000)).unwrap();
    let aggregator = MockAggregator::new();

    job.process_next_group(&aggregator);
    job.cancel();
    assert!(job.is_done());
    assert_eq!(job.process_next_group(&aggregator), StepStatus::Done);

    let report = job.into_report();
    assert!(report.cancelled);
    assert_eq!(report.batches.len(), 2);
    assert_eq!(aggregator.count_merges(), 2);
}

#[test]
fn test_empty_job_is_done() {
    let job = Job::new(Vec::new(), CombineOptions::default()).unwrap();
    assert!(job.is_done());
    let report = job.run(&MockAggregator::new());
    assert!(report.batches.is_empty());
}

#[test]
fn test_invalid_options_rejected() {
    let result = Job::new(two_materials(), CombineOptions::default().with_max_vertex_count(0));
    assert!(matches!(result, Err(CombineError::InvalidOptions { .. })));
}

#[test]
fn test_discovery_honours_include_inactive() {
    let mut scene = MockScene::new();
    let root = scene.root();
    let props = scene.add_node(root, "props");
    scene.add_renderer(props, "barrel", 1, 300);
    scene.add_renderer(props, "crate", 1, 300);
    let stash = scene.add_node(root, "stash");
    scene.add_renderer(stash, "hidden_crate", 1, 300);
    scene.set_active(stash, false);

    let aggregator = MockAggregator::new();
    let active_only = Job::discover(&scene, &root, CombineOptions::default())
        .unwrap()
        .run(&aggregator);
    assert_eq!(active_only.batches[0].vertex_total, 600);

    let everything = Job::discover(&scene, &root, CombineOptions::default().with_include_inactive(true))
        .unwrap()
        .run(&aggregator);
    assert_eq!(everything.batches[0].vertex_total, 900);
    assert_eq!(&*everything.batches[0].sources[2], "hidden_crate");
}

#[test]
fn test_combiner_denies_overlapping_runs() {
    let mut combiner: Combiner<MockMesh, MockCollider> =
        Combiner::new(CombineOptions::default().with_max_vertex_count(1000));
    let aggregator = MockAggregator::new();

    combiner.start(two_materials()).unwrap();
    assert!(combiner.is_running());
    assert_eq!(combiner.start(two_materials()), Err(CombineError::Busy));

    assert!(combiner.tick(&aggregator).is_none());
    let report = combiner.tick(&aggregator).unwrap();
    assert_eq!(report.batches.len(), 3);
    assert!(!combiner.is_running());

    combiner.start(two_materials()).unwrap();
    let partial = combiner.cancel().unwrap();
    assert!(partial.cancelled);
    assert!(partial.batches.is_empty());
    assert!(combiner.tick(&aggregator).is_none());
}
