//! End-to-end contract tests against `orchestrator_storage`'s shared
//! `RepositoryContext`, exercising cross-repository invariants that a single
//! repository's unit tests can't (FK checks, rollups, cascading deletes).

use orchestrator_core::models::{
    ContentFormat, DependencyType, FeatureStatus, NewDependency, NewFeature, NewProject,
    NewSection, NewTask, Priority, SectionEntityType, TaskFilter, TaskStatus,
};
use orchestrator_core::repository::{
    DependencyRepository, FeatureRepository, ProjectRepository, SectionRepository, TaskRepository,
};
use orchestrator_storage::in_memory_repository_context;

#[tokio::test]
async fn project_feature_task_hierarchy_round_trips() {
    let ctx = in_memory_repository_context();

    let project = ctx
        .projects
        .create(NewProject {
            name: "Orchestrator".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let feature = ctx
        .features
        .create(NewFeature {
            name: "Cascade engine".into(),
            project_id: Some(project.id),
            priority: Priority::High,
            ..Default::default()
        })
        .await
        .unwrap();

    let task = ctx
        .tasks
        .create(NewTask {
            title: "Implement detect_cascade_events".into(),
            feature_id: Some(feature.id),
            project_id: Some(project.id),
            complexity: 8,
            ..Default::default()
        })
        .await
        .unwrap();

    assert_eq!(task.feature_id, Some(feature.id));
    let feature_tasks = ctx.tasks.find_by_feature_id(feature.id).await.unwrap();
    assert_eq!(feature_tasks, vec![task.clone()]);

    let project_features = ctx.features.find_by_project_id(project.id).await.unwrap();
    assert_eq!(project_features, vec![feature]);
}

#[tokio::test]
async fn creating_a_feature_under_unknown_project_fails() {
    let ctx = in_memory_repository_context();
    let err = ctx
        .features
        .create(NewFeature {
            name: "Orphan".into(),
            project_id: Some(uuid::Uuid::new_v4()),
            ..Default::default()
        })
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn task_counts_rollup_tracks_completed_and_cancelled() {
    let ctx = in_memory_repository_context();
    let feature = ctx
        .features
        .create(NewFeature {
            name: "F".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    for status in [TaskStatus::Completed, TaskStatus::Cancelled, TaskStatus::Pending] {
        ctx.tasks
            .create(NewTask {
                title: format!("{status}"),
                feature_id: Some(feature.id),
                status: Some(status),
                ..Default::default()
            })
            .await
            .unwrap();
    }

    let counts = ctx
        .features
        .get_task_counts_by_feature_id(feature.id)
        .await
        .unwrap();
    assert_eq!(counts.total, 3);
    assert_eq!(counts.terminal(), 2);
}

#[tokio::test]
async fn feature_counts_rollup_tracks_completed_features() {
    let ctx = in_memory_repository_context();
    let project = ctx
        .projects
        .create(NewProject {
            name: "P".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    ctx.features
        .create(NewFeature {
            name: "Done".into(),
            project_id: Some(project.id),
            status: Some(FeatureStatus::Completed),
            ..Default::default()
        })
        .await
        .unwrap();
    ctx.features
        .create(NewFeature {
            name: "Pending".into(),
            project_id: Some(project.id),
            ..Default::default()
        })
        .await
        .unwrap();

    let counts = ctx
        .projects
        .get_feature_counts_by_project_id(project.id)
        .await
        .unwrap();
    assert_eq!(counts.total, 2);
    assert_eq!(counts.completed, 1);
}

#[tokio::test]
async fn dependency_edges_are_queryable_from_both_sides() {
    let ctx = in_memory_repository_context();
    let blocker = ctx
        .tasks
        .create(NewTask {
            title: "Blocker".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let blocked = ctx
        .tasks
        .create(NewTask {
            title: "Blocked".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    ctx.dependencies
        .create(NewDependency {
            from_task_id: blocked.id,
            to_task_id: blocker.id,
            dependency_type: DependencyType::IsBlockedBy,
            unblock_at: None,
        })
        .await
        .unwrap();

    let from_blocked = ctx.dependencies.find_by_from_task_id(blocked.id).await.unwrap();
    assert_eq!(from_blocked.len(), 1);
    let to_blocker = ctx.dependencies.find_by_to_task_id(blocker.id).await.unwrap();
    assert_eq!(to_blocker.len(), 1);

    let removed = ctx.dependencies.delete_by_task_id(blocked.id).await.unwrap();
    assert_eq!(removed, 1);
}

#[tokio::test]
async fn sections_attach_to_any_entity_kind_and_keep_ordinal_order() {
    let ctx = in_memory_repository_context();
    let task = ctx
        .tasks
        .create(NewTask {
            title: "T".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    ctx.sections
        .add_section(NewSection {
            entity_type: SectionEntityType::Task,
            entity_id: task.id,
            title: "Acceptance criteria".into(),
            usage_description: "what 'done' means".into(),
            content: String::new(),
            content_format: ContentFormat::Markdown,
            ordinal: None,
            tags: vec![],
        })
        .await
        .unwrap();
    ctx.sections
        .add_section(NewSection {
            entity_type: SectionEntityType::Task,
            entity_id: task.id,
            title: "Notes".into(),
            usage_description: "freeform".into(),
            content: String::new(),
            content_format: ContentFormat::Markdown,
            ordinal: None,
            tags: vec![],
        })
        .await
        .unwrap();

    let sections = ctx
        .sections
        .get_sections_for_entity(SectionEntityType::Task, task.id)
        .await
        .unwrap();
    assert_eq!(sections.len(), 2);
    assert!(sections[0].ordinal < sections[1].ordinal);

    let removed = ctx
        .sections
        .delete_sections_for_entity(SectionEntityType::Task, task.id)
        .await
        .unwrap();
    assert_eq!(removed, 2);
}

#[tokio::test]
async fn task_filter_combines_project_feature_status_and_tag() {
    let ctx = in_memory_repository_context();
    let project = ctx
        .projects
        .create(NewProject {
            name: "P".into(),
            ..Default::default()
        })
        .await
        .unwrap();
    let feature = ctx
        .features
        .create(NewFeature {
            name: "F".into(),
            project_id: Some(project.id),
            ..Default::default()
        })
        .await
        .unwrap();

    ctx.tasks
        .create(NewTask {
            title: "Matches".into(),
            project_id: Some(project.id),
            feature_id: Some(feature.id),
            status: Some(TaskStatus::InProgress),
            tags: vec!["urgent".into()],
            ..Default::default()
        })
        .await
        .unwrap();
    ctx.tasks
        .create(NewTask {
            title: "Wrong status".into(),
            project_id: Some(project.id),
            feature_id: Some(feature.id),
            status: Some(TaskStatus::Pending),
            tags: vec!["urgent".into()],
            ..Default::default()
        })
        .await
        .unwrap();

    let found = ctx
        .tasks
        .find_all(TaskFilter {
            project_id: Some(project.id),
            feature_id: Some(feature.id),
            status: Some(TaskStatus::InProgress),
            tag: Some("urgent".into()),
            limit: None,
        })
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Matches");
}
