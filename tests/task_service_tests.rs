use std::sync::Arc;

use task_api::routes::tasks::dto::{CreateTask, UpdateTask};
use task_api::routes::tasks::{InMemoryTaskStore, TaskError, TaskPriority, TaskService, TaskStatus};

fn setup() -> TaskService {
    // Allow multiple calls to init for tests.
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    TaskService::new(Arc::new(InMemoryTaskStore::new()))
}

fn write_spec() -> CreateTask {
    CreateTask {
        title: Some("Write spec".to_string()),
        description: Some(String::new()),
        status: None,
        priority: Some("Medium".to_string()),
        due_date: Some("2025-01-01".to_string()),
    }
}

#[tokio::test]
async fn create_then_complete_task() {
    let service = setup();

    let created = service.create_task(write_spec()).await.expect("create task");
    assert_eq!(created.status, TaskStatus::ToDo);
    assert_eq!(created.priority, TaskPriority::Medium);
    assert_eq!(created.created_at, created.updated_at);

    let update = UpdateTask {
        status: Some("Completed".to_string()),
        ..Default::default()
    };
    let updated = service
        .update_task(&created.id.to_string(), update)
        .await
        .expect("update task");

    assert_eq!(updated.status, TaskStatus::Completed);
    assert_eq!(updated.priority, TaskPriority::Medium);
    assert_eq!(updated.title, created.title);
    assert_eq!(updated.description, created.description);
    assert_eq!(updated.due_date, created.due_date);
    assert_eq!(updated.created_at, created.created_at);
    assert!(updated.updated_at > created.updated_at);
}

#[tokio::test]
async fn status_can_move_backwards() {
    let service = setup();
    let created = service
        .create_task(CreateTask {
            status: Some("Completed".to_string()),
            ..write_spec()
        })
        .await
        .expect("create task");

    let reopened = service
        .update_task(
            &created.id.to_string(),
            UpdateTask {
                status: Some("To Do".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("reopen task");

    assert_eq!(reopened.status, TaskStatus::ToDo);
}

#[tokio::test]
async fn repeated_updates_keep_advancing_updated_at() {
    let service = setup();
    let task = service.create_task(write_spec()).await.unwrap();
    let id = task.id.to_string();

    let mut last = task.updated_at;
    for _ in 0..5 {
        let updated = service.update_task(&id, UpdateTask::default()).await.unwrap();
        assert!(updated.updated_at > last);
        assert_eq!(updated.created_at, task.created_at);
        last = updated.updated_at;
    }
}

#[tokio::test]
async fn oversized_title_creates_nothing() {
    let service = setup();

    let result = service
        .create_task(CreateTask {
            title: Some("t".repeat(256)),
            ..write_spec()
        })
        .await;

    match result {
        Err(TaskError::Validation(errors)) => assert_eq!(errors.fields(), vec!["title"]),
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(service.list_tasks().await.unwrap().is_empty());
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let service = setup();
    let never_issued = uuid::Uuid::new_v4().to_string();

    assert!(matches!(service.get_task(&never_issued).await, Err(TaskError::NotFound)));
    assert!(matches!(
        service.update_task(&never_issued, UpdateTask::default()).await,
        Err(TaskError::NotFound)
    ));
    assert!(matches!(service.delete_task(&never_issued).await, Err(TaskError::NotFound)));
    assert!(matches!(service.get_task("../etc/passwd").await, Err(TaskError::NotFound)));
}

#[tokio::test]
async fn deleted_task_stays_gone() {
    let service = setup();
    let task = service.create_task(write_spec()).await.unwrap();
    let id = task.id.to_string();

    service.delete_task(&id).await.expect("first delete");

    assert!(matches!(service.get_task(&id).await, Err(TaskError::NotFound)));
    assert!(matches!(service.delete_task(&id).await, Err(TaskError::NotFound)));
}

#[tokio::test]
async fn list_reflects_creates_deletes_and_updates() {
    let service = setup();

    let mut ids = Vec::new();
    for n in 0..5 {
        let task = service
            .create_task(CreateTask {
                title: Some(format!("task {n}")),
                ..write_spec()
            })
            .await
            .unwrap();
        ids.push(task.id.to_string());
    }
    service.delete_task(&ids[1]).await.unwrap();
    service.delete_task(&ids[3]).await.unwrap();
    let renamed = service
        .update_task(
            &ids[4],
            UpdateTask {
                title: Some("renamed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let tasks = service.list_tasks().await.unwrap();
    assert_eq!(tasks.len(), 3);
    let last = tasks.iter().find(|t| t.id == renamed.id).expect("renamed task listed");
    assert_eq!(last, &renamed);
}

#[tokio::test]
async fn concurrent_creates_get_distinct_ids() {
    let service = setup();

    let handles: Vec<_> = (0..16)
        .map(|n| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_task(CreateTask {
                        title: Some(format!("parallel {n}")),
                        ..write_spec()
                    })
                    .await
            })
        })
        .collect();

    let mut ids = std::collections::HashSet::new();
    for handle in handles {
        let task = handle.await.unwrap().unwrap();
        assert!(ids.insert(task.id));
    }
    assert_eq!(service.list_tasks().await.unwrap().len(), 16);
}
