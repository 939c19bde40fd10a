use super::store::Store;
use async_trait::async_trait;
use chrono::Utc;
use orchestrator_core::error::{OrchestratorError, Result};
use orchestrator_core::models::{Dependency, NewDependency};
use orchestrator_core::repository::DependencyRepository;
use std::sync::Arc;
use uuid::Uuid;

/// In-memory `DependencyRepository`. Enforces the no-self-loop and
/// no-duplicate-edge invariants at write time; acyclicity of the
/// BLOCKS/IS_BLOCKED_BY graph is the caller's responsibility — the
/// repository contract does not specify a cycle check, and general graph
/// algorithms are left for future work.
pub struct MemoryDependencyRepository {
    store: Arc<Store>,
}

impl Default for MemoryDependencyRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDependencyRepository {
    pub fn new() -> Self {
        Self::with_store(Arc::new(Store::new()))
    }

    pub fn with_store(store: Arc<Store>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl DependencyRepository for MemoryDependencyRepository {
    async fn create(&self, new: NewDependency) -> Result<Dependency> {
        if new.from_task_id == new.to_task_id {
            return Err(OrchestratorError::Validation(
                "a task cannot depend on itself".into(),
            ));
        }
        let mut deps = self.store.dependencies.lock();
        let duplicate = deps.values().any(|d| {
            d.from_task_id == new.from_task_id
                && d.to_task_id == new.to_task_id
                && d.dependency_type == new.dependency_type
        });
        if duplicate {
            return Err(OrchestratorError::Duplicate(format!(
                "dependency {:?} from {} to {} already exists",
                new.dependency_type, new.from_task_id, new.to_task_id
            )));
        }
        let dependency = Dependency {
            id: Uuid::new_v4(),
            from_task_id: new.from_task_id,
            to_task_id: new.to_task_id,
            dependency_type: new.dependency_type,
            unblock_at: new.unblock_at,
            created_at: Utc::now(),
        };
        deps.insert(dependency.id, dependency.clone());
        Ok(dependency)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Dependency> {
        self.store
            .dependencies
            .lock()
            .get(&id)
            .cloned()
            .ok_or_else(|| OrchestratorError::not_found("dependency", id))
    }

    async fn find_by_from_task_id(&self, task_id: Uuid) -> Result<Vec<Dependency>> {
        Ok(self
            .store
            .dependencies
            .lock()
            .values()
            .filter(|d| d.from_task_id == task_id)
            .cloned()
            .collect())
    }

    async fn find_by_to_task_id(&self, task_id: Uuid) -> Result<Vec<Dependency>> {
        Ok(self
            .store
            .dependencies
            .lock()
            .values()
            .filter(|d| d.to_task_id == task_id)
            .cloned()
            .collect())
    }

    async fn find_by_task_id(&self, task_id: Uuid) -> Result<Vec<Dependency>> {
        Ok(self
            .store
            .dependencies
            .lock()
            .values()
            .filter(|d| d.from_task_id == task_id || d.to_task_id == task_id)
            .cloned()
            .collect())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.store
            .dependencies
            .lock()
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| OrchestratorError::not_found("dependency", id))
    }

    async fn delete_by_task_id(&self, task_id: Uuid) -> Result<u64> {
        let mut deps = self.store.dependencies.lock();
        let to_remove: Vec<Uuid> = deps
            .values()
            .filter(|d| d.from_task_id == task_id || d.to_task_id == task_id)
            .map(|d| d.id)
            .collect();
        for id in &to_remove {
            deps.remove(id);
        }
        Ok(to_remove.len() as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orchestrator_core::models::DependencyType;

    #[tokio::test]
    async fn rejects_self_referencing_edge() {
        let repo = MemoryDependencyRepository::new();
        let task_id = Uuid::new_v4();
        let err = repo
            .create(NewDependency {
                from_task_id: task_id,
                to_task_id: task_id,
                dependency_type: DependencyType::Blocks,
                unblock_at: None,
            })
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn rejects_duplicate_edge() {
        let repo = MemoryDependencyRepository::new();
        let (a, b) = (Uuid::new_v4(), Uuid::new_v4());
        repo.create(NewDependency {
            from_task_id: a,
            to_task_id: b,
            dependency_type: DependencyType::Blocks,
            unblock_at: None,
        })
        .await
        .unwrap();
        let err = repo
            .create(NewDependency {
                from_task_id: a,
                to_task_id: b,
                dependency_type: DependencyType::Blocks,
                unblock_at: None,
            })
            .await
            .unwrap_err();
        assert_eq!(err.code(), orchestrator_core::error::ErrorCode::DuplicateResource);
    }

    #[tokio::test]
    async fn delete_by_task_id_removes_both_directions() {
        let repo = MemoryDependencyRepository::new();
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        repo.create(NewDependency {
            from_task_id: a,
            to_task_id: b,
            dependency_type: DependencyType::Blocks,
            unblock_at: None,
        })
        .await
        .unwrap();
        repo.create(NewDependency {
            from_task_id: c,
            to_task_id: a,
            dependency_type: DependencyType::Blocks,
            unblock_at: None,
        })
        .await
        .unwrap();

        let removed = repo.delete_by_task_id(a).await.unwrap();
        assert_eq!(removed, 2);
        assert!(repo.find_by_task_id(a).await.unwrap().is_empty());
    }
}
