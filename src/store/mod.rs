use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use uuid::Uuid;

use crate::models::*;

/// The task collection, backed by a flat JSON file.
///
/// The file is re-read on every call, so edits made by hand between requests
/// are picked up. A single lock serializes read-modify-write cycles within
/// this process; nothing protects against other processes writing the file.
pub struct TaskStore {
    backend: Arc<Mutex<Backend>>,
}

enum Backend {
    File(PathBuf),
    Memory(TaskFile),
}

impl TaskStore {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Task file path has no parent directory"))?;
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        tracing::debug!("Using task file {}", path.display());
        Ok(Self {
            backend: Arc::new(Mutex::new(Backend::File(path))),
        })
    }

    pub fn open_default() -> Result<Self> {
        Self::open(default_path()?)
    }

    pub fn open_memory() -> Self {
        Self {
            backend: Arc::new(Mutex::new(Backend::Memory(TaskFile::default()))),
        }
    }

    /// Path of the backing file, if any.
    pub fn path(&self) -> Option<PathBuf> {
        match &*self.backend.lock().expect("task store lock poisoned") {
            Backend::File(path) => Some(path.clone()),
            Backend::Memory(_) => None,
        }
    }

    // ============================================================
    // Queries
    // ============================================================

    /// All tasks in file order. This is the order the scheduler breaks final
    /// ties on.
    pub fn list_tasks(&self) -> Result<Vec<Task>> {
        let backend = self.backend.lock().expect("task store lock poisoned");
        Ok(backend.load()?.tasks)
    }

    /// All tasks, soonest deadline first. Undated tasks go last.
    pub fn list_tasks_by_deadline(&self) -> Result<Vec<Task>> {
        let mut tasks = self.list_tasks()?;
        tasks.sort_by_key(|t| (t.deadline.is_none(), t.deadline));
        Ok(tasks)
    }

    pub fn get_task(&self, id: Uuid) -> Result<Option<Task>> {
        Ok(self.list_tasks()?.into_iter().find(|t| t.id == id))
    }

    // ============================================================
    // Mutations
    // ============================================================

    pub fn create_task(&self, input: CreateTaskInput) -> Result<Task> {
        let task = Task::from_input(input)?;

        let mut backend = self.backend.lock().expect("task store lock poisoned");
        let mut file = backend.load()?;
        file.tasks.push(task.clone());
        backend.save(file)?;

        tracing::info!(task_id = %task.id, "Added task \"{}\"", task.title);
        Ok(task)
    }

    pub fn update_task(&self, id: Uuid, input: UpdateTaskInput) -> Result<Option<Task>> {
        let mut backend = self.backend.lock().expect("task store lock poisoned");
        let mut file = backend.load()?;

        let Some(task) = file.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.apply(input)?;
        let updated = task.clone();
        backend.save(file)?;

        tracing::info!(task_id = %id, "Updated task");
        Ok(Some(updated))
    }

    pub fn delete_task(&self, id: Uuid) -> Result<bool> {
        let mut backend = self.backend.lock().expect("task store lock poisoned");
        let mut file = backend.load()?;

        let before = file.tasks.len();
        file.tasks.retain(|t| t.id != id);
        let removed = before != file.tasks.len();
        if removed {
            backend.save(file)?;
            tracing::info!(task_id = %id, "Removed task");
        }
        Ok(removed)
    }
}

impl Clone for TaskStore {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
        }
    }
}

impl Backend {
    fn load(&self) -> Result<TaskFile> {
        match self {
            Backend::Memory(file) => Ok(file.clone()),
            Backend::File(path) => read_task_file(path),
        }
    }

    fn save(&mut self, file: TaskFile) -> Result<()> {
        match self {
            Backend::Memory(stored) => {
                *stored = file;
                Ok(())
            }
            Backend::File(path) => write_task_file(path, &file),
        }
    }
}

fn default_path() -> Result<PathBuf> {
    let dirs = directories::ProjectDirs::from("", "", "dayplan")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    Ok(dirs.data_dir().join("tasks.json"))
}

fn read_task_file(path: &Path) -> Result<TaskFile> {
    if !path.exists() {
        return Ok(TaskFile::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    if content.trim().is_empty() {
        return Ok(TaskFile::default());
    }
    let file: TaskFile = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    for task in &file.tasks {
        task.validate()
            .with_context(|| format!("Invalid task {} in {}", task.id, path.display()))?;
    }
    Ok(file)
}

/// Writes go to a sibling temp file which is then renamed over the original.
fn write_task_file(path: &Path, file: &TaskFile) -> Result<()> {
    let content = serde_json::to_string_pretty(file).context("Failed to serialize tasks")?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, content).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
