// Todo store: in-memory list mirrored to a durable key-value slot

use crate::codec;
use crate::config::{Config, DEFAULT_KEY};
use crate::filter::TodoFilter;
use crate::storage::{self, Storage};
use crate::todo::{IdGenerator, Todo, TodoId};
use chrono::Utc;
use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// What `load` does when the stored list cannot be parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OnCorrupt {
    /// Return an error and keep the in-memory list as it was
    #[default]
    Fail,
    /// Log a warning and keep only what could be read
    Reset,
}

/// A successful state change, delivered to observers
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Loaded { count: usize },
    Added(TodoId),
    Toggled(TodoId),
    Edited(TodoId),
    Deleted(TodoId),
    FilterChanged(TodoFilter),
}

/// Callback invoked after each change
pub type Observer = Box<dyn FnMut(&Change)>;

/// Owns the todo list and the current filter.
///
/// Every mutation is written through to storage before it is reported. If the
/// write fails the in-memory change is undone, so the list always matches the
/// last value successfully saved or loaded.
pub struct TodoStore<S: Storage> {
    storage: S,
    key: String,
    todos: Vec<Todo>,
    filter: TodoFilter,
    ids: IdGenerator,
    on_corrupt: OnCorrupt,
    observers: Vec<Observer>,
}

impl TodoStore<Box<dyn Storage>> {
    /// Build a store from config. The list starts empty until `load` is called.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let storage = config.open_storage()?;
        Ok(Self::with_key(storage, &config.key)?.on_corrupt(config.on_corrupt))
    }
}

impl<S: Storage> TodoStore<S> {
    /// Create an empty store persisting under the default key
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: DEFAULT_KEY.to_string(),
            todos: Vec::new(),
            filter: TodoFilter::default(),
            ids: IdGenerator::new(),
            on_corrupt: OnCorrupt::default(),
            observers: Vec::new(),
        }
    }

    /// Create an empty store persisting under `key`
    pub fn with_key(storage: S, key: &str) -> Result<Self> {
        storage::validate_key(key)?;
        let mut store = Self::new(storage);
        store.key = key.to_string();
        Ok(store)
    }

    /// Set the policy for unparseable stored data
    pub fn on_corrupt(mut self, policy: OnCorrupt) -> Self {
        self.on_corrupt = policy;
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Give back the storage, dropping the in-memory state
    pub fn into_storage(self) -> S {
        self.storage
    }

    /// Register an observer for subsequent changes
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&Change) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Replace the in-memory list with the stored one.
    ///
    /// Leaves the list untouched when nothing (or only whitespace) is stored.
    /// Unparseable data, including individual unreadable records, is handled
    /// according to the `OnCorrupt` policy.
    pub fn load(&mut self) -> Result<()> {
        let stored = self
            .storage
            .get(&self.key)
            .with_context(|| format!("Failed to read todo list under key {}", self.key))?;

        let Some(text) = stored.filter(|s| !s.trim().is_empty()) else {
            debug!(key = %self.key, "No stored todo list");
            return Ok(());
        };

        let todos = match codec::decode(&text) {
            Ok(decoded) if decoded.skipped == 0 => decoded.todos,
            Ok(decoded) => match self.on_corrupt {
                OnCorrupt::Fail => {
                    return Err(eyre!(
                        "Stored todo list under key {} is corrupt: {} record(s) could not be read",
                        self.key,
                        decoded.skipped
                    ));
                }
                OnCorrupt::Reset => {
                    warn!(
                        key = %self.key,
                        skipped = decoded.skipped,
                        "Dropping unreadable todo records"
                    );
                    decoded.todos
                }
            },
            Err(e) => match self.on_corrupt {
                OnCorrupt::Fail => {
                    return Err(e.wrap_err(format!("Stored todo list under key {} is corrupt", self.key)));
                }
                OnCorrupt::Reset => {
                    warn!(key = %self.key, error = ?e, "Stored todo list is corrupt, starting empty");
                    Vec::new()
                }
            },
        };

        for todo in &todos {
            self.ids.observe(todo.id);
        }

        let count = todos.len();
        self.todos = todos;
        info!(key = %self.key, count, "Loaded todos");

        self.notify(Change::Loaded { count });
        Ok(())
    }

    /// Overwrite the stored list with the in-memory one
    pub fn save(&mut self) -> Result<()> {
        let text = codec::encode(&self.todos)?;

        if let Err(e) = self.storage.set(&self.key, &text) {
            warn!(key = %self.key, error = ?e, "Failed to save todos");
            return Err(e.wrap_err(format!("Failed to save todo list under key {}", self.key)));
        }

        debug!(key = %self.key, count = self.todos.len(), "Saved todos");
        Ok(())
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Append a new open todo and return its id. Empty text is accepted.
    pub fn add(&mut self, text: impl Into<String>) -> Result<TodoId> {
        let now = Utc::now();
        let id = self.ids.next(now)?;
        self.todos.push(Todo::new(id, text, now));

        if let Err(e) = self.save() {
            self.todos.pop();
            return Err(e);
        }

        debug!(id, "Added todo");
        self.notify(Change::Added(id));
        Ok(id)
    }

    /// Flip `completed` on the first todo with `id`. Returns false if none matched.
    pub fn toggle(&mut self, id: TodoId) -> Result<bool> {
        let Some(todo) = self.find_mut(id) else {
            debug!(id, "toggle: no todo with id");
            return Ok(false);
        };
        todo.completed = !todo.completed;

        if let Err(e) = self.save() {
            if let Some(todo) = self.find_mut(id) {
                todo.completed = !todo.completed;
            }
            return Err(e);
        }

        debug!(id, "Toggled todo");
        self.notify(Change::Toggled(id));
        Ok(true)
    }

    /// Replace the text of the first todo with `id`. Returns false if none matched.
    pub fn edit(&mut self, id: TodoId, text: impl Into<String>) -> Result<bool> {
        let Some(todo) = self.find_mut(id) else {
            debug!(id, "edit: no todo with id");
            return Ok(false);
        };
        let previous = std::mem::replace(&mut todo.text, text.into());

        if let Err(e) = self.save() {
            if let Some(todo) = self.find_mut(id) {
                todo.text = previous;
            }
            return Err(e);
        }

        debug!(id, "Edited todo");
        self.notify(Change::Edited(id));
        Ok(true)
    }

    /// Remove every todo with `id`. Returns false if none matched.
    pub fn delete(&mut self, id: TodoId) -> Result<bool> {
        if !self.todos.iter().any(|todo| todo.id == id) {
            debug!(id, "delete: no todo with id");
            return Ok(false);
        }

        let previous = self.todos.clone();
        self.todos.retain(|todo| todo.id != id);

        if let Err(e) = self.save() {
            self.todos = previous;
            return Err(e);
        }

        debug!(id, removed = previous.len() - self.todos.len(), "Deleted todo");
        self.notify(Change::Deleted(id));
        Ok(true)
    }

    pub fn set_filter(&mut self, filter: TodoFilter) {
        if self.filter != filter {
            self.filter = filter;
            self.notify(Change::FilterChanged(filter));
        }
    }

    // ========================================================================
    // Views
    // ========================================================================

    pub fn filter(&self) -> TodoFilter {
        self.filter
    }

    /// The full list, in insertion order
    pub fn todos(&self) -> &[Todo] {
        &self.todos
    }

    /// The list as seen through the current filter
    pub fn filtered(&self) -> Vec<&Todo> {
        self.filter.apply(&self.todos)
    }

    pub fn get(&self, id: TodoId) -> Option<&Todo> {
        self.todos.iter().find(|todo| todo.id == id)
    }

    /// Number of todos not yet completed
    pub fn active_count(&self) -> usize {
        self.todos.iter().filter(|todo| !todo.completed).count()
    }

    fn find_mut(&mut self, id: TodoId) -> Option<&mut Todo> {
        self.todos.iter_mut().find(|todo| todo.id == id)
    }

    fn notify(&mut self, change: Change) {
        for observer in &mut self.observers {
            observer(&change);
        }
    }
}
