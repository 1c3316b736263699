// View filtering for todos

use crate::todo::Todo;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Which todos the derived view shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    #[default]
    All,
    Active,
    Completed,
}

impl TodoFilter {
    /// Whether `todo` belongs in the view under this filter
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            TodoFilter::All => true,
            TodoFilter::Active => !todo.completed,
            TodoFilter::Completed => todo.completed,
        }
    }

    /// Project `todos` through this filter, keeping order
    pub fn apply(self, todos: &[Todo]) -> Vec<&Todo> {
        todos.iter().filter(|todo| self.matches(todo)).collect()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TodoFilter::All => "all",
            TodoFilter::Active => "active",
            TodoFilter::Completed => "completed",
        }
    }
}

impl std::fmt::Display for TodoFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TodoFilter {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(TodoFilter::All),
            "active" => Ok(TodoFilter::Active),
            "completed" => Ok(TodoFilter::Completed),
            other => Err(eyre!("Invalid filter: {} (expected all, active or completed)", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn todo(id: i64, completed: bool) -> Todo {
        let mut todo = Todo::new(id, format!("todo {}", id), Utc::now());
        todo.completed = completed;
        todo
    }

    #[test]
    fn test_default_is_all() {
        assert_eq!(TodoFilter::default(), TodoFilter::All);
    }

    #[test]
    fn test_matches() {
        let open = todo(1, false);
        let done = todo(2, true);

        assert!(TodoFilter::All.matches(&open));
        assert!(TodoFilter::All.matches(&done));
        assert!(TodoFilter::Active.matches(&open));
        assert!(!TodoFilter::Active.matches(&done));
        assert!(!TodoFilter::Completed.matches(&open));
        assert!(TodoFilter::Completed.matches(&done));
    }

    #[test]
    fn test_apply_keeps_order() {
        let todos = vec![todo(1, false), todo(2, true), todo(3, false)];

        let ids: Vec<i64> = TodoFilter::Active.apply(&todos).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 3]);

        let ids: Vec<i64> = TodoFilter::All.apply(&todos).iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn test_active_and_completed_partition() {
        let todos = vec![todo(1, false), todo(2, true), todo(3, true), todo(4, false)];

        let active = TodoFilter::Active.apply(&todos);
        let completed = TodoFilter::Completed.apply(&todos);

        assert_eq!(active.len() + completed.len(), todos.len());
        assert!(active.iter().all(|t| !completed.iter().any(|c| c.id == t.id)));
    }

    #[test]
    fn test_parse_and_display() {
        for filter in [TodoFilter::All, TodoFilter::Active, TodoFilter::Completed] {
            assert_eq!(filter.to_string().parse::<TodoFilter>().unwrap(), filter);
        }
        assert_eq!("ACTIVE".parse::<TodoFilter>().unwrap(), TodoFilter::Active);
        assert!("done".parse::<TodoFilter>().is_err());
    }

    #[test]
    fn test_filter_serialization() {
        let json = serde_json::to_string(&TodoFilter::Completed).unwrap();
        assert_eq!(json, "\"completed\"");
    }
}
