use serde::{Deserialize, Serialize};

use super::{Record, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: u64,
    pub content: String,
    pub done: bool,
}
impl Todo {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            id: 0,
            content: content.into(),
            done: false,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TodoFields {
    pub content: Option<String>,
    pub done: Option<bool>,
}

#[derive(Debug)]
pub struct TodoChanges {
    content: String,
    done: bool,
}

impl Record for Todo {
    type Fields = TodoFields;
    type Changes = TodoChanges;

    const NAME: &'static str = "Todo";
    const KEY: &'static str = "todo";
    const COLLECTION: &'static str = "todos";

    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    // empty content is accepted, `done` is ignored on create
    fn create(fields: TodoFields) -> Result<Self, ValidationError> {
        match fields.content {
            Some(content) => Ok(Todo::new(content)),
            None => Err(ValidationError("Content is required")),
        }
    }

    fn changes(fields: TodoFields) -> Result<TodoChanges, ValidationError> {
        match (fields.content, fields.done) {
            (Some(content), Some(done)) => Ok(TodoChanges { content, done }),
            _ => Err(ValidationError("Content and Done are required")),
        }
    }

    fn apply(&mut self, changes: TodoChanges) {
        self.content = changes.content;
        self.done = changes.done;
    }

    // case-sensitive, unlike posts
    fn matches(&self, term: &str) -> bool {
        self.content.contains(term)
    }

    fn sort_key(&self) -> &str {
        &self.content
    }
}
