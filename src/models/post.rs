use serde::{Deserialize, Serialize};

use super::{Record, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: u64,
    pub title: String,
    pub content: String,
    pub author: String,
}
impl Post {
    pub fn new(
        title: impl Into<String>,
        content: impl Into<String>,
        author: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            title: title.into(),
            content: content.into(),
            author: author.into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PostFields {
    pub title: Option<String>,
    pub content: Option<String>,
    pub author: Option<String>,
}

#[derive(Debug)]
pub struct PostChanges {
    title: String,
    content: String,
    author: String,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

impl Record for Post {
    type Fields = PostFields;
    type Changes = PostChanges;

    const NAME: &'static str = "Post";
    const KEY: &'static str = "post";
    const COLLECTION: &'static str = "posts";

    fn id(&self) -> u64 {
        self.id
    }
    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn create(fields: PostFields) -> Result<Self, ValidationError> {
        match (
            non_empty(fields.title),
            non_empty(fields.content),
            non_empty(fields.author),
        ) {
            (Some(title), Some(content), Some(author)) => Ok(Post::new(title, content, author)),
            _ => Err(ValidationError("Title, content, and author are required")),
        }
    }

    // update only requires presence, empty strings go through
    fn changes(fields: PostFields) -> Result<PostChanges, ValidationError> {
        match (fields.title, fields.content, fields.author) {
            (Some(title), Some(content), Some(author)) => Ok(PostChanges {
                title,
                content,
                author,
            }),
            _ => Err(ValidationError("Title, Content and Author are required")),
        }
    }

    fn apply(&mut self, changes: PostChanges) {
        self.title = changes.title;
        self.content = changes.content;
        self.author = changes.author;
    }

    fn matches(&self, term: &str) -> bool {
        self.author.to_lowercase().contains(&term.to_lowercase())
    }

    fn sort_key(&self) -> &str {
        &self.title
    }
}
