use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub date_joined: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub text: String,
    pub pub_date: String,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<String>,
}

impl Post {
    /// Short label: the first 15 characters of the text.
    pub fn label(&self) -> String {
        truncate_chars(&self.text, 15)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: i64,
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub creator_id: Option<i64>,
}

impl std::fmt::Display for Group {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub text: String,
    pub created: String,
}

impl Comment {
    pub fn label(&self) -> String {
        truncate_chars(&self.text, 15)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Follow {
    pub id: i64,
    pub user_id: i64,
    pub author_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Profile {
    pub user_id: i64,
    pub bio: String,
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Like {
    pub id: i64,
    pub user_id: i64,
    pub post_id: i64,
}

pub(crate) fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
