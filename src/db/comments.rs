use rusqlite::{params, Connection};

use crate::dates;
use crate::db::models::Comment;

#[derive(Debug, Clone)]
pub struct CommentView {
    pub id: i64,
    pub author: String,
    pub text: String,
    pub created: String,
}

/// Comments on a post, oldest first.
pub fn for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<Vec<CommentView>> {
    let mut stmt = conn.prepare(
        "SELECT c.id, u.username, c.text, c.created
         FROM comments c
         JOIN users u ON u.id = c.author_id
         WHERE c.post_id = ?1
         ORDER BY c.created ASC, c.id ASC",
    )?;

    let comments = stmt
        .query_map(params![post_id], |row| {
            let created: String = row.get(3)?;
            Ok(CommentView {
                id: row.get(0)?,
                author: row.get(1)?,
                text: row.get(2)?,
                created: dates::display(&created),
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(comments)
}

pub fn create(
    conn: &Connection,
    post_id: i64,
    author_id: i64,
    text: &str,
) -> rusqlite::Result<Comment> {
    conn.query_row(
        "INSERT INTO comments (post_id, author_id, text) VALUES (?1, ?2, ?3)
         RETURNING id, post_id, author_id, text, created",
        params![post_id, author_id, text],
        |row| {
            Ok(Comment {
                id: row.get(0)?,
                post_id: row.get(1)?,
                author_id: row.get(2)?,
                text: row.get(3)?,
                created: row.get(4)?,
            })
        },
    )
}
