use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Like;

pub fn find(conn: &Connection, user_id: i64, post_id: i64) -> rusqlite::Result<Option<Like>> {
    conn.query_row(
        "SELECT id, user_id, post_id FROM likes WHERE user_id = ?1 AND post_id = ?2",
        params![user_id, post_id],
        |row| {
            Ok(Like {
                id: row.get(0)?,
                user_id: row.get(1)?,
                post_id: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Likes the post if the user hasn't yet, otherwise removes the like.
/// Returns whether the post is liked afterwards.
pub fn toggle(conn: &Connection, user_id: i64, post_id: i64) -> rusqlite::Result<bool> {
    match find(conn, user_id, post_id)? {
        Some(like) => {
            conn.execute("DELETE FROM likes WHERE id = ?1", params![like.id])?;
            Ok(false)
        }
        None => {
            conn.execute(
                "INSERT OR IGNORE INTO likes (user_id, post_id) VALUES (?1, ?2)",
                params![user_id, post_id],
            )?;
            Ok(true)
        }
    }
}

pub fn count_for_post(conn: &Connection, post_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE post_id = ?1",
        params![post_id],
        |row| row.get(0),
    )
}
