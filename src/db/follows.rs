use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Follow;
use crate::pagination::{Page, Paginator};

/// Follower and following counts plus whether the viewer follows the author.
#[derive(Debug, Clone, Default)]
pub struct FollowStats {
    pub followers_count: i64,
    pub followings_count: i64,
    pub following: bool,
}

pub fn stats(conn: &Connection, author_id: i64, viewer_id: Option<i64>) -> rusqlite::Result<FollowStats> {
    conn.query_row(
        "SELECT
            (SELECT COUNT(*) FROM follows WHERE author_id = ?1),
            (SELECT COUNT(*) FROM follows WHERE user_id = ?1),
            EXISTS(SELECT 1 FROM follows WHERE user_id = ?2 AND author_id = ?1)",
        params![author_id, viewer_id],
        |row| {
            Ok(FollowStats {
                followers_count: row.get(0)?,
                followings_count: row.get(1)?,
                following: row.get(2)?,
            })
        },
    )
}

pub fn find(conn: &Connection, user_id: i64, author_id: i64) -> rusqlite::Result<Option<Follow>> {
    conn.query_row(
        "SELECT id, user_id, author_id FROM follows WHERE user_id = ?1 AND author_id = ?2",
        params![user_id, author_id],
        |row| {
            Ok(Follow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                author_id: row.get(2)?,
            })
        },
    )
    .optional()
}

/// Returns the follow row, creating it if needed. Self-follows are refused
/// with `None`.
pub fn get_or_create(
    conn: &Connection,
    user_id: i64,
    author_id: i64,
) -> rusqlite::Result<Option<Follow>> {
    if user_id == author_id {
        return Ok(None);
    }
    conn.execute(
        "INSERT OR IGNORE INTO follows (user_id, author_id) VALUES (?1, ?2)",
        params![user_id, author_id],
    )?;
    find(conn, user_id, author_id)
}

pub fn delete(conn: &Connection, user_id: i64, author_id: i64) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM follows WHERE user_id = ?1 AND author_id = ?2",
        params![user_id, author_id],
    )
}

/// Whom a user follows, or who follows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Following,
    Followers,
}

pub fn list_users(
    conn: &Connection,
    user_id: i64,
    direction: Direction,
    page: Option<&str>,
    per_page: u32,
) -> rusqlite::Result<Page<String>> {
    let (count_sql, list_sql) = match direction {
        Direction::Following => (
            "SELECT COUNT(*) FROM follows WHERE user_id = ?1",
            "SELECT u.username FROM follows f JOIN users u ON u.id = f.author_id
             WHERE f.user_id = ?1 ORDER BY u.username LIMIT ?2 OFFSET ?3",
        ),
        Direction::Followers => (
            "SELECT COUNT(*) FROM follows WHERE author_id = ?1",
            "SELECT u.username FROM follows f JOIN users u ON u.id = f.user_id
             WHERE f.author_id = ?1 ORDER BY u.username LIMIT ?2 OFFSET ?3",
        ),
    };

    let total: i64 = conn.query_row(count_sql, params![user_id], |row| row.get(0))?;
    let window = Paginator::new(total, per_page).get_page(page);

    let mut stmt = conn.prepare(list_sql)?;
    let names = stmt
        .query_map(params![user_id, window.limit, window.offset], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<String>>>()?;

    Ok(Page::new(names, window))
}
