use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::User;
use crate::pagination::{Page, Paginator};

/// Row for the authors listing.
#[derive(Debug, Clone)]
pub struct AuthorSummary {
    pub username: String,
    pub post_count: i64,
    pub date_joined: String,
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        date_joined: row.get(3)?,
    })
}

pub fn find_by_username(conn: &Connection, username: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, password_hash, date_joined FROM users WHERE username = ?1",
        params![username],
        user_from_row,
    )
    .optional()
}

pub fn get_by_username(conn: &Connection, username: &str) -> rusqlite::Result<User> {
    conn.query_row(
        "SELECT id, username, password_hash, date_joined FROM users WHERE username = ?1",
        params![username],
        user_from_row,
    )
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, password_hash, date_joined FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    )
    .optional()
}

pub fn username_taken(conn: &Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
}

/// Creates the user together with an empty profile.
pub fn create(conn: &Connection, username: &str, password_hash: &str) -> rusqlite::Result<i64> {
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO users (username, password_hash) VALUES (?1, ?2)",
        params![username, password_hash],
    )?;
    let id = tx.last_insert_rowid();
    tx.execute("INSERT INTO profiles (user_id) VALUES (?1)", params![id])?;
    tx.commit()?;
    Ok(id)
}

/// Like [`create`], but a username that is already taken yields `None`.
/// Concurrent signups for one name can both pass the form check; the UNIQUE
/// constraint decides which one wins.
pub fn try_create(
    conn: &Connection,
    username: &str,
    password_hash: &str,
) -> rusqlite::Result<Option<i64>> {
    match create(conn, username, password_hash) {
        Ok(id) => Ok(Some(id)),
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE =>
        {
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Removes the account. Posts, comments, follows, likes, profile and sessions
/// go with it; groups the user created lose their creator.
pub fn delete(conn: &Connection, user_id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM users WHERE id = ?1", params![user_id])
}

pub fn all_authors(
    conn: &Connection,
    page: Option<&str>,
    per_page: u32,
) -> rusqlite::Result<Page<AuthorSummary>> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
    let window = Paginator::new(total, per_page).get_page(page);

    let mut stmt = conn.prepare(
        "SELECT u.username,
                (SELECT COUNT(*) FROM posts p WHERE p.author_id = u.id) AS post_count,
                u.date_joined
         FROM users u
         ORDER BY u.username
         LIMIT ?1 OFFSET ?2",
    )?;
    let authors = stmt
        .query_map(params![window.limit, window.offset], |row| {
            Ok(AuthorSummary {
                username: row.get(0)?,
                post_count: row.get(1)?,
                date_joined: row.get(2)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Page::new(authors, window))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_test_user, test_conn};

    #[test]
    fn create_also_creates_profile() {
        let conn = test_conn();
        let id = create(&conn, "leo", "hash").unwrap();
        let profiles: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM profiles WHERE user_id = ?1",
                params![id],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(profiles, 1);
        assert!(username_taken(&conn, "leo").unwrap());
        assert!(!username_taken(&conn, "someone").unwrap());
    }

    #[test]
    fn duplicate_username_rejected() {
        let conn = test_conn();
        create(&conn, "leo", "hash").unwrap();
        assert!(create(&conn, "leo", "hash").is_err());
    }

    #[test]
    fn try_create_reports_a_taken_username() {
        let conn = test_conn();
        let id = try_create(&conn, "leo", "hash").unwrap();
        assert!(id.is_some());
        assert_eq!(try_create(&conn, "leo", "other").unwrap(), None);
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM profiles", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn find_missing_user_is_none() {
        let conn = test_conn();
        assert!(find_by_username(&conn, "ghost").unwrap().is_none());
        assert!(matches!(
            get_by_username(&conn, "ghost"),
            Err(rusqlite::Error::QueryReturnedNoRows)
        ));
    }

    #[test]
    fn delete_cascades_and_orphans_groups() {
        let conn = test_conn();
        let leo = insert_test_user(&conn, "leo");
        conn.execute(
            "INSERT INTO post_groups (title, slug, creator_id) VALUES ('G', 'g', ?1)",
            params![leo],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO posts (text, author_id) VALUES ('hi', ?1)",
            params![leo],
        )
        .unwrap();

        delete(&conn, leo).unwrap();

        let posts: i64 = conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(posts, 0);
        let creator: Option<i64> = conn
            .query_row("SELECT creator_id FROM post_groups WHERE slug = 'g'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert!(creator.is_none());
    }

    #[test]
    fn all_authors_counts_posts() {
        let conn = test_conn();
        let ann = insert_test_user(&conn, "ann");
        insert_test_user(&conn, "bob");
        for _ in 0..3 {
            conn.execute(
                "INSERT INTO posts (text, author_id) VALUES ('x', ?1)",
                params![ann],
            )
            .unwrap();
        }

        let page = all_authors(&conn, None, 20).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].username, "ann");
        assert_eq!(page.items[0].post_count, 3);
        assert_eq!(page.items[1].post_count, 0);
    }
}
