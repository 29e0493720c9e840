use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::Group;
use crate::pagination::{Page, Paginator};

/// Row for group listings.
#[derive(Debug, Clone)]
pub struct GroupSummary {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
    pub creator: Option<String>,
    pub post_count: i64,
}

/// Submitted group fields.
pub struct GroupFields<'a> {
    pub title: &'a str,
    pub slug: &'a str,
    pub description: Option<&'a str>,
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: row.get(0)?,
        title: row.get(1)?,
        slug: row.get(2)?,
        description: row.get(3)?,
        creator_id: row.get(4)?,
    })
}

pub fn get_by_slug(conn: &Connection, slug: &str) -> rusqlite::Result<Group> {
    conn.query_row(
        "SELECT id, title, slug, description, creator_id FROM post_groups WHERE slug = ?1",
        params![slug],
        group_from_row,
    )
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<Group>> {
    conn.query_row(
        "SELECT id, title, slug, description, creator_id FROM post_groups WHERE id = ?1",
        params![id],
        group_from_row,
    )
    .optional()
}

/// Is `slug` used by a group other than `except_id`?
pub fn slug_taken(conn: &Connection, slug: &str, except_id: Option<i64>) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM post_groups WHERE slug = ?1 AND (?2 IS NULL OR id != ?2)",
        params![slug, except_id],
        |row| row.get(0),
    )
}

/// All groups, for the post form's choice list.
pub fn all(conn: &Connection) -> rusqlite::Result<Vec<Group>> {
    let mut stmt = conn.prepare(
        "SELECT id, title, slug, description, creator_id FROM post_groups ORDER BY title, id",
    )?;
    let groups = stmt
        .query_map([], group_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(groups)
}

fn summaries(
    conn: &Connection,
    creator_id: Option<i64>,
    page: Option<&str>,
    per_page: u32,
) -> rusqlite::Result<Page<GroupSummary>> {
    let total: i64 = conn.query_row(
        "SELECT COUNT(*) FROM post_groups WHERE ?1 IS NULL OR creator_id = ?1",
        params![creator_id],
        |row| row.get(0),
    )?;
    let window = Paginator::new(total, per_page).get_page(page);

    let mut stmt = conn.prepare(
        "SELECT g.title, g.slug, g.description, u.username,
                (SELECT COUNT(*) FROM posts p WHERE p.group_id = g.id) AS post_count
         FROM post_groups g
         LEFT JOIN users u ON u.id = g.creator_id
         WHERE ?1 IS NULL OR g.creator_id = ?1
         ORDER BY g.title, g.id
         LIMIT ?2 OFFSET ?3",
    )?;
    let groups = stmt
        .query_map(params![creator_id, window.limit, window.offset], |row| {
            Ok(GroupSummary {
                title: row.get(0)?,
                slug: row.get(1)?,
                description: row.get(2)?,
                creator: row.get(3)?,
                post_count: row.get(4)?,
            })
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Page::new(groups, window))
}

pub fn list_all(
    conn: &Connection,
    page: Option<&str>,
    per_page: u32,
) -> rusqlite::Result<Page<GroupSummary>> {
    summaries(conn, None, page, per_page)
}

pub fn list_by_creator(
    conn: &Connection,
    creator_id: i64,
    page: Option<&str>,
    per_page: u32,
) -> rusqlite::Result<Page<GroupSummary>> {
    summaries(conn, Some(creator_id), page, per_page)
}

pub fn create(conn: &Connection, fields: &GroupFields<'_>, creator_id: i64) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO post_groups (title, slug, description, creator_id) VALUES (?1, ?2, ?3, ?4)",
        params![fields.title, fields.slug, fields.description, creator_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn update(conn: &Connection, group_id: i64, fields: &GroupFields<'_>) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE post_groups SET title = ?1, slug = ?2, description = ?3 WHERE id = ?4",
        params![fields.title, fields.slug, fields.description, group_id],
    )
}

/// Deletes the group. Its posts stay, without a group.
pub fn delete(conn: &Connection, group_id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM post_groups WHERE id = ?1", params![group_id])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_test_user, test_conn};

    fn fields<'a>(title: &'a str, slug: &'a str) -> GroupFields<'a> {
        GroupFields {
            title,
            slug,
            description: Some("about"),
        }
    }

    #[test]
    fn create_and_fetch_by_slug() {
        let conn = test_conn();
        let ann = insert_test_user(&conn, "ann");
        let id = create(&conn, &fields("Rust", "rust"), ann).unwrap();

        let group = get_by_slug(&conn, "rust").unwrap();
        assert_eq!(group.id, id);
        assert_eq!(group.creator_id, Some(ann));
        assert!(find_by_id(&conn, id).unwrap().is_some());
        assert!(find_by_id(&conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn slug_taken_ignores_own_group() {
        let conn = test_conn();
        let ann = insert_test_user(&conn, "ann");
        let id = create(&conn, &fields("Rust", "rust"), ann).unwrap();

        assert!(slug_taken(&conn, "rust", None).unwrap());
        assert!(!slug_taken(&conn, "rust", Some(id)).unwrap());
        assert!(!slug_taken(&conn, "go", None).unwrap());
    }

    #[test]
    fn delete_keeps_posts_without_group() {
        let conn = test_conn();
        let ann = insert_test_user(&conn, "ann");
        let id = create(&conn, &fields("Rust", "rust"), ann).unwrap();
        conn.execute(
            "INSERT INTO posts (text, author_id, group_id) VALUES ('p', ?1, ?2)",
            params![ann, id],
        )
        .unwrap();

        delete(&conn, id).unwrap();

        let group_id: Option<i64> = conn
            .query_row("SELECT group_id FROM posts", [], |row| row.get(0))
            .unwrap();
        assert!(group_id.is_none());
    }

    #[test]
    fn listings_filter_by_creator() {
        let conn = test_conn();
        let ann = insert_test_user(&conn, "ann");
        let bob = insert_test_user(&conn, "bob");
        create(&conn, &fields("A", "a"), ann).unwrap();
        create(&conn, &fields("B", "b"), bob).unwrap();

        assert_eq!(list_all(&conn, None, 20).unwrap().len(), 2);
        let anns = list_by_creator(&conn, ann, None, 20).unwrap();
        assert_eq!(anns.len(), 1);
        assert_eq!(anns.items[0].creator.as_deref(), Some("ann"));
        assert_eq!(all(&conn).unwrap().len(), 2);
    }
}
