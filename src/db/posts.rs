use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use crate::dates;
use crate::db::like_pattern;
use crate::db::models::{truncate_chars, Post};
use crate::pagination::{Page, Paginator};

/// Group reference shown on a post card.
#[derive(Debug, Clone)]
pub struct GroupRef {
    pub slug: String,
    pub title: String,
}

/// A post as rendered in lists and on its own page.
#[derive(Debug, Clone)]
pub struct PostCard {
    pub id: i64,
    pub text: String,
    pub pub_date: String,
    pub author: String,
    pub group: Option<GroupRef>,
    pub image: Option<String>,
    pub comment_count: i64,
    pub like_count: i64,
    pub liked: bool,
}

impl PostCard {
    /// First 15 characters of the text, used as the page title.
    pub fn label(&self) -> String {
        truncate_chars(&self.text, 15)
    }
}

/// Which posts a listing shows.
#[derive(Debug, Clone, Copy)]
pub enum PostFilter<'a> {
    All,
    Group(i64),
    Author(i64),
    /// Posts by authors the given user follows.
    FollowedBy(i64),
    /// Text, author username or group title contains the needle.
    Search(&'a str),
}

impl PostFilter<'_> {
    fn clause(&self) -> (&'static str, Vec<Value>) {
        match *self {
            PostFilter::All => ("1 = 1", Vec::new()),
            PostFilter::Group(id) => ("p.group_id = ?", vec![Value::Integer(id)]),
            PostFilter::Author(id) => ("p.author_id = ?", vec![Value::Integer(id)]),
            PostFilter::FollowedBy(id) => (
                "p.author_id IN (SELECT f.author_id FROM follows f WHERE f.user_id = ?)",
                vec![Value::Integer(id)],
            ),
            PostFilter::Search(needle) => {
                let pattern = Value::Text(like_pattern(needle));
                (
                    "(p.text LIKE ? ESCAPE '\\' \
                      OR u.username LIKE ? ESCAPE '\\' \
                      OR g.title LIKE ? ESCAPE '\\')",
                    vec![pattern.clone(), pattern.clone(), pattern],
                )
            }
        }
    }
}

const FROM_POSTS: &str = "FROM posts p
     JOIN users u ON u.id = p.author_id
     LEFT JOIN post_groups g ON g.id = p.group_id";

const CARD_COLUMNS: &str = "p.id, p.text, p.pub_date, u.username, g.slug, g.title, p.image,
     (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comment_count,
     (SELECT COUNT(*) FROM likes l WHERE l.post_id = p.id) AS like_count,
     EXISTS(SELECT 1 FROM likes l WHERE l.post_id = p.id AND l.user_id = ?) AS liked";

fn card_from_row(row: &Row<'_>) -> rusqlite::Result<PostCard> {
    let pub_date: String = row.get(2)?;
    let group = match (row.get::<_, Option<String>>(4)?, row.get::<_, Option<String>>(5)?) {
        (Some(slug), Some(title)) => Some(GroupRef { slug, title }),
        _ => None,
    };
    Ok(PostCard {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: dates::display(&pub_date),
        author: row.get(3)?,
        group,
        image: row.get(6)?,
        comment_count: row.get(7)?,
        like_count: row.get(8)?,
        liked: row.get(9)?,
    })
}

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        text: row.get(1)?,
        pub_date: row.get(2)?,
        author_id: row.get(3)?,
        group_id: row.get(4)?,
        image: row.get(5)?,
    })
}

pub fn count(conn: &Connection, filter: PostFilter<'_>) -> rusqlite::Result<i64> {
    let (clause, args) = filter.clause();
    let sql = format!("SELECT COUNT(*) {FROM_POSTS} WHERE {clause}");
    conn.query_row(&sql, params_from_iter(args), |row| row.get(0))
}

/// One page of post cards, newest first.
pub fn list(
    conn: &Connection,
    filter: PostFilter<'_>,
    viewer_id: Option<i64>,
    page: Option<&str>,
    per_page: u32,
) -> rusqlite::Result<Page<PostCard>> {
    let total = count(conn, filter)?;
    let window = Paginator::new(total, per_page).get_page(page);

    let (clause, filter_args) = filter.clause();
    let sql = format!(
        "SELECT {CARD_COLUMNS} {FROM_POSTS} WHERE {clause}
         ORDER BY p.pub_date DESC, p.id DESC
         LIMIT ? OFFSET ?"
    );

    let mut args = Vec::with_capacity(filter_args.len() + 3);
    args.push(viewer_arg(viewer_id));
    args.extend(filter_args);
    args.push(Value::Integer(window.limit));
    args.push(Value::Integer(window.offset));

    let mut stmt = conn.prepare(&sql)?;
    let cards = stmt
        .query_map(params_from_iter(args), card_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(Page::new(cards, window))
}

/// The card for one post, which must belong to `username`.
pub fn card(
    conn: &Connection,
    username: &str,
    post_id: i64,
    viewer_id: Option<i64>,
) -> rusqlite::Result<PostCard> {
    let sql = format!("SELECT {CARD_COLUMNS} {FROM_POSTS} WHERE p.id = ? AND u.username = ?");
    conn.query_row(
        &sql,
        params![viewer_arg(viewer_id), post_id, username],
        card_from_row,
    )
}

/// The stored post, which must belong to `username`.
pub fn get_by_author(conn: &Connection, username: &str, post_id: i64) -> rusqlite::Result<Post> {
    conn.query_row(
        "SELECT p.id, p.text, p.pub_date, p.author_id, p.group_id, p.image
         FROM posts p JOIN users u ON u.id = p.author_id
         WHERE p.id = ?1 AND u.username = ?2",
        params![post_id, username],
        post_from_row,
    )
}

/// Does `username` have a post with this id?
pub fn exists_for_author(conn: &Connection, username: &str, post_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM posts p JOIN users u ON u.id = p.author_id
                       WHERE p.id = ?1 AND u.username = ?2)",
        params![post_id, username],
        |row| row.get(0),
    )
}

pub struct NewPost<'a> {
    pub text: &'a str,
    pub author_id: i64,
    pub group_id: Option<i64>,
    pub image: Option<&'a str>,
}

pub fn create(conn: &Connection, post: &NewPost<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO posts (text, author_id, group_id, image) VALUES (?1, ?2, ?3, ?4)",
        params![post.text, post.author_id, post.group_id, post.image],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Updates text and group. `image` of `None` keeps the current image.
pub fn update(
    conn: &Connection,
    post_id: i64,
    text: &str,
    group_id: Option<i64>,
    image: Option<&str>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE posts SET text = ?1, group_id = ?2, image = COALESCE(?3, image) WHERE id = ?4",
        params![text, group_id, image, post_id],
    )
}

/// Deletes the post; its comments and likes go with it.
pub fn delete(conn: &Connection, post_id: i64) -> rusqlite::Result<usize> {
    conn.execute("DELETE FROM posts WHERE id = ?1", params![post_id])
}

fn viewer_arg(viewer_id: Option<i64>) -> Value {
    match viewer_id {
        Some(id) => Value::Integer(id),
        None => Value::Null,
    }
}
