#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use rusqlite::params;
use tempfile::TempDir;
use tower::ServiceExt;

use yatube::auth::{password, session};
use yatube::config::Config;
use yatube::db::{self, users};
use yatube::state::AppState;

pub const PASSWORD: &str = "password123";
const BOUNDARY: &str = "yatube-test-boundary";

/// A router over a fresh database in a temporary directory.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.resolve_paths(dir.path());
        config.auth.bcrypt_cost = 4;

        let pool = db::create_pool(&config.db_path()).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");

        let state = AppState::new(pool, config);
        let router = yatube::app::build_router(state.clone());
        Self {
            router,
            state,
            _dir: dir,
        }
    }

    pub fn conn(&self) -> r2d2::PooledConnection<r2d2_sqlite::SqliteConnectionManager> {
        self.state.db.get().unwrap()
    }

    /// Creates a user with [`PASSWORD`] and returns its id.
    pub fn user(&self, username: &str) -> i64 {
        let hash = password::hash_password(PASSWORD, 4).unwrap();
        users::create(&self.conn(), username, &hash).unwrap()
    }

    /// A `Cookie` header value for a fresh session of `user_id`.
    pub fn login(&self, user_id: i64) -> String {
        let token = session::create_session(&self.conn(), user_id, 1).unwrap();
        format!("{}={}", self.state.config.auth.cookie_name, token)
    }

    pub fn group(&self, creator_id: i64, slug: &str, title: &str) -> i64 {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO post_groups (title, slug, creator_id) VALUES (?1, ?2, ?3)",
            params![title, slug, creator_id],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn post(&self, author_id: i64, group_id: Option<i64>, text: &str) -> i64 {
        let conn = self.conn();
        conn.execute(
            "INSERT INTO posts (text, author_id, group_id) VALUES (?1, ?2, ?3)",
            params![text, author_id, group_id],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    pub fn count(&self, sql: &str) -> i64 {
        self.conn().query_row(sql, [], |row| row.get(0)).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> Response<Body> {
        self.router.clone().oneshot(request).await.unwrap()
    }

    pub async fn get(&self, uri: &str, cookie: Option<&str>) -> Response<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    pub async fn post_form(&self, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body.to_string())).unwrap())
            .await
    }

    pub async fn post_multipart(
        &self,
        uri: &str,
        cookie: Option<&str>,
        fields: &[(&str, &str)],
    ) -> Response<Body> {
        let parts: Vec<Part> = fields
            .iter()
            .map(|(name, value)| Part::text(name, value))
            .collect();
        self.post_parts(uri, cookie, &parts).await
    }

    pub async fn post_parts(
        &self,
        uri: &str,
        cookie: Option<&str>,
        parts: &[Part<'_>],
    ) -> Response<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part.filename {
                Some(filename) => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                ),
                None => body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"\r\n\r\n",
                        part.name
                    )
                    .as_bytes(),
                ),
            }
            body.extend_from_slice(part.body);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            );
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Reads an uploaded file back from the media directory.
    pub fn media_file(&self, relative: &str) -> Option<Vec<u8>> {
        std::fs::read(self.state.config.media_path().join(relative)).ok()
    }
}

/// One multipart part; file parts carry a filename.
pub struct Part<'a> {
    pub name: &'a str,
    pub filename: Option<&'a str>,
    pub body: &'a [u8],
}

impl<'a> Part<'a> {
    pub fn text(name: &'a str, value: &'a str) -> Self {
        Self {
            name,
            filename: None,
            body: value.as_bytes(),
        }
    }

    pub fn file(name: &'a str, filename: &'a str, body: &'a [u8]) -> Self {
        Self {
            name,
            filename: Some(filename),
            body,
        }
    }
}

/// A 1x1 transparent GIF.
pub const SMALL_GIF: &[u8] = b"GIF89a\x01\x00\x01\x00\x00\x00\x00!\xf9\x04\x01\x0a\x00\x01\x00,\x00\x00\x00\x00\x01\x00\x01\x00\x00\x02\x02L\x01\x00;";

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response has no Location header")
        .to_str()
        .unwrap()
}

pub fn assert_redirect(response: &Response<Body>, to: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), to);
}

/// Number of post cards on a rendered page.
pub fn post_cards(html: &str) -> usize {
    html.matches("class=\"card post-card\"").count()
}
