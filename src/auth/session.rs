use rand::Rng;
use rusqlite::{params, Connection, OptionalExtension};

/// Create a new session for a user. Returns the session token.
pub fn create_session(conn: &Connection, user_id: i64, hours: u64) -> Result<String, rusqlite::Error> {
    let token = generate_token();
    let id = uuid::Uuid::now_v7().to_string();

    conn.execute(
        "INSERT INTO sessions (id, user_id, token, expires_at) VALUES (?1, ?2, ?3, datetime('now', ?4))",
        params![id, user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// The `(user id, username)` an unexpired session token belongs to.
pub fn lookup(conn: &Connection, token: &str) -> Result<Option<(i64, String)>, rusqlite::Error> {
    conn.query_row(
        "SELECT u.id, u.username FROM sessions s \
         JOIN users u ON u.id = s.user_id \
         WHERE s.token = ?1 AND s.expires_at > datetime('now')",
        params![token],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()
}

/// Delete a session by token.
pub fn delete_session(conn: &Connection, token: &str) -> Result<(), rusqlite::Error> {
    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Drop sessions whose expiry has passed.
pub fn purge_expired(conn: &Connection) -> Result<usize, rusqlite::Error> {
    conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )
}

/// Generate a cryptographically random 32-byte hex token.
fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

pub fn session_cookie(name: &str, token: &str, max_age_hours: u64) -> String {
    let max_age_secs = max_age_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        name, token, max_age_secs
    )
}

pub fn clear_session_cookie(name: &str) -> String {
    format!("{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0", name)
}

/// Reads a cookie value from request headers.
pub fn cookie_value<'a>(headers: &'a axum::http::HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(axum::http::header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let mut split = cookie.splitn(2, '=');
            let key = split.next()?.trim();
            let val = split.next()?.trim();
            if key == name {
                Some(val)
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_test_user, test_conn};
    use axum::http::{header, HeaderMap, HeaderValue};

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn session_round_trip() {
        let conn = test_conn();
        let ann = insert_test_user(&conn, "ann");
        let token = create_session(&conn, ann, 1).unwrap();

        assert_eq!(lookup(&conn, &token).unwrap(), Some((ann, "ann".to_string())));
        delete_session(&conn, &token).unwrap();
        assert_eq!(lookup(&conn, &token).unwrap(), None);
    }

    #[test]
    fn expired_sessions_are_ignored_and_purged() {
        let conn = test_conn();
        let ann = insert_test_user(&conn, "ann");
        conn.execute(
            "INSERT INTO sessions (id, user_id, token, expires_at)
             VALUES ('old', ?1, 'stale', datetime('now', '-1 hours'))",
            params![ann],
        )
        .unwrap();

        assert_eq!(lookup(&conn, "stale").unwrap(), None);
        assert_eq!(purge_expired(&conn).unwrap(), 1);
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; yatube_session=abc123"),
        );
        assert_eq!(cookie_value(&headers, "yatube_session"), Some("abc123"));
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookies_are_http_only() {
        let cookie = session_cookie("yatube_session", "tok", 2);
        assert!(cookie.starts_with("yatube_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=7200"));
        assert!(clear_session_cookie("yatube_session").contains("Max-Age=0"));
    }
}
