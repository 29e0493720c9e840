use rusqlite::{params, Connection, OptionalExtension};

use crate::db::models::Profile;

/// The user's profile; users without a row get an empty one.
pub fn get_or_default(conn: &Connection, user_id: i64) -> rusqlite::Result<Profile> {
    let profile = conn
        .query_row(
            "SELECT user_id, bio, image FROM profiles WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(Profile {
                    user_id: row.get(0)?,
                    bio: row.get(1)?,
                    image: row.get(2)?,
                })
            },
        )
        .optional()?;

    Ok(profile.unwrap_or(Profile {
        user_id,
        ..Profile::default()
    }))
}

/// Creates or updates the profile. `image` of `None` keeps the current avatar.
pub fn upsert(conn: &Connection, user_id: i64, bio: &str, image: Option<&str>) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO profiles (user_id, bio, image) VALUES (?1, ?2, ?3)
         ON CONFLICT(user_id) DO UPDATE SET
           bio = excluded.bio,
           image = COALESCE(excluded.image, profiles.image)",
        params![user_id, bio, image],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{insert_test_user, test_conn};

    #[test]
    fn missing_profile_is_empty() {
        let conn = test_conn();
        let ann = insert_test_user(&conn, "ann");
        let profile = get_or_default(&conn, ann).unwrap();
        assert_eq!(profile.user_id, ann);
        assert!(profile.bio.is_empty());
        assert!(profile.image.is_none());
    }

    #[test]
    fn upsert_creates_then_updates_keeping_avatar() {
        let conn = test_conn();
        let ann = insert_test_user(&conn, "ann");

        upsert(&conn, ann, "hello", Some("users/a.png")).unwrap();
        upsert(&conn, ann, "updated", None).unwrap();

        let profile = get_or_default(&conn, ann).unwrap();
        assert_eq!(profile.bio, "updated");
        assert_eq!(profile.image.as_deref(), Some("users/a.png"));
    }
}
