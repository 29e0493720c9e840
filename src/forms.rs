//! Submitted forms, their validation rules and field-level error messages.
//!
//! A form that fails validation is rendered again with the submitted values
//! and the messages collected in [`FieldErrors`].

use std::collections::BTreeMap;

use axum::extract::Multipart;
use rusqlite::Connection;
use serde::Deserialize;

use crate::db::groups;
use crate::error::AppResult;
use crate::uploads::UploadedImage;

const REQUIRED: &str = "This field is required.";
const BAD_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

#[derive(Debug, Clone, Default)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        !self.get(field).is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn is_slug(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn is_username(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '.' | '@' | '+' | '-'))
}

/// Usernames that would collide with fixed top-level routes.
const RESERVED_USERNAMES: &[&str] = &[
    "about",
    "allauthors",
    "allgroups",
    "auth",
    "follow",
    "followers",
    "following",
    "group",
    "media",
    "new",
    "newgroup",
    "profile-settings",
    "search",
    "static",
];

/// Reads a multipart body into text fields and at most one image field.
///
/// A file part without content (no file chosen) counts as absent; a file part
/// that is not a recognised image sets `bad_image`.
struct MultipartFields {
    text: BTreeMap<String, String>,
    image: Option<UploadedImage>,
    bad_image: bool,
}

impl MultipartFields {
    async fn read(mut multipart: Multipart, image_field: &str) -> AppResult<Self> {
        let mut fields = MultipartFields {
            text: BTreeMap::new(),
            image: None,
            bad_image: false,
        };

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == image_field {
                let bytes = field.bytes().await?;
                if bytes.is_empty() {
                    continue;
                }
                match UploadedImage::from_bytes(bytes.to_vec()) {
                    Some(image) => fields.image = Some(image),
                    None => fields.bad_image = true,
                }
            } else {
                let value = field.text().await?;
                fields.text.insert(name, value);
            }
        }

        Ok(fields)
    }

    fn take(&mut self, name: &str) -> String {
        self.text.remove(name).unwrap_or_default()
    }
}

// --- Posts ---

#[derive(Debug, Clone, Default)]
pub struct PostForm {
    pub text: String,
    /// Selected group id as submitted; empty for "no group".
    pub group: String,
    pub image: Option<UploadedImage>,
    pub errors: FieldErrors,
}

#[derive(Debug)]
pub struct ValidPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<UploadedImage>,
}

impl PostForm {
    pub fn from_post(text: &str, group_id: Option<i64>) -> Self {
        Self {
            text: text.to_string(),
            group: group_id.map(|id| id.to_string()).unwrap_or_default(),
            ..Self::default()
        }
    }

    pub async fn from_multipart(multipart: Multipart) -> AppResult<Self> {
        let mut fields = MultipartFields::read(multipart, "image").await?;
        let mut form = PostForm {
            text: fields.take("text"),
            group: fields.take("group"),
            image: fields.image.take(),
            errors: FieldErrors::default(),
        };
        if fields.bad_image {
            form.errors.add("image", BAD_IMAGE);
        }
        Ok(form)
    }

    pub fn is_selected(&self, group_id: i64) -> bool {
        self.group == group_id.to_string()
    }

    /// On failure the form comes back with its errors filled in.
    pub fn validate(mut self, conn: &Connection) -> AppResult<Result<ValidPost, PostForm>> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            self.errors.add("text", REQUIRED);
        }

        let group = self.group.trim();
        let group_id = if group.is_empty() {
            None
        } else {
            match group.parse::<i64>() {
                Ok(id) if groups::find_by_id(conn, id)?.is_some() => Some(id),
                _ => {
                    self.errors.add(
                        "group",
                        "Select a valid choice. That choice is not one of the available choices.",
                    );
                    None
                }
            }
        };

        if !self.errors.is_empty() {
            return Ok(Err(self));
        }
        Ok(Ok(ValidPost {
            text,
            group_id,
            image: self.image,
        }))
    }
}

// --- Comments ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
    #[serde(skip)]
    pub errors: FieldErrors,
}

impl CommentForm {
    pub fn validate(mut self) -> Result<String, CommentForm> {
        let text = self.text.trim().to_string();
        if text.is_empty() {
            self.errors.add("text", REQUIRED);
            return Err(self);
        }
        Ok(text)
    }
}

// --- Groups ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GroupForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub slug: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip)]
    pub errors: FieldErrors,
}

#[derive(Debug)]
pub struct ValidGroup {
    pub title: String,
    pub slug: String,
    pub description: Option<String>,
}

impl GroupForm {
    pub fn from_group(group: &crate::db::models::Group) -> Self {
        Self {
            title: group.title.clone(),
            slug: group.slug.clone(),
            description: group.description.clone().unwrap_or_default(),
            errors: FieldErrors::default(),
        }
    }

    /// `editing` is the id of the group being edited, so its own slug is not
    /// reported as taken.
    pub fn validate(
        mut self,
        conn: &Connection,
        editing: Option<i64>,
    ) -> AppResult<Result<ValidGroup, GroupForm>> {
        let title = self.title.trim().to_string();
        let slug = self.slug.trim().to_string();
        let description = self.description.trim().to_string();

        if title.is_empty() {
            self.errors.add("title", REQUIRED);
        } else if title.chars().count() > 200 {
            self.errors
                .add("title", "Ensure this value has at most 200 characters.");
        }

        if slug.is_empty() {
            self.errors.add("slug", REQUIRED);
        } else if !is_slug(&slug) {
            self.errors.add(
                "slug",
                "Enter a valid slug consisting of letters, numbers, underscores or hyphens.",
            );
        } else if groups::slug_taken(conn, &slug, editing)? {
            self.errors.add("slug", "A group with this slug already exists.");
        }

        if !self.errors.is_empty() {
            return Ok(Err(self));
        }
        Ok(Ok(ValidGroup {
            title,
            slug,
            description: (!description.is_empty()).then_some(description),
        }))
    }
}

// --- Profiles ---

#[derive(Debug, Clone, Default)]
pub struct ProfileForm {
    pub bio: String,
    pub image: Option<UploadedImage>,
    pub errors: FieldErrors,
}

#[derive(Debug)]
pub struct ValidProfile {
    pub bio: String,
    pub image: Option<UploadedImage>,
}

impl ProfileForm {
    pub fn from_bio(bio: &str) -> Self {
        Self {
            bio: bio.to_string(),
            ..Self::default()
        }
    }

    pub async fn from_multipart(multipart: Multipart) -> AppResult<Self> {
        let mut fields = MultipartFields::read(multipart, "image").await?;
        let mut form = ProfileForm {
            bio: fields.take("bio"),
            image: fields.image.take(),
            errors: FieldErrors::default(),
        };
        if fields.bad_image {
            form.errors.add("image", BAD_IMAGE);
        }
        Ok(form)
    }

    pub fn validate(mut self) -> Result<ValidProfile, ProfileForm> {
        let bio = self.bio.trim().to_string();
        if bio.chars().count() > 500 {
            self.errors
                .add("bio", "Ensure this value has at most 500 characters.");
        }
        if !self.errors.is_empty() {
            return Err(self);
        }
        Ok(ValidProfile {
            bio,
            image: self.image,
        })
    }
}

// --- Accounts ---

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
    #[serde(skip)]
    pub errors: FieldErrors,
}

#[derive(Debug)]
pub struct ValidSignup {
    pub username: String,
    pub password: String,
}

const USERNAME_TAKEN: &str = "A user with that username already exists.";

impl SignupForm {
    /// The form shown again when the name was claimed after validation.
    pub fn taken(username: String) -> Self {
        let mut form = SignupForm {
            username,
            ..Default::default()
        };
        form.errors.add("username", USERNAME_TAKEN);
        form
    }

    pub fn validate(mut self, conn: &Connection) -> AppResult<Result<ValidSignup, SignupForm>> {
        let username = self.username.trim().to_string();

        if username.is_empty() {
            self.errors.add("username", REQUIRED);
        } else if username.chars().count() > 150 || !is_username(&username) {
            self.errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            );
        } else if RESERVED_USERNAMES.contains(&username.to_lowercase().as_str()) {
            self.errors.add("username", "This username is reserved.");
        } else if crate::db::users::username_taken(conn, &username)? {
            self.errors.add("username", USERNAME_TAKEN);
        }

        if self.password1.chars().count() < 8 {
            self.errors.add(
                "password1",
                "This password is too short. It must contain at least 8 characters.",
            );
        }
        if self.password1 != self.password2 {
            self.errors
                .add("password2", "The two password fields didn't match.");
        }

        // Never echo passwords back into the form.
        let password = std::mem::take(&mut self.password1);
        self.password2.clear();

        if !self.errors.is_empty() {
            return Ok(Err(self));
        }
        Ok(Ok(ValidSignup { username, password }))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: String,
    #[serde(skip)]
    pub errors: FieldErrors,
}

impl LoginForm {
    pub fn with_next(next: Option<String>) -> Self {
        Self {
            next: next.unwrap_or_default(),
            ..Self::default()
        }
    }

    pub fn reject(mut self) -> Self {
        self.password.clear();
        self.errors.add(
            "__all__",
            "Please enter a correct username and password. Note that both fields may be case-sensitive.",
        );
        self
    }

    /// Where to go after logging in: `next` when it is a local path.
    pub fn redirect_target(&self) -> &str {
        safe_next(&self.next)
    }
}

/// Only site-relative paths are honoured; anything else falls back to `/`.
pub fn safe_next(next: &str) -> &str {
    if next.starts_with('/') && !next.starts_with("//") && !next.contains('\\') {
        next
    } else {
        "/"
    }
}

#[cfg(test)]
impl FieldErrors {
    pub fn from_pairs(pairs: &[(&str, &str)]) -> Self {
        let mut errors = FieldErrors::default();
        for (field, message) in pairs {
            errors.add(field, *message);
        }
        errors
    }
}
