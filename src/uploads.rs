use std::path::Path;

/// An image submitted with a form, already checked to be a known format.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub extension: &'static str,
    pub bytes: Vec<u8>,
}

impl UploadedImage {
    /// Accepts the bytes if they start like a PNG, JPEG, GIF or WebP file.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let extension = sniff_image(&bytes)?;
        Some(Self { extension, bytes })
    }
}

fn sniff_image(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("jpg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("gif")
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("webp")
    } else {
        None
    }
}

/// Writes the image under `media_root/subdir/` with a fresh name and returns
/// the path relative to the media root, e.g. `posts/0190….png`.
pub async fn save_image(
    media_root: &Path,
    subdir: &str,
    image: &UploadedImage,
) -> std::io::Result<String> {
    let dir = media_root.join(subdir);
    tokio::fs::create_dir_all(&dir).await?;

    let name = format!("{}.{}", uuid::Uuid::now_v7(), image.extension);
    tokio::fs::write(dir.join(&name), &image.bytes).await?;

    let relative = format!("{}/{}", subdir, name);
    tracing::debug!("Stored upload {}", relative);
    Ok(relative)
}
