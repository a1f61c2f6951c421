//! Local media store and gallery image numbering.
//!
//! Images for an entity are named `<entity-slug>-<n>.<ext>`. New numbers
//! continue after the highest number already used, so a new upload never
//! overwrites an existing file even when earlier numbers were deleted.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use url::Url;

use tadka_shared::{Result, TadkaError};

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "avif"];

/// Taken numbers [`MediaStore::save_numbered`] steps over before giving up.
const MAX_TAKEN_NUMBERS: u32 = 100;

/// Next image number after every number in `existing` (1 when empty).
pub fn next_image_number(existing: impl IntoIterator<Item = u32>) -> Result<u32> {
    match existing.into_iter().max() {
        None => Ok(1),
        Some(max) => max
            .checked_add(1)
            .ok_or_else(|| TadkaError::Media(format!("image numbers exhausted at {max}"))),
    }
}

/// Number encoded in a file name of the form `<entity_slug>-<n>.<ext>`.
pub fn image_number_from_name(file_name: &str, entity_slug: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(entity_slug)?.strip_prefix('-')?;
    let (number, ext) = rest.rsplit_once('.')?;
    if ext.is_empty() || !number.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    number.parse().ok()
}

pub fn image_file_name(entity_slug: &str, number: u32, ext: &str) -> String {
    format!("{entity_slug}-{number}.{ext}")
}

/// File extension for a downloaded image, from the URL path or else the
/// response content type. Defaults to `jpg`.
pub fn extension_from_url(url: &Url, content_type: Option<&str>) -> String {
    let from_path = url
        .path_segments()
        .and_then(|mut s| s.next_back())
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| IMAGE_EXTENSIONS.contains(&ext.as_str()));
    if let Some(ext) = from_path {
        return if ext == "jpeg" { "jpg".into() } else { ext };
    }

    let from_type = content_type.and_then(|ct| {
        let mime = ct.split(';').next()?.trim().to_ascii_lowercase();
        match mime.as_str() {
            "image/jpeg" | "image/jpg" => Some("jpg"),
            "image/png" => Some("png"),
            "image/webp" => Some("webp"),
            "image/avif" => Some("avif"),
            _ => None,
        }
    });
    from_type.unwrap_or("jpg").to_string()
}

// ---------------------------------------------------------------------------
// MediaStore
// ---------------------------------------------------------------------------

/// Flat directory of media files.
#[derive(Debug, Clone)]
pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    /// Open a store rooted at `root`, creating the directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(&root).map_err(|e| TadkaError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// Write a new file. Fails if the name is already taken.
    pub fn save(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        let path = self.checked_path(file_name)?;
        match write_new(&path, bytes) {
            Ok(()) => {
                debug!(file = file_name, bytes = bytes.len(), "media saved");
                Ok(path)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                Err(TadkaError::Media(format!("{file_name} already exists")))
            }
            Err(e) => Err(TadkaError::io(&path, e)),
        }
    }

    /// Write `<entity_slug>-<n>.<ext>` under the first free number from
    /// `from` on. Returns the number and file name used.
    pub fn save_numbered(
        &self,
        entity_slug: &str,
        from: u32,
        ext: &str,
        bytes: &[u8],
    ) -> Result<(u32, String)> {
        let mut number = from;
        for _ in 0..MAX_TAKEN_NUMBERS {
            let file_name = image_file_name(entity_slug, number, ext);
            let path = self.checked_path(&file_name)?;
            match write_new(&path, bytes) {
                Ok(()) => {
                    debug!(file = %file_name, bytes = bytes.len(), "media saved");
                    return Ok((number, file_name));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!(file = %file_name, "image number taken");
                    number = next_image_number([number])?;
                }
                Err(e) => return Err(TadkaError::io(&path, e)),
            }
        }
        Err(TadkaError::Media(format!(
            "no free image number for {entity_slug} from {from}"
        )))
    }

    fn checked_path(&self, file_name: &str) -> Result<PathBuf> {
        if file_name.is_empty() || file_name.contains(['/', '\\']) || file_name.starts_with('.') {
            return Err(TadkaError::Media(format!("invalid media file name '{file_name}'")));
        }
        Ok(self.path_for(file_name))
    }

    /// Remove a file. Failures are logged and reported as `false`.
    pub fn delete(&self, file_name: &str) -> bool {
        let path = self.path_for(file_name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(file = file_name, "media deleted");
                true
            }
            Err(e) => {
                warn!(file = file_name, error = %e, "failed to delete media file");
                false
            }
        }
    }

    /// Image numbers present on disk for an entity.
    pub fn list_numbers(&self, entity_slug: &str) -> Result<Vec<u32>> {
        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(TadkaError::io(&self.root, e)),
        };

        let mut numbers: Vec<u32> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let name = entry.file_name();
                image_number_from_name(name.to_str()?, entity_slug)
            })
            .collect();
        numbers.sort_unstable();
        Ok(numbers)
    }
}

fn write_new(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(bytes)
}
