//! Gallery removal.

use tracing::{info, instrument};

use tadka_shared::Result;
use tadka_storage::Storage;

use crate::media::MediaStore;

/// Result of [`delete_gallery`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryDeletion {
    /// Whether a gallery record was deleted.
    pub deleted: bool,
    pub files_removed: usize,
    /// Files that could not be removed (already missing, permissions...).
    pub files_failed: usize,
}

/// Delete a gallery's media files, then its database record.
///
/// File removal is best-effort: failures are logged and never block the
/// record delete.
#[instrument(skip(storage, media))]
pub async fn delete_gallery(
    storage: &Storage,
    media: &MediaStore,
    id: &str,
) -> Result<GalleryDeletion> {
    let Some(gallery) = storage.get_gallery(id).await? else {
        return Ok(GalleryDeletion::default());
    };

    let mut outcome = GalleryDeletion::default();
    for image in &gallery.images {
        if media.delete(&image.file_name) {
            outcome.files_removed += 1;
        } else {
            outcome.files_failed += 1;
        }
    }

    outcome.deleted = storage.delete_gallery(id).await?;
    info!(
        entity = %gallery.entity_slug,
        files_removed = outcome.files_removed,
        files_failed = outcome.files_failed,
        "gallery deleted"
    );
    Ok(outcome)
}
