//! Profile picture storage
//!
//! One image slot per user, stored as `profile.<ext>` in the user's
//! namespace. Setting a picture removes every earlier one, whatever its type.

use log::info;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::storage::catalog;
use crate::storage::filesystem;
use crate::storage::namespace::{UserId, ensure_namespace, namespace_dir};
use crate::storage::results::ProfilePictureLookup;

/// 2 MiB
pub const DEFAULT_MAX_PROFILE_PICTURE_BYTES: u64 = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct ProfilePictureStore {
    storage_root: PathBuf,
    max_bytes: u64,
}

impl ProfilePictureStore {
    pub fn new(storage_root: impl Into<PathBuf>, max_bytes: u64) -> Self {
        Self {
            storage_root: storage_root.into(),
            max_bytes,
        }
    }

    /// Validates and stores a new profile picture.
    ///
    /// Type is checked before size, and both before anything is written.
    pub fn set(
        &self,
        user_id: &UserId,
        declared_filename: &str,
        bytes: Option<&[u8]>,
    ) -> Result<(), StorageError> {
        let bytes = match bytes {
            Some(bytes) if !declared_filename.trim().is_empty() => bytes,
            _ => return Err(StorageError::MissingFile),
        };

        let extension = catalog::extension_of(declared_filename)
            .filter(|ext| catalog::lookup(ext).is_some_and(|traits| traits.is_image))
            .ok_or_else(|| StorageError::InvalidFileType(declared_filename.to_string()))?;

        let size = bytes.len() as u64;
        if size > self.max_bytes {
            return Err(StorageError::FileTooLarge {
                size,
                max: self.max_bytes,
            });
        }

        let dir = ensure_namespace(&self.storage_root, user_id)?;
        for candidate in catalog::image_extensions() {
            filesystem::remove_if_exists(&dir.join(catalog::profile_file_name(candidate)))?;
        }

        let path = dir.join(catalog::profile_file_name(&extension));
        filesystem::write_atomic(&path, bytes)?;

        info!(
            "Updated profile picture for user {} ({}, {} bytes)",
            user_id,
            path.display(),
            size
        );
        Ok(())
    }

    /// Returns the first profile picture found in probe order
    pub fn get(&self, user_id: &UserId) -> Result<ProfilePictureLookup, StorageError> {
        let dir = namespace_dir(&self.storage_root, user_id);

        for extension in catalog::image_extensions() {
            let path = dir.join(catalog::profile_file_name(extension));
            match read_existing(&path)? {
                Some(bytes) => {
                    let content_type = mime_guess::from_path(&path)
                        .first_or_octet_stream()
                        .to_string();
                    return Ok(ProfilePictureLookup::Found {
                        extension,
                        content_type,
                        bytes,
                    });
                }
                None => continue,
            }
        }

        Ok(ProfilePictureLookup::Absent)
    }
}

fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, StorageError> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(StorageError::Io(e)),
    }
}
