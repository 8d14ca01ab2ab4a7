//! Storage operations
//!
//! Upload, list, delete, download and inline editing of the files in one
//! user's namespace.

use log::{error, info, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::StorageError;
use crate::storage::catalog;
use crate::storage::codec;
use crate::storage::filesystem;
use crate::storage::namespace::{UserId, ensure_namespace, namespace_dir, resolve};
use crate::storage::results::{ContentView, Disposition, Download};

#[derive(Debug, Clone)]
pub struct FileStore {
    storage_root: PathBuf,
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Resolves a name and requires an existing regular file behind it
fn existing_file(storage_root: &Path, user_id: &UserId, filename: &str) -> Result<PathBuf, StorageError> {
    let path = resolve(storage_root, user_id, filename)?;
    if !filesystem::file_exists(&path) {
        return Err(StorageError::NotFound(file_name_of(&path)));
    }
    Ok(path)
}

impl FileStore {
    pub fn new(storage_root: impl Into<PathBuf>) -> Self {
        Self {
            storage_root: storage_root.into(),
        }
    }

    /// Stores `contents` under `filename`, silently replacing any file of
    /// the same name. Returns the stored (sanitized) name.
    ///
    /// Names of the profile picture slot are refused; that slot is only
    /// written through `ProfilePictureStore::set`.
    pub fn upload(
        &self,
        user_id: &UserId,
        filename: &str,
        contents: Option<&[u8]>,
    ) -> Result<String, StorageError> {
        let contents = match contents {
            Some(contents) if !filename.trim().is_empty() => contents,
            _ => return Err(StorageError::MissingFile),
        };

        let path = resolve(&self.storage_root, user_id, filename)?;
        let stored = file_name_of(&path);
        if catalog::is_reserved_profile_name(&stored) {
            warn!("User {} tried to upload reserved name {}", user_id, stored);
            return Err(StorageError::InvalidFilename(filename.to_string()));
        }

        ensure_namespace(&self.storage_root, user_id)?;
        filesystem::write_atomic(&path, contents)?;

        info!(
            "User {} uploaded {} ({} bytes)",
            user_id,
            path.display(),
            contents.len()
        );
        Ok(stored)
    }

    /// Fails with `NotFound` unless `filename` names an existing file
    pub fn ensure_exists(&self, user_id: &UserId, filename: &str) -> Result<(), StorageError> {
        existing_file(&self.storage_root, user_id, filename).map(|_| ())
    }

    /// Sorted names of the user's files, without the profile picture slot
    /// and hidden entries
    pub fn list(&self, user_id: &UserId) -> Result<Vec<String>, StorageError> {
        let dir = namespace_dir(&self.storage_root, user_id);

        let entries = match fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                error!("Failed to list {}: {}", dir.display(), e);
                return Err(StorageError::Io(e));
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') || catalog::is_reserved_profile_name(&name) {
                continue;
            }
            names.push(name);
        }
        names.sort();

        info!("Listed {} files for user {}", names.len(), user_id);
        Ok(names)
    }

    pub fn delete(&self, user_id: &UserId, filename: &str) -> Result<(), StorageError> {
        let path = existing_file(&self.storage_root, user_id, filename)?;
        let name = file_name_of(&path);

        fs::remove_file(&path).map_err(|e| StorageError::from_io(&name, e))?;

        info!("User {} deleted {}", user_id, path.display());
        Ok(())
    }

    /// Raw bytes of a file, flagged for saving rather than inline display
    pub fn download(&self, user_id: &UserId, filename: &str) -> Result<Download, StorageError> {
        let path = existing_file(&self.storage_root, user_id, filename)?;
        let name = file_name_of(&path);

        let bytes = fs::read(&path).map_err(|e| StorageError::from_io(&name, e))?;
        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .to_string();

        info!(
            "User {} downloaded {} ({} bytes)",
            user_id,
            path.display(),
            bytes.len()
        );
        Ok(Download {
            filename: name,
            content_type,
            disposition: Disposition::Attachment,
            bytes,
        })
    }

    pub fn read_content(&self, user_id: &UserId, filename: &str) -> Result<ContentView, StorageError> {
        let path = existing_file(&self.storage_root, user_id, filename)?;
        codec::read(&path)
    }

    pub fn write_content(
        &self,
        user_id: &UserId,
        filename: &str,
        content: &str,
    ) -> Result<(), StorageError> {
        let path = existing_file(&self.storage_root, user_id, filename)?;
        codec::write(&path, content)?;

        info!(
            "User {} edited {} ({} bytes)",
            user_id,
            path.display(),
            content.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::docx::tests::write_docx;
    use crate::storage::profile::ProfilePictureStore;
    use crate::storage::results::ProfilePictureLookup;

    fn setup() -> (tempfile::TempDir, FileStore, UserId) {
        let temp = tempfile::tempdir().unwrap();
        let store = FileStore::new(temp.path());
        (temp, store, UserId::parse("1").unwrap())
    }

    #[test]
    fn test_upload_then_list_shows_file_once() {
        let (_temp, store, user) = setup();

        store.upload(&user, "report.txt", Some(&b"v1"[..])).unwrap();
        store.upload(&user, "report.txt", Some(&b"v2"[..])).unwrap();

        assert_eq!(store.list(&user).unwrap(), vec!["report.txt"]);
        assert_eq!(store.download(&user, "report.txt").unwrap().bytes, b"v2");
    }

    #[test]
    fn test_upload_returns_sanitized_name() {
        let (_temp, store, user) = setup();

        let stored = store.upload(&user, "my notes.txt", Some(&b""[..])).unwrap();

        assert_eq!(stored, "my_notes.txt");
        assert_eq!(store.list(&user).unwrap(), vec!["my_notes.txt"]);
    }

    #[test]
    fn test_upload_requires_name_and_contents() {
        let (_temp, store, user) = setup();

        assert!(matches!(
            store.upload(&user, "", Some(&b"x"[..])),
            Err(StorageError::MissingFile)
        ));
        assert!(matches!(
            store.upload(&user, "a.txt", None),
            Err(StorageError::MissingFile)
        ));
    }

    #[test]
    fn test_upload_rejects_traversal_without_writing() {
        let (temp, store, user) = setup();

        assert!(matches!(
            store.upload(&user, "../escape.txt", Some(&b"x"[..])),
            Err(StorageError::InvalidFilename(_))
        ));
        assert!(!temp.path().join("escape.txt").exists());
        assert!(!temp.path().join("1").exists());
    }

    #[test]
    fn test_list_of_missing_namespace_is_empty() {
        let (_temp, store, user) = setup();
        assert!(store.list(&user).unwrap().is_empty());
    }

    #[test]
    fn test_list_hides_profile_pictures_and_hidden_entries() {
        let (temp, store, user) = setup();
        store.upload(&user, "b.txt", Some(&b"b"[..])).unwrap();
        store.upload(&user, "profile.txt", Some(&b"p"[..])).unwrap();
        fs::write(temp.path().join("1").join("profile.png"), b"img").unwrap();
        fs::write(temp.path().join("1").join(".tmpABC"), b"partial").unwrap();
        fs::create_dir(temp.path().join("1").join("nested")).unwrap();

        assert_eq!(store.list(&user).unwrap(), vec!["b.txt", "profile.txt"]);
    }

    #[test]
    fn test_upload_cannot_fill_profile_picture_slot() {
        let (temp, store, user) = setup();
        let pictures = ProfilePictureStore::new(temp.path(), 1024);
        pictures.set(&user, "me.jpg", Some(&b"jpg-bytes"[..])).unwrap();

        for name in ["profile.png", "profile.jpeg", " profile.png"] {
            assert!(matches!(
                store.upload(&user, name, Some(&b"not an image"[..])),
                Err(StorageError::InvalidFilename(_))
            ));
        }

        let mut files: Vec<_> = fs::read_dir(temp.path().join("1"))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect();
        files.sort();
        assert_eq!(files, vec!["profile.jpg"]);
        assert!(matches!(
            pictures.get(&user).unwrap(),
            ProfilePictureLookup::Found { extension: "jpg", .. }
        ));
    }

    #[test]
    fn test_namespaces_are_isolated() {
        let (_temp, store, alice) = setup();
        let bob = UserId::parse("2").unwrap();

        store.upload(&alice, "secret.txt", Some(&b"mine"[..])).unwrap();

        assert!(store.list(&bob).unwrap().is_empty());
        assert!(matches!(
            store.download(&bob, "secret.txt"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_download_is_byte_identical_attachment() {
        let (_temp, store, user) = setup();
        let payload: Vec<u8> = (0..=255).collect();
        store.upload(&user, "blob.bin", Some(payload.as_slice())).unwrap();

        let download = store.download(&user, "blob.bin").unwrap();

        assert_eq!(download.bytes, payload);
        assert_eq!(download.filename, "blob.bin");
        assert_eq!(download.disposition, Disposition::Attachment);
        assert_eq!(download.content_type, "application/octet-stream");
    }

    #[test]
    fn test_delete_twice_is_not_found() {
        let (_temp, store, user) = setup();
        store.upload(&user, "a.txt", Some(&b"x"[..])).unwrap();

        store.delete(&user, "a.txt").unwrap();

        assert!(matches!(store.delete(&user, "a.txt"), Err(StorageError::NotFound(_))));
        assert!(matches!(store.download(&user, "a.txt"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_write_then_read_content() {
        let (_temp, store, user) = setup();
        store.upload(&user, "a.txt", Some(&b""[..])).unwrap();

        store.write_content(&user, "a.txt", "hello").unwrap();

        assert_eq!(store.read_content(&user, "a.txt").unwrap(), ContentView::text("hello"));
    }

    #[test]
    fn test_content_of_missing_file_is_not_found() {
        let (_temp, store, user) = setup();

        assert!(matches!(
            store.read_content(&user, "ghost.txt"),
            Err(StorageError::NotFound(_))
        ));
        assert!(matches!(
            store.write_content(&user, "ghost.txt", "x"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_structured_document_is_readable_but_not_editable() {
        let (temp, store, user) = setup();
        fs::create_dir_all(temp.path().join("1")).unwrap();
        write_docx(&temp.path().join("1").join("letter.docx"), &["A", "B", "C"]);

        assert_eq!(
            store.read_content(&user, "letter.docx").unwrap(),
            ContentView::text("A\nB\nC")
        );
        assert!(matches!(
            store.write_content(&user, "letter.docx", "x"),
            Err(StorageError::UnsupportedType(_))
        ));
    }
}
