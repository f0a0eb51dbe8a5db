use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("No entry named '{name}'")]
    NotFound { name: String },
    #[error("Entry '{name}' is not of the expected kind")]
    TypeMismatch { name: String },
    #[error("Invalid entry name '{name}'")]
    InvalidName { name: String },
    #[error("Invalid path '{path}'")]
    InvalidPath { path: String },
}

/// Capability handle to one directory of the data root. Backends are expected
/// to make clones cheap; a clone addresses the same directory.
#[allow(async_fn_in_trait)]
pub trait DirectoryHandle: Clone + Send + Sync {
    type File: FileHandle;

    /// Child directory by name. `Ok(None)` when it does not exist and `create`
    /// is false. A file of the same name is a `TypeMismatch` error.
    async fn directory(&self, name: &str, create: bool) -> Result<Option<Self>, StorageError>;

    /// Child file by name, same contract as `directory`. Creating yields an
    /// empty file.
    async fn file(&self, name: &str, create: bool) -> Result<Option<Self::File>, StorageError>;

    /// Names of all children, files and directories undistinguished, in
    /// whatever order the host enumerates them.
    async fn entries(&self) -> Result<Vec<String>, StorageError>;

    /// Removes a child file or empty directory. Missing children and non-empty
    /// directories are errors.
    async fn remove(&self, name: &str) -> Result<(), StorageError>;
}

#[allow(async_fn_in_trait)]
pub trait FileHandle: Send + Sync {
    async fn read_text(&self) -> Result<String, StorageError>;

    /// Replaces the full file content. The write is buffered and committed as
    /// one step; prior content stays intact if the write fails partway.
    async fn write(&self, bytes: &[u8]) -> Result<(), StorageError>;
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|part| !part.is_empty()).collect()
}

/// Resolves a `/`-delimited path down to its leaf file handle, walking (and
/// with `create` set, materializing) the intermediate directories. `Ok(None)`
/// when any segment is missing and `create` is false.
pub async fn resolve_file<D: DirectoryHandle>(
    root: &D,
    path: &str,
    create: bool,
) -> Result<Option<D::File>, StorageError> {
    let mut parts = segments(path);
    let file_name = parts.pop().ok_or_else(|| StorageError::InvalidPath {
        path: path.to_string(),
    })?;

    let mut dir = root.clone();
    for part in parts {
        match dir.directory(part, create).await? {
            Some(next) => dir = next,
            None => return Ok(None),
        }
    }
    dir.file(file_name, create).await
}

/// Same traversal restricted to directories. The empty path resolves to the
/// root itself.
pub async fn resolve_directory<D: DirectoryHandle>(
    root: &D,
    path: &str,
    create: bool,
) -> Result<Option<D>, StorageError> {
    let mut dir = root.clone();
    for part in segments(path) {
        match dir.directory(part, create).await? {
            Some(next) => dir = next,
            None => return Ok(None),
        }
    }
    Ok(Some(dir))
}

/// Child names of the directory at `path`, or `None` when the directory was
/// never created. Treat the result as a set; enumeration order is the host's.
pub async fn list_entries<D: DirectoryHandle>(
    root: &D,
    path: &str,
) -> Result<Option<Vec<String>>, StorageError> {
    match resolve_directory(root, path, false).await? {
        Some(dir) => Ok(Some(dir.entries().await?)),
        None => Ok(None),
    }
}

/// Reads and JSON-decodes the file at `path`. `None` when the file does not
/// exist; malformed JSON propagates as an error.
pub async fn read_entry<D: DirectoryHandle, T: DeserializeOwned>(
    root: &D,
    path: &str,
) -> Result<Option<T>, StorageError> {
    match resolve_file(root, path, false).await? {
        Some(file) => {
            let contents = file.read_text().await?;
            Ok(Some(serde_json::from_str(&contents)?))
        }
        None => Ok(None),
    }
}

/// Serializes `data` as 2-space-indented JSON and overwrites the file at
/// `path`, creating parent directories as needed.
pub async fn write_entry<D: DirectoryHandle, T: Serialize>(
    root: &D,
    path: &str,
    data: &T,
) -> Result<(), StorageError> {
    let file = resolve_file(root, path, true)
        .await?
        .ok_or_else(|| StorageError::InvalidPath {
            path: path.to_string(),
        })?;
    let contents = serde_json::to_string_pretty(data)?;
    file.write(contents.as_bytes()).await
}

/// Removes the leaf entry at `path`. A missing parent directory makes this a
/// no-op; removing a missing leaf or a non-empty directory is an error.
pub async fn delete_entry<D: DirectoryHandle>(root: &D, path: &str) -> Result<(), StorageError> {
    let mut parts = segments(path);
    let leaf = parts.pop().ok_or_else(|| StorageError::InvalidPath {
        path: path.to_string(),
    })?;

    let parent_path = parts.join("/");
    match resolve_directory(root, &parent_path, false).await? {
        Some(dir) => dir.remove(leaf).await,
        None => Ok(()),
    }
}

/// Creates the directory chain at `path`, for side effect only.
pub async fn create_directory<D: DirectoryHandle>(
    root: &D,
    path: &str,
) -> Result<(), StorageError> {
    resolve_directory(root, path, true).await?;
    Ok(())
}
