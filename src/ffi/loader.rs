//! Dynamic Library Loader
//!
//! Safe wrapper around libloading for mapping shared libraries and
//! frameworks into the process.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use libloading::Library;
use tracing::debug;

use super::{BridgeError, BridgeResult};

/// A loaded native library.
///
/// Cloning shares the mapping; the library stays mapped while any clone is
/// alive. There is no explicit unload.
#[derive(Clone)]
pub struct LibraryHandle {
    /// Path the library was loaded from
    path: PathBuf,
    /// The loaded library handle
    library: Arc<Library>,
}

impl LibraryHandle {
    /// Load a library from the given path
    pub fn load(path: impl AsRef<Path>) -> BridgeResult<Self> {
        let path = path.as_ref().to_path_buf();

        // Safety: loading runs the library's initializers. The path comes
        // from configuration the user controls.
        let library = unsafe {
            Library::new(&path).map_err(|e| BridgeError::LoadFailure {
                reason: load_reason(&path, e.to_string()),
                path: path.clone(),
            })?
        };

        debug!(path = %path.display(), "loaded library");
        Ok(Self {
            path,
            library: Arc::new(library),
        })
    }

    /// Handle to the symbols of the running executable and everything it
    /// already links.
    pub fn current_process() -> BridgeResult<Self> {
        #[cfg(unix)]
        let library: Library = libloading::os::unix::Library::this().into();

        #[cfg(windows)]
        let library: Library = libloading::os::windows::Library::this()
            .map_err(|e| BridgeError::LoadFailure {
                path: PathBuf::from("<self>"),
                reason: e.to_string(),
            })?
            .into();

        Ok(Self {
            path: PathBuf::from("<self>"),
            library: Arc::new(library),
        })
    }

    /// Get the path to this library
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up an exported function and copy out its address as `T`.
    ///
    /// # Safety
    ///
    /// `T` must be a function pointer type matching the symbol's real
    /// prototype, and the returned value must not outlive this handle.
    pub unsafe fn function<T: Copy>(&self, name: &str) -> BridgeResult<T> {
        let symbol = self
            .library
            .get::<T>(name.as_bytes())
            .map_err(|e| BridgeError::LoadFailure {
                path: self.path.clone(),
                reason: format!("missing symbol '{}': {}", name, e),
            })?;
        Ok(*symbol)
    }
}

/// dlerror messages usually lead with the path, which `LoadFailure` already
/// prints.
pub(super) fn load_reason(path: &Path, message: String) -> String {
    let prefix = format!("{}: ", path.display());
    match message.strip_prefix(&prefix) {
        Some(rest) => rest.to_string(),
        None => message,
    }
}

impl std::fmt::Debug for LibraryHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LibraryHandle")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// Loads each library at most once per process.
#[derive(Default)]
pub struct LibraryLoader {
    /// Loaded libraries, keyed by the path they were requested with
    libraries: HashMap<PathBuf, LibraryHandle>,
}

impl LibraryLoader {
    /// Create a new library loader
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a library by path, reusing an earlier mapping of the same path
    pub fn load(&mut self, path: impl AsRef<Path>) -> BridgeResult<LibraryHandle> {
        let path = path.as_ref();
        if let Some(handle) = self.libraries.get(path) {
            return Ok(handle.clone());
        }

        let handle = LibraryHandle::load(path)?;
        self.libraries.insert(path.to_path_buf(), handle.clone());
        Ok(handle)
    }

    /// Get a loaded library
    pub fn get(&self, path: impl AsRef<Path>) -> Option<LibraryHandle> {
        self.libraries.get(path.as_ref()).cloned()
    }

    /// List loaded libraries
    pub fn loaded_libraries(&self) -> Vec<&Path> {
        self.libraries.keys().map(|p| p.as_path()).collect()
    }
}
