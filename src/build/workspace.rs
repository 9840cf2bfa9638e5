use std::path::{Path, PathBuf};

use super::command::BUILD_DIR_NAME;
use super::marker::BuildMarker;
use crate::platform::PlatformInfo;

/// The project's root build script, required before any build
pub const BUILD_SCRIPT_NAME: &str = "CMakeLists.txt";

/// An open project folder and the paths derived from it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
    name: String,
}

impl Workspace {
    /// Open `root` as a workspace. Returns `None` if it is not a directory.
    pub fn open(root: &Path) -> Option<Self> {
        if !root.is_dir() {
            return None;
        }
        let root = dunce::canonicalize(root).unwrap_or_else(|_| root.to_path_buf());
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "app".to_string());
        Some(Self { root, name })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Folder name, which is also the executable's stem
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join(BUILD_DIR_NAME)
    }

    pub fn build_script(&self) -> PathBuf {
        self.root.join(BUILD_SCRIPT_NAME)
    }

    pub fn marker(&self) -> BuildMarker {
        BuildMarker::in_dir(&self.build_dir())
    }

    /// `<root>/build/<name>[.exe]`
    pub fn executable(&self, platform: &PlatformInfo) -> PathBuf {
        self.build_dir().join(platform.executable_name(&self.name))
    }
}
