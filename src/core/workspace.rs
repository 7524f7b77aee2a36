use std::path::{Path, PathBuf};

use itertools::Itertools;
use tokio::fs;
use uuid::Uuid;

use crate::{
    constants::{ACTUAL_OUTPUT_FILE, EXPECTED_OUTPUT_FILE},
    core::{domain::TestCase, errors::EngineError},
};

/// On-disk files of exactly one execution. Two runs never share one.
#[derive(Debug)]
pub struct Workspace {
    id: Uuid,
    dir: PathBuf,
    remove_on_drop: bool,
}

impl Workspace {
    /// Creates a fresh `{root}/{uuid}` directory that is removed on drop.
    pub async fn create<P: AsRef<Path>>(root: P) -> Result<Self, EngineError> {
        let id = Uuid::new_v4();
        let root = std::path::absolute(root.as_ref()).map_err(EngineError::io(root.as_ref()))?;
        let dir = root.join(id.to_string());
        fs::create_dir_all(&dir).await.map_err(EngineError::io(&dir))?;

        tracing::debug!("Created workspace {}", dir.display());
        Ok(Workspace {
            id,
            dir,
            remove_on_drop: true,
        })
    }

    /// Adopts a directory chosen by the caller. It is left in place on drop.
    pub async fn at<P: AsRef<Path>>(dir: P) -> Result<Self, EngineError> {
        let dir = std::path::absolute(dir.as_ref()).map_err(EngineError::io(dir.as_ref()))?;
        fs::create_dir_all(&dir).await.map_err(EngineError::io(&dir))?;
        Ok(Workspace {
            id: Uuid::new_v4(),
            dir,
            remove_on_drop: false,
        })
    }

    pub fn keep(mut self) -> Self {
        self.remove_on_drop = false;
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    pub fn actual_output_path(&self) -> PathBuf {
        self.path(ACTUAL_OUTPUT_FILE)
    }

    pub fn expected_output_path(&self) -> PathBuf {
        self.path(EXPECTED_OUTPUT_FILE)
    }

    pub async fn write_source(&self, file_name: &str, source: &str) -> Result<PathBuf, EngineError> {
        let path = self.path(file_name);
        fs::write(&path, source).await.map_err(EngineError::io(&path))?;
        Ok(path)
    }

    /// Truncates the actual-output file so nothing from an earlier run survives.
    pub async fn reset_actual_output(&self) -> Result<(), EngineError> {
        let path = self.actual_output_path();
        fs::File::create(&path).await.map_err(EngineError::io(&path))?;
        Ok(())
    }

    /// One line per test case that carries an expected output.
    pub async fn write_expected_output(&self, test_cases: &[TestCase]) -> Result<(), EngineError> {
        let path = self.expected_output_path();
        let contents: String = test_cases
            .iter()
            .filter_map(|tc| tc.expected_output.as_deref())
            .map(|expected| format!("{expected}\n"))
            .join("");
        fs::write(&path, contents).await.map_err(EngineError::io(&path))?;
        Ok(())
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        if !self.remove_on_drop {
            return;
        }
        let dir = std::mem::take(&mut self.dir);
        let remove = move || {
            if let Err(e) = std::fs::remove_dir_all(&dir) {
                tracing::debug!("Failed to remove workspace {}: {}", dir.display(), e);
            }
        };
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(remove);
            }
            Err(_) => remove(),
        }
    }
}
