use std::path::PathBuf;

use async_trait::async_trait;

use crate::{
    constants::PYTHON_SOURCE_FILE,
    core::{
        domain::{Artifact, Invocation, Language, ResourceLimits},
        errors::PrepareError,
        traits::runner::LanguageRunner,
        workspace::Workspace,
    },
};

/// No build step: the interpreter gets the source file directly.
#[derive(Clone, Debug)]
pub struct PythonRunner {
    python_path: PathBuf,
    run_limits: ResourceLimits,
}

impl PythonRunner {
    pub fn new<P: Into<PathBuf>>(python_path: P, run_limits: ResourceLimits) -> Self {
        PythonRunner {
            python_path: python_path.into(),
            run_limits,
        }
    }
}

#[async_trait]
impl LanguageRunner for PythonRunner {
    fn language(&self) -> Language {
        Language::Python
    }

    async fn prepare(&self, source: &str, workspace: &Workspace) -> Result<Artifact, PrepareError> {
        let path = workspace.write_source(PYTHON_SOURCE_FILE, source).await?;
        Ok(Artifact { path })
    }

    fn invocation(&self, artifact: &Artifact, workspace: &Workspace) -> Invocation {
        Invocation::new(&self.python_path, workspace.dir())
            .arg(artifact.path.to_string_lossy())
            .limits(self.run_limits)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::test_utils::TempRoot;

    #[tokio::test]
    async fn test_prepare_writes_source_and_never_compiles() {
        let root = TempRoot::new();
        let workspace = Workspace::create(root.path()).await.unwrap();
        // Syntax errors surface at run time, not here.
        let runner = PythonRunner::new(
            "python3",
            ResourceLimits::for_run(Duration::from_secs(2), Some(1024)),
        );

        let artifact = runner.prepare("print(", &workspace).await.unwrap();
        let invocation = runner.invocation(&artifact, &workspace);

        assert_eq!(
            tokio::fs::read_to_string(&artifact.path).await.unwrap(),
            "print("
        );
        assert_eq!(invocation.program, PathBuf::from("python3"));
        assert_eq!(invocation.args, vec![artifact.path.to_string_lossy().into_owned()]);
        assert_eq!(invocation.work_dir, workspace.dir());
        assert_eq!(invocation.limits.address_space_bytes, Some(1024));
    }
}
