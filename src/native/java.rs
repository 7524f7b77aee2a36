use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    constants::{JAVA_MAIN_CLASS, JAVA_SOURCE_FILE},
    core::{
        domain::{Artifact, Invocation, Language, ResourceLimits},
        errors::PrepareError,
        traits::{runner::LanguageRunner, supervisor::ProcessSupervisor},
        workspace::Workspace,
    },
    native::compile::{Strictness, run_compiler},
};

/// Compiles with javac and runs the class on the JVM.
///
/// The JVM reserves far more address space than it uses, so the memory
/// ceiling is passed as `-Xmx` instead of `RLIMIT_AS`.
#[derive(Clone, Debug)]
pub struct JavaRunner {
    javac_path: PathBuf,
    java_path: PathBuf,
    supervisor: Arc<dyn ProcessSupervisor>,
    compile_time_limit: Duration,
    run_limits: ResourceLimits,
}

impl JavaRunner {
    pub fn new<P: Into<PathBuf>, Q: Into<PathBuf>>(
        javac_path: P,
        java_path: Q,
        supervisor: Arc<dyn ProcessSupervisor>,
        compile_time_limit: Duration,
        run_limits: ResourceLimits,
    ) -> Self {
        JavaRunner {
            javac_path: javac_path.into(),
            java_path: java_path.into(),
            supervisor,
            compile_time_limit,
            run_limits,
        }
    }
}

#[async_trait]
impl LanguageRunner for JavaRunner {
    fn language(&self) -> Language {
        Language::Java
    }

    #[tracing::instrument(skip(self, source, workspace), fields(workspace = %workspace.id()))]
    async fn prepare(&self, source: &str, workspace: &Workspace) -> Result<Artifact, PrepareError> {
        let source_path = workspace.write_source(JAVA_SOURCE_FILE, source).await?;

        let invocation = Invocation::new(&self.javac_path, workspace.dir())
            .arg("-d")
            .arg(workspace.dir().to_string_lossy())
            .arg(source_path.to_string_lossy());
        run_compiler(
            self.supervisor.as_ref(),
            &invocation,
            self.compile_time_limit,
            Strictness::ExitCode,
        )
        .await?;

        Ok(Artifact {
            path: workspace.path(&format!("{JAVA_MAIN_CLASS}.class")),
        })
    }

    fn invocation(&self, artifact: &Artifact, workspace: &Workspace) -> Invocation {
        let class_path = artifact
            .path
            .parent()
            .unwrap_or(workspace.dir())
            .to_string_lossy()
            .into_owned();
        let main_class = artifact
            .path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| JAVA_MAIN_CLASS.to_string());

        let mut invocation = Invocation::new(&self.java_path, workspace.dir()).limits(ResourceLimits {
            address_space_bytes: None,
            ..self.run_limits
        });
        if let Some(bytes) = self.run_limits.address_space_bytes {
            invocation = invocation.arg(format!("-Xmx{}m", (bytes / (1024 * 1024)).max(1)));
        }
        invocation.arg("-cp").arg(class_path).arg(main_class)
    }
}
