use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::{
    constants::{CPP_EXECUTABLE_FILE, CPP_SOURCE_FILE},
    core::{
        domain::{Artifact, Invocation, Language, ResourceLimits},
        errors::PrepareError,
        traits::{runner::LanguageRunner, supervisor::ProcessSupervisor},
        workspace::Workspace,
    },
    native::compile::{Strictness, run_compiler},
};

/// Compiles with g++ and runs the resulting binary directly.
#[derive(Clone, Debug)]
pub struct GnuCppRunner {
    gnucpp_path: PathBuf,
    supervisor: Arc<dyn ProcessSupervisor>,
    compile_time_limit: Duration,
    run_limits: ResourceLimits,
}

impl GnuCppRunner {
    pub fn new<P: Into<PathBuf>>(
        gnucpp_path: P,
        supervisor: Arc<dyn ProcessSupervisor>,
        compile_time_limit: Duration,
        run_limits: ResourceLimits,
    ) -> Self {
        GnuCppRunner {
            gnucpp_path: gnucpp_path.into(),
            supervisor,
            compile_time_limit,
            run_limits,
        }
    }
}

#[async_trait]
impl LanguageRunner for GnuCppRunner {
    fn language(&self) -> Language {
        Language::Cpp
    }

    #[tracing::instrument(skip(self, source, workspace), fields(workspace = %workspace.id()))]
    async fn prepare(&self, source: &str, workspace: &Workspace) -> Result<Artifact, PrepareError> {
        let source_path = workspace.write_source(CPP_SOURCE_FILE, source).await?;
        let executable = workspace.path(CPP_EXECUTABLE_FILE);

        let invocation = Invocation::new(&self.gnucpp_path, workspace.dir())
            .arg(source_path.to_string_lossy())
            .arg("-o")
            .arg(executable.to_string_lossy());
        run_compiler(
            self.supervisor.as_ref(),
            &invocation,
            self.compile_time_limit,
            Strictness::ExitCodeAndStderr,
        )
        .await?;

        Ok(Artifact { path: executable })
    }

    fn invocation(&self, artifact: &Artifact, workspace: &Workspace) -> Invocation {
        Invocation::new(&artifact.path, workspace.dir()).limits(self.run_limits)
    }
}
