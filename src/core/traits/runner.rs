use crate::core::{
    domain::{Artifact, Invocation, Language},
    errors::PrepareError,
    workspace::Workspace,
};

/// Per-language strategy: put the source on disk, build it if the language
/// needs that, and say how to start the result.
#[async_trait::async_trait]
pub trait LanguageRunner: std::fmt::Debug + Send + Sync {
    fn language(&self) -> Language;

    async fn prepare(&self, source: &str, workspace: &Workspace) -> Result<Artifact, PrepareError>;

    fn invocation(&self, artifact: &Artifact, workspace: &Workspace) -> Invocation;
}
