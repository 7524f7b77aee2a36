/// Native module contains implementations of core traits
/// without using any external dependencies like Docker or Runc,
/// using fork/exec, process groups and rlimits directly instead.
pub mod compile;
pub mod cpp;
pub mod java;
pub mod limits;
pub mod python;
pub mod supervisor;

use std::sync::Arc;

use crate::{
    config::EngineConfig,
    core::{domain::ResourceLimits, engine::Engine, traits::supervisor::ProcessSupervisor},
    native::{cpp::GnuCppRunner, java::JavaRunner, python::PythonRunner, supervisor::NativeSupervisor},
};

/// Wires the native supervisor and every language runner into an engine.
pub fn engine(config: EngineConfig) -> Engine {
    let supervisor: Arc<dyn ProcessSupervisor> = Arc::new(NativeSupervisor::new());
    let run_limits = ResourceLimits::for_run(config.time_limit, Some(config.memory_limit_bytes));

    let runners: Vec<Arc<dyn crate::core::traits::runner::LanguageRunner>> = vec![
        Arc::new(GnuCppRunner::new(
            &config.gnucpp_path,
            supervisor.clone(),
            config.compile_time_limit,
            run_limits,
        )),
        Arc::new(JavaRunner::new(
            &config.javac_path,
            &config.java_path,
            supervisor.clone(),
            config.compile_time_limit,
            run_limits,
        )),
        Arc::new(PythonRunner::new(&config.python_path, run_limits)),
    ];

    Engine::new(config, supervisor, runners)
}
