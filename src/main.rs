use std::panic;

use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::core::domain::{Job, RunResult};

mod config;
mod constants;
mod core;
mod native;

#[cfg(test)]
mod test_utils;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();
    set_panic_hook();

    let config = EngineConfig::from_env();
    tracing::debug!("Loaded config: {:?}", config);
    let engine = native::engine(config);

    let mut raw = String::new();
    tokio::io::stdin().read_to_string(&mut raw).await?;
    let job: Job = serde_json::from_str(&raw)?;
    tracing::info!(
        "Received {:?} submission with {} test cases",
        job.submission.language,
        job.test_cases.len()
    );

    let result: RunResult = engine.judge(&job.submission, &job.test_cases).await.into();
    println!("{}", serde_json::to_string(&result)?);

    if let Some(err) = &result.hard_error {
        tracing::error!("Engine failed: {}", err);
        std::process::exit(1);
    }
    Ok(())
}

fn set_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        tracing::error!(
            message = "panic occurred",
            panic = %panic_info
        );
    }));
}
