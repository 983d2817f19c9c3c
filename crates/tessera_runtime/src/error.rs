use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("presentation loop is already running")]
    AlreadyRunning,
    #[error("failed to spawn simulation thread")]
    ThreadSpawn(#[source] std::io::Error),
    #[error("simulation thread panicked: {0}")]
    SimulationPanicked(String),
}
