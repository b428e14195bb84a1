use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Engine(#[from] l3_engine::EngineError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("precision metadata missing expected filter: {0}")]
    MissingPrecisionFilter(&'static str),

    #[error("symbol switch failed: {0}")]
    SymbolSwitch(String),
}

pub type Result<T> = std::result::Result<T, ServerError>;
