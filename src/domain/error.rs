//! Domain error types.

/// Top-level error type for episampler.
#[derive(Debug, thiserror::Error)]
pub enum EpisamplerError {
    #[error("data unavailable: {reason}")]
    DataUnavailable { reason: String },

    #[error("insufficient data in {interval} interval: have {rows} rows, need at least {minimum}")]
    InsufficientData {
        interval: String,
        rows: usize,
        minimum: usize,
    },

    #[error("cannot sample {target_records} rows from interval [{start}, {end}) of {rows} rows")]
    InvalidInterval {
        start: usize,
        end: usize,
        target_records: usize,
        rows: usize,
    },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error(
        "quitting after {attempts} sampling attempts in [{start}, {end}) for {target_records} rows \
         ({weekday_rejections} weekday rejections, {gap_rejections} gap rejections); \
         check sampling params / dataset consistency"
    )]
    SamplingExhausted {
        attempts: usize,
        start: usize,
        end: usize,
        target_records: usize,
        weekday_rejections: usize,
        gap_rejections: usize,
    },

    #[error("sampling attempt on a node that is not ready; call reset() first")]
    NotReady,

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EpisamplerError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        EpisamplerError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn config_invalid(section: &str, key: &str, reason: impl Into<String>) -> Self {
        EpisamplerError::ConfigInvalid {
            section: section.to_string(),
            key: key.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&EpisamplerError> for std::process::ExitCode {
    fn from(err: &EpisamplerError) -> Self {
        let code: u8 = match err {
            EpisamplerError::Io(_) => 1,
            EpisamplerError::ConfigParse { .. }
            | EpisamplerError::ConfigMissing { .. }
            | EpisamplerError::ConfigInvalid { .. } => 2,
            EpisamplerError::DataUnavailable { .. } | EpisamplerError::InsufficientData { .. } => 3,
            EpisamplerError::InvalidInterval { .. }
            | EpisamplerError::InvalidParameter { .. }
            | EpisamplerError::NotReady => 4,
            EpisamplerError::SamplingExhausted { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
