use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl LogFormat {
    /// Anything other than `json` keeps the human-readable output.
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("json") {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

pub fn init_tracing(format: LogFormat) -> Result<(), tracing::subscriber::SetGlobalDefaultError> {
    match format {
        LogFormat::Pretty => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .pretty()
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
        LogFormat::Json => {
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .json()
                .finish();
            tracing::subscriber::set_global_default(subscriber)
        }
    }
}
