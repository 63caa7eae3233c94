use thiserror::Error;

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported environment: {0}")]
    EnvironmentUnsupported(String),

    #[error("{tool} does not support architecture '{arch}'")]
    UnsupportedArchitecture { tool: String, arch: String },

    #[error("devstrap must be run as a regular user; it asks for sudo when it needs to")]
    RunningAsRoot,

    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Unknown manual tool: {0}")]
    UnknownManualTool(String),

    #[error("Catalog error: {0}")]
    Catalog(String),

    #[error("Privilege escalation denied: {0}")]
    PrivilegeEscalationDenied(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Dialog error: {0}")]
    Dialog(#[from] dialoguer::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, BootstrapError>;
