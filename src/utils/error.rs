use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReceivablesError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Authentication failed with status {status}")]
    AuthenticationFailed { status: u16 },

    #[error("Login response did not contain a token")]
    TokenMissing,

    #[error("Session expired")]
    SessionExpired,

    #[error("Upstream {endpoint} answered with status {status}")]
    UpstreamStatus { endpoint: String, status: u16 },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration field: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Título {nro} not found")]
    TituloNotFound { nro: String },

    #[error("Título {nro} is not a boleto")]
    NotABoleto { nro: String },

    #[error("Título {nro} is already settled")]
    AlreadySettled { nro: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Authentication,
    Configuration,
    Data,
    Business,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ReceivablesError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::ApiError(_) | Self::UpstreamStatus { .. } => ErrorCategory::Network,
            Self::AuthenticationFailed { .. } | Self::TokenMissing | Self::SessionExpired => {
                ErrorCategory::Authentication
            }
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            Self::CsvError(_) | Self::SerializationError(_) | Self::ValidationError { .. } => {
                ErrorCategory::Data
            }
            Self::TituloNotFound { .. } | Self::NotABoleto { .. } | Self::AlreadySettled { .. } => {
                ErrorCategory::Business
            }
            Self::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Business => ErrorSeverity::Low,
            ErrorCategory::Network | ErrorCategory::Authentication => ErrorSeverity::Medium,
            ErrorCategory::Configuration | ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 給終端使用者看的訊息（葡萄牙文）
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::ApiError(_) => "Falha de comunicação com o Sankhya".to_string(),
            Self::UpstreamStatus { endpoint, status } => {
                format!("Erro ao buscar {}: {}", endpoint, status)
            }
            Self::AuthenticationFailed { .. } => "Erro ao autenticar no Sankhya".to_string(),
            Self::TokenMissing => "Token não encontrado na resposta".to_string(),
            Self::SessionExpired => "Sessão expirada".to_string(),
            Self::ConfigError { message } => format!("Configuração inválida: {}", message),
            Self::MissingConfigError { field } => {
                format!("Configuração obrigatória ausente: {}", field)
            }
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Valor inválido em {}: {}", field, reason)
            }
            Self::ValidationError { message } => message.clone(),
            Self::TituloNotFound { nro } => format!("Título {} não encontrado", nro),
            Self::NotABoleto { .. } => "Este título não é um boleto".to_string(),
            Self::AlreadySettled { .. } => "Este título já foi baixado".to_string(),
            Self::CsvError(_) | Self::SerializationError(_) => {
                "Resposta com formato inesperado".to_string()
            }
            Self::IoError(e) => format!("Erro de arquivo: {}", e),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::ApiError(_) | Self::UpstreamStatus { .. } => {
                "Check network connectivity and the Sankhya base URL, then retry"
            }
            Self::AuthenticationFailed { .. } | Self::TokenMissing => {
                "Verify SANKHYA_TOKEN, SANKHYA_APPKEY, SANKHYA_USERNAME and SANKHYA_PASSWORD"
            }
            Self::SessionExpired => "Run the command again to obtain a fresh token",
            Self::ConfigError { .. }
            | Self::MissingConfigError { .. }
            | Self::InvalidConfigValueError { .. } => "Fix the configuration file and retry",
            Self::ValidationError { .. } => "Check the command arguments",
            Self::TituloNotFound { .. } => "Check the título number and the selected partner/page",
            Self::NotABoleto { .. } | Self::AlreadySettled { .. } => {
                "Only open boleto títulos can be downloaded"
            }
            Self::CsvError(_) | Self::SerializationError(_) => {
                "The upstream payload changed shape; run with --verbose for details"
            }
            Self::IoError(_) => "Check file permissions and free disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, ReceivablesError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_errors_are_retryable() {
        let err = ReceivablesError::SessionExpired;
        assert_eq!(err.category(), ErrorCategory::Authentication);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
        assert_eq!(err.user_friendly_message(), "Sessão expirada");
    }

    #[test]
    fn test_business_errors_are_low_severity() {
        let err = ReceivablesError::AlreadySettled {
            nro: "42".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Low);
        assert_eq!(err.user_friendly_message(), "Este título já foi baixado");
    }

    #[test]
    fn test_config_errors_are_high_severity() {
        let err = ReceivablesError::MissingConfigError {
            field: "sankhya.credentials.appkey".to_string(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert_eq!(err.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_upstream_message_names_the_endpoint() {
        let err = ReceivablesError::UpstreamStatus {
            endpoint: "boleto".to_string(),
            status: 404,
        };
        assert_eq!(err.user_friendly_message(), "Erro ao buscar boleto: 404");
        assert_eq!(err.category(), ErrorCategory::Network);
    }
}
