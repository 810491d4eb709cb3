use crate::utils::error::{ReceivablesError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "sankhya.toml";
pub const DEFAULT_BASE_URL: &str = "https://api.sandbox.sankhya.com.br";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub sankhya: SankhyaConfig,
    #[serde(default)]
    pub defaults: DefaultsConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SankhyaConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default)]
    pub credentials: CredentialsConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
}

impl Default for SankhyaConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_seconds: default_timeout_seconds(),
            credentials: CredentialsConfig::default(),
            endpoints: EndpointsConfig::default(),
        }
    }
}

/// 登入 `/login` 時放在 header 的四個值
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CredentialsConfig {
    pub token: Option<String>,
    pub appkey: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl std::fmt::Debug for CredentialsConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mask = |v: &Option<String>| v.as_ref().map(|_| "***");
        f.debug_struct("CredentialsConfig")
            .field("token", &mask(&self.token))
            .field("appkey", &mask(&self.appkey))
            .field("username", &self.username)
            .field("password", &mask(&self.password))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_login_endpoint")]
    pub login: String,
    #[serde(default = "default_receitas_endpoint")]
    pub receitas: String,
    #[serde(default = "default_parceiros_endpoint")]
    pub parceiros: String,
    /// `{codigoFinanceiro}` 會被替換成título 編號
    #[serde(default = "default_boleto_endpoint")]
    pub boleto: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            login: default_login_endpoint(),
            receitas: default_receitas_endpoint(),
            parceiros: default_parceiros_endpoint(),
            boleto: default_boleto_endpoint(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefaultsConfig {
    #[serde(default = "default_codigo_empresa")]
    pub codigo_empresa: String,
    #[serde(default = "default_page_size")]
    pub partner_page_size: u32,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            codigo_empresa: default_codigo_empresa(),
            partner_page_size: default_page_size(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_boleto_dir")]
    pub boleto_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            boleto_dir: default_boleto_dir(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_login_endpoint() -> String {
    "/login".to_string()
}

fn default_receitas_endpoint() -> String {
    "/v1/financeiros/receitas".to_string()
}

fn default_parceiros_endpoint() -> String {
    "/v1/parceiros".to_string()
}

fn default_boleto_endpoint() -> String {
    "/v1/financeiros/receitas/{codigoFinanceiro}/boleto".to_string()
}

fn default_codigo_empresa() -> String {
    "1".to_string()
}

fn default_page_size() -> u32 {
    50
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_boleto_dir() -> String {
    "./boletos".to_string()
}

impl AppConfig {
    /// 載入配置：指定檔案必須存在；未指定時嘗試 `sankhya.toml`，都沒有就用預設值，最後套用環境變數
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => {
                tracing::debug!("No {} found, using defaults", DEFAULT_CONFIG_FILE);
                Self::default()
            }
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(|e| ReceivablesError::ConfigError {
            message: format!("cannot read {}: {}", path.as_ref().display(), e),
        })?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ReceivablesError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${SANKHYA_TOKEN})，找不到的保留原字串
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ReceivablesError::ConfigError {
            message: format!("invalid placeholder pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 空值或沒被替換的 `${VAR}` 視為未設定，再由 SANKHYA_* 環境變數補上
    pub fn apply_env_overrides(&mut self) {
        let creds = &mut self.sankhya.credentials;
        for (slot, var) in [
            (&mut creds.token, "SANKHYA_TOKEN"),
            (&mut creds.appkey, "SANKHYA_APPKEY"),
            (&mut creds.username, "SANKHYA_USERNAME"),
            (&mut creds.password, "SANKHYA_PASSWORD"),
        ] {
            if slot.as_deref().is_some_and(is_unset) {
                *slot = None;
            }
            if slot.is_none() {
                *slot = std::env::var(var).ok().filter(|v| !v.is_empty());
            }
        }

        if let Ok(base_url) = std::env::var("SANKHYA_BASE_URL") {
            if !base_url.is_empty() {
                self.sankhya.base_url = base_url;
            }
        }
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("sankhya.base_url", &self.sankhya.base_url)?;
        validation::validate_positive_number(
            "sankhya.timeout_seconds",
            self.sankhya.timeout_seconds,
            1,
        )?;

        let endpoints = &self.sankhya.endpoints;
        validation::validate_endpoint_path("sankhya.endpoints.login", &endpoints.login)?;
        validation::validate_endpoint_path("sankhya.endpoints.receitas", &endpoints.receitas)?;
        validation::validate_endpoint_path("sankhya.endpoints.parceiros", &endpoints.parceiros)?;
        validation::validate_endpoint_path("sankhya.endpoints.boleto", &endpoints.boleto)?;
        if !endpoints.boleto.contains("{codigoFinanceiro}") {
            return Err(ReceivablesError::InvalidConfigValueError {
                field: "sankhya.endpoints.boleto".to_string(),
                value: endpoints.boleto.clone(),
                reason: "Template must contain {codigoFinanceiro}".to_string(),
            });
        }

        let creds = &self.sankhya.credentials;
        validation::validate_required_field("sankhya.credentials.token", &creds.token)?;
        validation::validate_required_field("sankhya.credentials.appkey", &creds.appkey)?;
        validation::validate_required_field("sankhya.credentials.username", &creds.username)?;
        validation::validate_required_field("sankhya.credentials.password", &creds.password)?;

        validation::validate_numeric_code("defaults.codigo_empresa", &self.defaults.codigo_empresa)?;
        validation::validate_positive_number(
            "defaults.partner_page_size",
            u64::from(self.defaults.partner_page_size),
            1,
        )?;
        validation::validate_non_empty_string("server.bind", &self.server.bind)?;
        validation::validate_path("output.boleto_dir", &self.output.boleto_dir)?;

        Ok(())
    }

    pub fn base_url(&self) -> &str {
        self.sankhya.base_url.trim_end_matches('/')
    }
}

fn is_unset(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || (value.starts_with("${") && value.ends_with('}'))
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
