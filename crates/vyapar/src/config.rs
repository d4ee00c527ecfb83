use serde::Deserialize;

use crate::error::Error;

/// Top-level configuration loaded from `vyapar.toml`.
///
/// Secrets are never stored in the file: integration sections name the
/// environment variable that holds each credential, and the value is
/// resolved at client-construction time.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlatformConfig {
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub output: OutputConfig,
    pub payment: Option<PaymentConfig>,
    pub whatsapp: Option<WhatsAppConfig>,
}

/// Orchestrator-level limits with sensible defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_rate_limit")]
    pub rate_limit_per_minute: u32,
    /// Consecutive agent failures that open the circuit.
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    /// Seconds an open circuit waits before allowing a half-open probe.
    #[serde(default = "default_recovery_timeout")]
    pub recovery_timeout_seconds: u64,
    /// Half-open successes required to close the circuit again.
    #[serde(default = "default_success_threshold")]
    pub success_threshold: u32,
}

fn default_max_concurrent_requests() -> usize {
    10
}

fn default_request_timeout() -> u64 {
    30
}

fn default_rate_limit() -> u32 {
    60
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout() -> u64 {
    300
}

fn default_success_threshold() -> u32 {
    2
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_concurrent_requests: default_max_concurrent_requests(),
            request_timeout_seconds: default_request_timeout(),
            rate_limit_per_minute: default_rate_limit(),
            failure_threshold: default_failure_threshold(),
            recovery_timeout_seconds: default_recovery_timeout(),
            success_threshold: default_success_threshold(),
        }
    }
}

/// Task queue settings for daemon mode.
#[derive(Debug, Clone, Deserialize)]
pub struct DaemonConfig {
    #[serde(default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: usize,
}

fn default_max_concurrent_tasks() -> usize {
    4
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent_tasks(),
        }
    }
}

/// Where generated deliverables (JSON/CSV/Markdown) are written.
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_output_dir")]
    pub directory: String,
}

fn default_output_dir() -> String {
    "output".into()
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_dir(),
        }
    }
}

/// UPI payment gateway settings. Credentials come from the named env vars.
#[derive(Debug, Clone, Deserialize)]
pub struct PaymentConfig {
    #[serde(default = "default_payment_provider")]
    pub provider: String,
    #[serde(default = "default_key_id_env")]
    pub key_id_env: String,
    #[serde(default = "default_key_secret_env")]
    pub key_secret_env: String,
    #[serde(default = "default_webhook_secret_env")]
    pub webhook_secret_env: String,
    /// Merchant VPA for UPI intent links (e.g. "sharma@upi").
    pub merchant_vpa: Option<String>,
    /// API base override, used by tests to point at a local server.
    pub api_base: Option<String>,
}

fn default_payment_provider() -> String {
    "razorpay".into()
}

fn default_key_id_env() -> String {
    "RAZORPAY_KEY_ID".into()
}

fn default_key_secret_env() -> String {
    "RAZORPAY_KEY_SECRET".into()
}

fn default_webhook_secret_env() -> String {
    "RAZORPAY_WEBHOOK_SECRET".into()
}

/// WhatsApp Business (Graph API) settings.
#[derive(Debug, Clone, Deserialize)]
pub struct WhatsAppConfig {
    pub phone_number_id: String,
    #[serde(default = "default_wa_token_env")]
    pub access_token_env: String,
    #[serde(default = "default_wa_verify_env")]
    pub verify_token_env: String,
    /// API base override, used by tests to point at a local server.
    pub api_base: Option<String>,
}

fn default_wa_token_env() -> String {
    "WHATSAPP_ACCESS_TOKEN".into()
}

fn default_wa_verify_env() -> String {
    "WHATSAPP_VERIFY_TOKEN".into()
}

/// Resolve a credential named by an env var in the config.
pub fn resolve_env(var: &str) -> Result<String, Error> {
    std::env::var(var).map_err(|_| Error::Config(format!("environment variable {var} is not set")))
}

impl PlatformConfig {
    /// Parse a TOML string into a `PlatformConfig`.
    pub fn from_toml(content: &str) -> Result<Self, Error> {
        let config: Self = toml::from_str(content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn from_file(path: &std::path::Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.orchestrator.max_concurrent_requests == 0 {
            return Err(Error::Config(
                "orchestrator.max_concurrent_requests must be at least 1".into(),
            ));
        }
        if self.orchestrator.request_timeout_seconds == 0 {
            return Err(Error::Config(
                "orchestrator.request_timeout_seconds must be at least 1".into(),
            ));
        }
        if self.orchestrator.rate_limit_per_minute == 0 {
            return Err(Error::Config(
                "orchestrator.rate_limit_per_minute must be at least 1".into(),
            ));
        }
        if self.orchestrator.failure_threshold == 0 {
            return Err(Error::Config(
                "orchestrator.failure_threshold must be at least 1".into(),
            ));
        }
        if self.orchestrator.success_threshold == 0 {
            return Err(Error::Config(
                "orchestrator.success_threshold must be at least 1".into(),
            ));
        }
        if self.daemon.max_concurrent_tasks == 0 {
            return Err(Error::Config(
                "daemon.max_concurrent_tasks must be at least 1".into(),
            ));
        }
        if self.output.directory.is_empty() {
            return Err(Error::Config("output.directory must not be empty".into()));
        }
        if let Some(ref payment) = self.payment {
            let valid = ["razorpay", "cashfree"];
            if !valid.contains(&payment.provider.as_str()) {
                return Err(Error::Config(format!(
                    "payment.provider '{}' is invalid; must be one of: {}",
                    payment.provider,
                    valid.join(", ")
                )));
            }
        }
        if let Some(ref wa) = self.whatsapp {
            if wa.phone_number_id.is_empty() {
                return Err(Error::Config(
                    "whatsapp.phone_number_id must not be empty".into(),
                ));
            }
        }
        Ok(())
    }
}
