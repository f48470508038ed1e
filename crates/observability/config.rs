use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum LogFormat {
    Pretty,
    Json,
}

#[derive(Debug, Clone)]
pub(crate) struct ServiceContext {
    pub(crate) service_name: String,
    pub(crate) environment: String,
    pub(crate) component: String,
}

#[derive(Debug, Clone)]
pub(crate) struct ObservabilityConfig {
    pub(crate) service_context: ServiceContext,
    pub(crate) log_format: LogFormat,
    /// Warnings captured during config parsing so they can be logged after tracing is initialized.
    pub(crate) warnings: Vec<String>,
}

impl ObservabilityConfig {
    pub(crate) fn from_env(component: &str) -> Self {
        Self::from_lookup(component, |key| env::var(key).ok())
    }

    fn from_lookup(component: &str, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let component = component.trim().to_string();
        let mut warnings = Vec::new();

        let service_name = lookup("SERVICE_NAME")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "pix-billing".to_string());

        let environment = lookup("STAGE")
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| "unknown".to_string());

        let log_format = match lookup("LOG_FORMAT") {
            Some(raw) if !raw.trim().is_empty() => match parse_log_format(&raw) {
                Some(format) => format,
                None => {
                    warnings.push(format!(
                        "LOG_FORMAT is invalid (value: {raw}); defaulting to pretty"
                    ));
                    LogFormat::Pretty
                }
            },
            _ => LogFormat::Pretty,
        };

        Self {
            service_context: ServiceContext {
                service_name,
                environment,
                component,
            },
            log_format,
            warnings,
        }
    }
}

fn parse_log_format(input: &str) -> Option<LogFormat> {
    match input.trim().to_ascii_lowercase().as_str() {
        "pretty" | "text" | "plain" => Some(LogFormat::Pretty),
        "json" => Some(LogFormat::Json),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ObservabilityConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ObservabilityConfig::from_lookup(" backend ", |key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_env_is_empty() {
        let config = config_from(&[]);
        assert_eq!(config.service_context.service_name, "pix-billing");
        assert_eq!(config.service_context.environment, "unknown");
        assert_eq!(config.service_context.component, "backend");
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert!(config.warnings.is_empty());
    }

    #[test]
    fn invalid_log_format_is_reported_not_fatal() {
        let config = config_from(&[("LOG_FORMAT", "xml"), ("STAGE", "production")]);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.service_context.environment, "production");
        assert_eq!(config.warnings.len(), 1);
    }

    #[test]
    fn json_log_format_is_recognized() {
        assert_eq!(config_from(&[("LOG_FORMAT", " JSON ")]).log_format, LogFormat::Json);
    }
}
