//! 配置校验模块
//!
//! 校验规则：
//! - estimator.accuracy 为有限正数
//! - estimator.max_grid_len >= 2
//! - server.host 非空, server.port != 0
//! - server.read_buffer_size > 0, server.read_timeout_ms > 0
//! - metrics_port 不与 server.port 冲突

use contracts::{EstimatorConfig, ServerConfig, SyncError, SyncerConfig};

/// 校验 SyncerConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &SyncerConfig) -> Result<(), SyncError> {
    validate_estimator(&config.estimator)?;
    validate_server(&config.server)?;
    Ok(())
}

/// 校验估计器参数
pub fn validate_estimator(estimator: &EstimatorConfig) -> Result<(), SyncError> {
    if !estimator.accuracy.is_finite() || estimator.accuracy <= 0.0 {
        return Err(SyncError::config_validation(
            "estimator.accuracy",
            format!("accuracy must be > 0, got {}", estimator.accuracy),
        ));
    }

    // 样条插值至少需要两个节点
    if estimator.max_grid_len < 2 {
        return Err(SyncError::config_validation(
            "estimator.max_grid_len",
            format!("max_grid_len must be >= 2, got {}", estimator.max_grid_len),
        ));
    }
    Ok(())
}

/// 校验服务端参数
fn validate_server(server: &ServerConfig) -> Result<(), SyncError> {
    if server.host.trim().is_empty() {
        return Err(SyncError::config_validation(
            "server.host",
            "host cannot be empty",
        ));
    }

    if server.port == 0 {
        return Err(SyncError::config_validation(
            "server.port",
            "port must be non-zero",
        ));
    }

    if server.read_buffer_size == 0 {
        return Err(SyncError::config_validation(
            "server.read_buffer_size",
            "read_buffer_size must be > 0",
        ));
    }

    if server.read_timeout_ms == 0 {
        return Err(SyncError::config_validation(
            "server.read_timeout_ms",
            "read_timeout_ms must be > 0",
        ));
    }

    if server.metrics_port == Some(server.port) {
        return Err(SyncError::config_validation(
            "server.metrics_port",
            format!("metrics_port conflicts with server port {}", server.port),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&SyncerConfig::default()).is_ok());
    }

    #[test]
    fn test_rejects_non_positive_accuracy() {
        let mut config = SyncerConfig::default();
        config.estimator.accuracy = 0.0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("estimator.accuracy"), "got {err}");

        config.estimator.accuracy = f64::INFINITY;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_tiny_grid_limit() {
        let mut config = SyncerConfig::default();
        config.estimator.max_grid_len = 1;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("estimator.max_grid_len"), "got {err}");
    }

    #[test]
    fn test_rejects_zero_read_timeout() {
        let mut config = SyncerConfig::default();
        config.server.read_timeout_ms = 0;
        let err = validate(&config).unwrap_err();
        assert!(err.to_string().contains("server.read_timeout_ms"), "got {err}");
    }

    #[test]
    fn test_rejects_zero_buffer() {
        let mut config = SyncerConfig::default();
        config.server.read_buffer_size = 0;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_rejects_port_conflict() {
        let mut config = SyncerConfig::default();
        config.server.metrics_port = Some(config.server.port);
        let err = validate(&config).unwrap_err();
        assert!(matches!(err, SyncError::ConfigValidation { .. }));
    }

    #[test]
    fn test_rejects_empty_host() {
        let mut config = SyncerConfig::default();
        config.server.host = "  ".to_string();
        assert!(validate(&config).is_err());
    }
}
