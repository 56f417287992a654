// MIT License - Copyright (c) 2026 Peter Wright

/// Configuration for connecting to a Qolsys IQ panel.
///
/// The secure token and user PIN are issued by the panel's dealer menu when
/// third-party control is enabled; this crate never obtains them itself.
#[derive(Debug, Clone)]
pub struct PanelConfig {
    /// Panel IP address or hostname
    pub host: String,
    /// Panel control-service TCP port (default: 14999)
    pub port: u16,
    /// Pre-obtained secure access token, sent with every outbound frame
    pub secure_token: String,
    /// User PIN code, sent with arming commands
    pub user_pin_code: String,
    /// Socket inactivity timeout in milliseconds (default: 180000)
    pub socket_timeout_ms: u64,
    /// Keepalive timeout in milliseconds (default: 15000). A summary refresh
    /// is requested whenever this much time passes without a processed frame;
    /// the check itself runs at half this interval.
    pub keepalive_timeout_ms: u64,
    /// Upper bound on the partial-frame reassembly buffer in bytes
    /// (default: 262144). Exceeding it is treated as a connection failure.
    pub max_partial_bytes: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            host: "192.168.0.100".to_string(),
            port: 14999,
            secure_token: String::new(),
            user_pin_code: String::new(),
            socket_timeout_ms: 180_000,
            keepalive_timeout_ms: 15_000,
            max_partial_bytes: 256 * 1024,
        }
    }
}

impl PanelConfig {
    /// Create a new config builder starting from defaults.
    pub fn builder() -> PanelConfigBuilder {
        PanelConfigBuilder::default()
    }
}

/// Builder for PanelConfig.
#[derive(Debug, Clone, Default)]
pub struct PanelConfigBuilder {
    config: PanelConfig,
}

impl PanelConfigBuilder {
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    pub fn secure_token(mut self, token: impl Into<String>) -> Self {
        self.config.secure_token = token.into();
        self
    }

    pub fn user_pin_code(mut self, pin: impl Into<String>) -> Self {
        self.config.user_pin_code = pin.into();
        self
    }

    pub fn socket_timeout_ms(mut self, ms: u64) -> Self {
        self.config.socket_timeout_ms = ms;
        self
    }

    pub fn keepalive_timeout_ms(mut self, ms: u64) -> Self {
        self.config.keepalive_timeout_ms = ms;
        self
    }

    pub fn max_partial_bytes(mut self, bytes: usize) -> Self {
        self.config.max_partial_bytes = bytes;
        self
    }

    pub fn build(self) -> PanelConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PanelConfig::default();
        assert_eq!(config.port, 14999);
        assert_eq!(config.socket_timeout_ms, 180_000);
        assert_eq!(config.keepalive_timeout_ms, 15_000);
        assert_eq!(config.max_partial_bytes, 256 * 1024);
    }

    #[test]
    fn test_config_builder() {
        let config = PanelConfig::builder()
            .host("10.0.0.1")
            .port(12345)
            .secure_token("abcdef")
            .user_pin_code("1234")
            .keepalive_timeout_ms(30_000)
            .build();

        assert_eq!(config.host, "10.0.0.1");
        assert_eq!(config.port, 12345);
        assert_eq!(config.secure_token, "abcdef");
        assert_eq!(config.user_pin_code, "1234");
        assert_eq!(config.keepalive_timeout_ms, 30_000);
    }
}
