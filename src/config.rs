use std::env;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub env: String,
    pub node_name: String,
    pub host: String,
    pub http_port: u16,
    pub kubectl_bin: String,
    pub poll_interval: u64,
    pub query_timeout: u64,
    pub action_timeout: u64,
}

impl AppConfig {
    pub fn load() -> Self {
        Self {
            env: env::var("ENV").unwrap_or_else(|_| "production".into()),
            node_name: env::var("NODE_NAME").unwrap_or_else(|_|
                hostname::get().map(|h| h.to_string_lossy().into_owned()).unwrap_or("KUBEMON-NODE".into())
            ).to_uppercase(),
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            http_port: env::var("HTTP_PORT").unwrap_or("11090".to_string()).parse().unwrap_or(11090),
            kubectl_bin: env::var("KUBECTL_BIN").unwrap_or_else(|_| "kubectl".to_string()),
            poll_interval: env::var("POLL_INTERVAL").unwrap_or("300".to_string()).parse().unwrap_or(300),
            query_timeout: env::var("QUERY_TIMEOUT").unwrap_or("10".to_string()).parse().unwrap_or(10),
            action_timeout: env::var("ACTION_TIMEOUT").unwrap_or("30".to_string()).parse().unwrap_or(30),
        }
    }
}
