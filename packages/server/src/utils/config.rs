use once_cell::sync::Lazy;
use std::env;

pub static CONFIG: Lazy<ServerConfig> = Lazy::new(ServerConfig::new);

pub struct ServerConfig {
    pub bind_addr: String,
    pub cors_origin: String,
}

impl ServerConfig {
    fn new() -> Self {
        Self {
            bind_addr: env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
            cors_origin: env::var("CORS_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
        }
    }
}
