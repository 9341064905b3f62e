use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Cookie carrying the opaque session token.
    pub session_cookie: String,
    pub max_body_bytes: usize,
    /// File-backed database path; `None` keeps everything in memory.
    pub db_path: Option<PathBuf>,
    pub ogp_width: u32,
    pub ogp_height: u32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            session_cookie: "shimekiri_session".to_string(),
            max_body_bytes: 16 * 1024,
            db_path: None,
            ogp_width: 1200,
            ogp_height: 630,
        }
    }
}

pub fn validate_startup_config(config: &AppConfig) -> Result<(), String> {
    if config.max_body_bytes == 0 {
        return Err("max_body_bytes must be > 0".to_string());
    }
    if config.session_cookie.is_empty() {
        return Err("session_cookie must not be empty".to_string());
    }
    if config
        .session_cookie
        .chars()
        .any(|c| c.is_whitespace() || c == ';' || c == '=')
    {
        return Err("session_cookie must be a plain cookie name".to_string());
    }
    if config.ogp_width == 0 || config.ogp_height == 0 {
        return Err("ogp dimensions must be > 0".to_string());
    }
    Ok(())
}
