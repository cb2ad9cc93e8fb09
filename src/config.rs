// config.rs
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MailProvider {
    Resend,
    Smtp,
    Log,
}

impl MailProvider {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "resend" => MailProvider::Resend,
            "smtp" => MailProvider::Smtp,
            _ => MailProvider::Log,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub app_url: String,
    pub frontend_url: String,
    pub allowed_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_maxage: i64,
    pub port: u16,
    pub run_migrations: bool,
    // Mail
    pub mail_provider: MailProvider,
    pub resend_api_key: String,
    pub from_email: String,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    // Storage
    pub storage_root: String,
    pub storage_signing_key: String,
    pub max_upload_bytes: usize,
    // Marketplace
    pub platform_fee_percent: i64,
    pub pending_booking_ttl_hours: i64,
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<T>().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn init() -> Config {
        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");
        let jwt_secret = std::env::var("JWT_SECRET_KEY").expect("JWT_SECRET_KEY must be set");
        let jwt_maxage = std::env::var("JWT_MAXAGE").expect("JWT_MAXAGE must be set");
        let storage_signing_key = std::env::var("STORAGE_SIGNING_KEY")
            .expect("STORAGE_SIGNING_KEY must be set");

        let app_url = env_or("APP_URL", "http://localhost:8000");
        let frontend_url = env_or("FRONTEND_URL", "http://localhost:3000");

        let allowed_origins = std::env::var("ALLOWED_ORIGINS")
            .unwrap_or_else(|_| frontend_url.clone())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let redis_url = std::env::var("REDIS_URL").ok().filter(|url| !url.is_empty());

        Config {
            database_url,
            redis_url,
            app_url,
            frontend_url,
            allowed_origins,
            jwt_secret,
            jwt_maxage: jwt_maxage.parse::<i64>().unwrap_or(60),
            port: env_parse_or("PORT", 8000),
            run_migrations: env_parse_or("RUN_MIGRATIONS", true),
            mail_provider: MailProvider::parse(&env_or("MAIL_PROVIDER", "log")),
            resend_api_key: env_or("RESEND_API_KEY", ""),
            from_email: env_or("FROM_EMAIL", "ManzelHelp <noreply@manzelhelp.com>"),
            smtp_host: env_or("SMTP_HOST", "localhost"),
            smtp_port: env_parse_or("SMTP_PORT", 587),
            smtp_username: env_or("SMTP_USERNAME", ""),
            smtp_password: env_or("SMTP_PASSWORD", ""),
            storage_root: env_or("STORAGE_ROOT", "./storage"),
            storage_signing_key,
            max_upload_bytes: env_parse_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
            platform_fee_percent: env_parse_or("PLATFORM_FEE_PERCENT", 10),
            pending_booking_ttl_hours: env_parse_or("PENDING_BOOKING_TTL_HOURS", 48),
        }
    }

    /// Configuration used by unit tests; nothing here talks to a real service.
    #[cfg(test)]
    pub fn for_tests() -> Config {
        Config {
            database_url: "postgres://localhost/manzelhelp_test".to_string(),
            redis_url: None,
            app_url: "http://localhost:8000".to_string(),
            frontend_url: "http://localhost:3000".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
            jwt_secret: "test-secret".to_string(),
            jwt_maxage: 60,
            port: 0,
            run_migrations: false,
            mail_provider: MailProvider::Log,
            resend_api_key: String::new(),
            from_email: "ManzelHelp <noreply@manzelhelp.test>".to_string(),
            smtp_host: "localhost".to_string(),
            smtp_port: 587,
            smtp_username: String::new(),
            smtp_password: String::new(),
            storage_root: std::env::temp_dir()
                .join("manzelhelp-tests")
                .to_string_lossy()
                .to_string(),
            storage_signing_key: "storage-test-key".to_string(),
            max_upload_bytes: 1024,
            platform_fee_percent: 10,
            pending_booking_ttl_hours: 48,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mail_provider_falls_back_to_log() {
        assert_eq!(MailProvider::parse("Resend"), MailProvider::Resend);
        assert_eq!(MailProvider::parse(" smtp "), MailProvider::Smtp);
        assert_eq!(MailProvider::parse("sendgrid"), MailProvider::Log);
    }
}
