use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Credentials of the account created on first start.
#[derive(Debug, Clone, Deserialize)]
pub struct SuperuserConfig {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub project_name: String,
    pub api_prefix: String,
    pub database_url: String,
    pub db_max_connections: u32,
    pub jwt: JwtConfig,
    pub first_superuser: SuperuserConfig,
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => database_url_from_parts()?,
        };
        let jwt = JwtConfig {
            secret: std::env::var("SECRET_KEY").context("SECRET_KEY must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "gacha-armory".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "gacha-armory-users".into()),
            ttl_minutes: std::env::var("ACCESS_TOKEN_EXPIRE_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        };
        let first_superuser = SuperuserConfig {
            name: std::env::var("FIRST_SUPERUSER_NAME")
                .context("FIRST_SUPERUSER_NAME must be set")?,
            email: std::env::var("FIRST_SUPERUSER_EMAIL")
                .context("FIRST_SUPERUSER_EMAIL must be set")?,
            password: std::env::var("FIRST_SUPERUSER_PASS")
                .context("FIRST_SUPERUSER_PASS must be set")?,
        };

        let mut cors_origins =
            parse_origins(&std::env::var("BACKEND_CORS_ORIGINS").unwrap_or_default());
        if let Ok(frontend) = std::env::var("FRONTEND_HOST") {
            let frontend = frontend.trim_end_matches('/').to_string();
            if !frontend.is_empty() && !cors_origins.contains(&frontend) {
                cors_origins.push(frontend);
            }
        }

        Ok(Self {
            project_name: std::env::var("PROJECT_NAME").unwrap_or_else(|_| "Gacha Armory".into()),
            api_prefix: std::env::var("API_V1_STR").unwrap_or_else(|_| "/api/v1".into()),
            database_url,
            db_max_connections: std::env::var("DB_MAX_CONNECTIONS")
                .ok()
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
            jwt,
            first_superuser,
            cors_origins,
        })
    }
}

fn database_url_from_parts() -> anyhow::Result<String> {
    let var = |name: &str| {
        std::env::var(name).with_context(|| format!("{name} must be set when DATABASE_URL is not"))
    };
    Ok(format!(
        "postgres://{}:{}@{}:{}/{}",
        var("DB_USER")?,
        var("DB_PASS")?,
        var("DB_HOST")?,
        var("DB_PORT")?,
        var("DB_NAME")?,
    ))
}

/// Splits a comma separated origin list, dropping blanks and trailing slashes.
pub(crate) fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|o| o.trim().trim_end_matches('/'))
        .filter(|o| !o.is_empty())
        .map(str::to_string)
        .collect()
}
