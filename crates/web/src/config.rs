use std::str::FromStr;

use anyhow::{Context, Result, ensure};
use url::Url;

const DEFAULT_SOLAPI_BASE_URL: &str = "https://api.solapi.com";
const DEFAULT_PHOTO_BUCKET: &str = "public";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub supabase_url: Url,
    pub supabase_anon_key: String,
    pub supabase_service_key: String,
    pub photo_bucket: String,
    pub solapi_api_key: String,
    pub solapi_api_secret: String,
    pub solapi_sender: String,
    pub solapi_base_url: String,
    pub contact_form_url: Url,
    pub app_url: String,
    pub password_reset_redirect: Option<String>,
    pub outbox_poll_secs: u64,
    pub outbox_max_attempts: i32,
}

fn required(name: &str) -> Result<String> {
    std::env::var(name).with_context(|| format!("Cannot load {name} env variable"))
}

fn url(name: &str, value: &str) -> Result<Url> {
    Url::parse(value).with_context(|| format!("{name} must be a valid URL"))
}

/// Parses an optional positive setting, falling back to `default` when unset.
fn positive<T>(name: &str, value: Option<String>, default: T) -> Result<T>
where
    T: FromStr + PartialOrd + Default,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let Some(value) = value else {
        return Ok(default);
    };
    let parsed: T = value
        .trim()
        .parse()
        .with_context(|| format!("{name} must be a number"))?;
    ensure!(parsed > T::default(), "{name} must be greater than zero");
    Ok(parsed)
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let supabase_url = required("SUPABASE_URL")?;
        let solapi_base_url = std::env::var("SOLAPI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_SOLAPI_BASE_URL.to_string());
        let contact_form_url = required("CONTACT_FORM_URL")?;

        Ok(Self {
            host: required("HOST")?,
            port: std::env::var("PORT")
                .context("PORT must be a number")?
                .parse()?,
            database_url: required("DATABASE_URL")?,
            supabase_url: url("SUPABASE_URL", &supabase_url)?,
            supabase_anon_key: required("SUPABASE_ANON_KEY")?,
            supabase_service_key: required("SUPABASE_SERVICE_KEY")?,
            photo_bucket: std::env::var("PHOTO_BUCKET")
                .unwrap_or_else(|_| DEFAULT_PHOTO_BUCKET.to_string()),
            solapi_api_key: required("SOLAPI_API_KEY")?,
            solapi_api_secret: required("SOLAPI_API_SECRET")?,
            solapi_sender: required("SOLAPI_SENDER")?,
            solapi_base_url: url("SOLAPI_BASE_URL", &solapi_base_url)?
                .as_str()
                .trim_end_matches('/')
                .to_string(),
            contact_form_url: url("CONTACT_FORM_URL", &contact_form_url)?,
            app_url: required("APP_URL")?.trim_end_matches('/').to_string(),
            password_reset_redirect: std::env::var("PASSWORD_RESET_REDIRECT").ok(),
            outbox_poll_secs: positive(
                "OUTBOX_POLL_SECS",
                std::env::var("OUTBOX_POLL_SECS").ok(),
                30,
            )?,
            outbox_max_attempts: positive(
                "OUTBOX_MAX_ATTEMPTS",
                std::env::var("OUTBOX_MAX_ATTEMPTS").ok(),
                5,
            )?,
        })
    }
}
