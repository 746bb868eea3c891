use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use secrecy::SecretString;
use sso::endpoints::{DEFAULT_GRAPH_BASE_URL, DEFAULT_LOGIN_BASE_URL};
use sso::{Endpoints, SsoSettings};
use std::convert::Infallible;
use std::time::Duration;

/// Default callback URL, matching the local demo server.
pub const DEFAULT_REDIRECT_URL: &str = "http://localhost:8080/auth";

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// The directory tenant to sign users in against (e.g. contoso.com or a tenant GUID).
    #[arg(long, env = "AAD_TENANT")]
    tenant: String,

    /// The application (client) ID registered in the tenant.
    #[arg(long, env = "AAD_ID")]
    application_id: String,

    /// The client secret value of the registered application.
    #[arg(long, env = "AAD_SECRET", hide_env_values = true, value_parser = parse_secret)]
    application_secret: SecretString,

    /// The redirect URL whitelisted on the application registration.
    #[arg(long, env = "AAD_REDIRECT_URL", default_value = DEFAULT_REDIRECT_URL)]
    redirect_url: String,

    /// The base URL of the OAuth2 login host.
    /// Override in tests to point at a mock server.
    #[arg(long, env = "AAD_LOGIN_BASE_URL", default_value = DEFAULT_LOGIN_BASE_URL)]
    login_base_url: String,

    /// The base URL of the Microsoft Graph API.
    #[arg(long, env = "AAD_GRAPH_BASE_URL", default_value = DEFAULT_GRAPH_BASE_URL)]
    graph_base_url: String,

    /// Timeout in seconds applied to every outbound request
    #[arg(
        long = "request-timeout-secs",
        env = "AAD_REQUEST_TIMEOUT_SECS",
        default_value = "3",
        value_parser = parse_timeout
    )]
    request_timeout: Duration,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .map(|s| s.parse::<LevelFilter>().unwrap()),
        )]
    pub log_level_filter: LevelFilter,
}

fn parse_secret(value: &str) -> Result<SecretString, Infallible> {
    Ok(SecretString::new(value.to_string()))
}

fn parse_timeout(value: &str) -> Result<Duration, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("`{value}` is not a number of seconds"))?;
    if secs.is_nan() || secs <= 0.0 {
        return Err(format!("timeout must be a positive number of seconds, got {value}"));
    }
    Duration::try_from_secs_f64(secs).map_err(|_| format!("timeout of {value} seconds is too large"))
}

/// Loads a `.env` file from the working directory or its parents, if present.
pub fn load_dotenv() {
    dotenv().ok();
}

impl Config {
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    pub fn application_id(&self) -> &str {
        &self.application_id
    }

    pub fn redirect_url(&self) -> &str {
        &self.redirect_url
    }

    pub fn endpoints(&self) -> Endpoints {
        Endpoints::new(&self.login_base_url, &self.graph_base_url)
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Settings for constructing an `sso::SsoClient`.
    pub fn sso_settings(&self) -> SsoSettings {
        SsoSettings {
            redirect_url: self.redirect_url.clone(),
            tenant: self.tenant.clone(),
            application_id: self.application_id.clone(),
            application_secret: self.application_secret.clone(),
            endpoints: self.endpoints(),
            timeout: self.request_timeout(),
        }
    }
}
