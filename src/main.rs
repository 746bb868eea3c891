use clap::{Parser, Subcommand};
use log::{error, info};
use rand::Rng;
use service::{config, config::Config, logging::Logger};
use sso::{CallbackParams, SsoClient};

/// Sign a user in against Azure AD and show their Graph profile.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    config: Config,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print a sign-in URL together with the CSRF state it carries.
    LoginUrl {
        /// Use this state instead of generating a random one.
        #[arg(long)]
        state: Option<String>,
    },
    /// Finish sign-in from the URL the browser was redirected to.
    Callback {
        /// The full redirect URL, including its query string.
        #[arg(long)]
        url: String,

        /// The state printed by `login-url` for this sign-in.
        #[arg(long)]
        expected_state: String,

        /// Also fetch group memberships (requires Group.Read.All).
        #[arg(long)]
        groups: bool,
    },
}

#[tokio::main]
async fn main() {
    config::load_dotenv();
    let cli = Cli::parse();

    if let Err(e) = Logger::init_logger(&cli.config) {
        eprintln!("Failed to start logger: {e}");
        std::process::exit(1);
    }

    if let Err(e) = run(cli).await {
        error!("Sign-in failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), sso::Error> {
    let mut client = SsoClient::from_settings(&cli.config.sso_settings())?;

    match cli.command {
        Command::LoginUrl { state } => {
            let state = state.unwrap_or_else(generate_state);
            println!("{}", client.authorization_url(&state));
            println!("state: {state}");
        }
        Command::Callback {
            url,
            expected_state,
            groups,
        } => {
            let params = CallbackParams::from_url(&url)?;
            client.authorize(&params, &expected_state).await?;
            info!("Signed in, fetching profile");

            println!("{}", serde_json::to_string_pretty(&client.me().await?)?);
            if groups {
                println!("{}", serde_json::to_string_pretty(&client.groups().await?)?);
            }
        }
    }

    Ok(())
}

/// 32 random bytes, hex encoded.
fn generate_state() -> String {
    let random_bytes: [u8; 32] = rand::thread_rng().gen();
    hex::encode(random_bytes)
}
