use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use playauth::cli::{run_session_action, ClientOptions, SessionAction};
use playauth::config::{DEFAULT_API_URL, DEFAULT_PORT, DEFAULT_PROVIDER_URL};
use playauth::server::ServeOptions;

#[derive(Parser)]
#[command(name = "playauth", version, about = "OAuth2/PKCE token harness for a streaming playback API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ClientArgs {
    /// Harness server base URL
    #[arg(long, env = "PLAYAUTH_SERVER", default_value = "http://localhost:8888/", global = true)]
    server: String,

    /// Streaming API base URL
    #[arg(long, env = "PLAYAUTH_API_URL", default_value = DEFAULT_API_URL, global = true)]
    api_url: String,

    /// Directory holding the client token and flags (default: ~/.playauth)
    #[arg(long, env = "PLAYAUTH_STATE_DIR", global = true)]
    state_dir: Option<PathBuf>,

    /// Print events as JSON lines
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the harness server (settings, authorize redirect, token exchange)
    Serve {
        /// Interface to bind
        #[arg(long, env = "PLAYAUTH_HOST", default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(long, env = "PLAYAUTH_PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Settings file holding the client credentials
        #[arg(long, env = "PLAYAUTH_SETTINGS", default_value = ".settings.json")]
        settings: PathBuf,

        /// Accounts host of the provider
        #[arg(long, env = "PLAYAUTH_PROVIDER_URL", default_value = DEFAULT_PROVIDER_URL)]
        provider_url: String,
    },

    /// Start a new authorization (newToken)
    Login {
        /// Only print the URL
        #[arg(long)]
        no_browser: bool,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Finish authorization with the URL the provider redirected to
    Callback {
        /// Full redirect URL including `code` and `state`
        url: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Refresh the stored token now (refreshToken)
    Refresh {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Show the current user profile
    Me {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Show the current playback state
    PlayerState {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Transfer playback to a device
    Transfer {
        /// Target device id
        device_id: Option<String>,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Play a share link or spotify:<type>:<id> URI
    Play {
        input: String,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Show token state and the auto-connect flag
    Status {
        #[command(flatten)]
        client: ClientArgs,
    },

    /// Inspect or overwrite the stored token
    Token {
        #[command(subcommand)]
        action: TokenAction,

        #[command(flatten)]
        client: ClientArgs,
    },

    /// Show or set the auto-connect flag
    AutoConnect {
        /// `true` or `false`; omit to show the current value
        enabled: Option<bool>,

        #[command(flatten)]
        client: ClientArgs,
    },
}

#[derive(Subcommand)]
enum TokenAction {
    /// Print the stored token
    Show,
    /// Overwrite the access token
    SetAccess { value: String },
    /// Overwrite the refresh token
    SetRefresh { value: String },
    /// Reset to an empty token
    Clear,
}

impl From<ClientArgs> for ClientOptions {
    fn from(args: ClientArgs) -> Self {
        ClientOptions {
            server: args.server,
            api_url: args.api_url,
            state_dir: args.state_dir,
            json: args.json,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("PLAYAUTH_LOG_LEVEL")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> Result<bool, playauth::PlayauthError> {
    let (client, action) = match cli.command {
        Commands::Serve {
            host,
            port,
            settings,
            provider_url,
        } => {
            playauth::server::run(ServeOptions {
                host,
                port,
                settings_path: settings,
                provider_url,
            })
            .await?;
            return Ok(true);
        }
        Commands::Login { no_browser, client } => (
            client,
            SessionAction::Login {
                open_browser: !no_browser,
            },
        ),
        Commands::Callback { url, client } => (client, SessionAction::Callback { url }),
        Commands::Refresh { client } => (client, SessionAction::Refresh),
        Commands::Me { client } => (client, SessionAction::Me),
        Commands::PlayerState { client } => (client, SessionAction::PlayerState),
        Commands::Transfer { device_id, client } => {
            (client, SessionAction::Transfer { device_id })
        }
        Commands::Play { input, client } => (client, SessionAction::Play { input }),
        Commands::Status { client } => (client, SessionAction::Status),
        Commands::Token { action, client } => {
            let action = match action {
                TokenAction::Show => SessionAction::ShowToken,
                TokenAction::SetAccess { value } => SessionAction::SetAccessToken { value },
                TokenAction::SetRefresh { value } => SessionAction::SetRefreshToken { value },
                TokenAction::Clear => SessionAction::ClearToken,
            };
            (client, action)
        }
        Commands::AutoConnect { enabled, client } => {
            (client, SessionAction::AutoConnect { enabled })
        }
    };

    run_session_action(&client.into(), action).await
}
