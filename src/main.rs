//! parley CLI - chat with a generative-language service, history kept locally.

use clap::{Parser, Subcommand};
use parley::cli;
use parley::config::load_config;
use parley::core::{AiStyle, SettingsPatch, Theme};
use std::process::ExitCode;
use std::sync::LazyLock;
use tracing_subscriber::EnvFilter;

/// Version reported by `--version`: the bare package version on tagged
/// builds, otherwise `<version>-dev (<hash>)`.
static VERSION: LazyLock<String> = LazyLock::new(|| {
    version_string(
        env!("CARGO_PKG_VERSION"),
        env!("PARLEY_GIT_HASH"),
        env!("PARLEY_IS_RELEASE") == "true",
    )
});

fn version_string(package: &str, git_hash: &str, release: bool) -> String {
    if release {
        package.to_string()
    } else {
        format!("{package}-dev ({git_hash})")
    }
}

#[derive(Parser)]
#[command(name = "parley")]
#[command(author, version = VERSION.as_str(), about = "Chat with a generative-language service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in. Prompts for the password if not given.
    Login {
        /// Account email.
        email: String,

        /// Account password.
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create an account and sign in.
    Register {
        /// Display name.
        #[arg(short, long)]
        name: String,

        /// Account email.
        email: String,

        /// Account password. Prompts twice if not given.
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Sign out. Conversations stay on disk.
    Logout,

    /// Show the signed-in user.
    Whoami,

    /// Start a new conversation and print its id.
    New,

    /// List conversations, most recent first.
    List,

    /// Print a conversation transcript. Defaults to the most recent.
    Show {
        /// Conversation ID.
        id: Option<String>,
    },

    /// Delete a conversation.
    Delete {
        /// Conversation ID.
        id: String,
    },

    /// Send one message and print the reply.
    Send {
        /// Conversation to send to. Defaults to the most recent, or a new one.
        #[arg(short, long)]
        conversation: Option<String>,

        /// Message text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },

    /// Chat interactively on stdin.
    Chat {
        /// Conversation to continue. Defaults to the most recent.
        #[arg(short, long)]
        conversation: Option<String>,
    },

    /// Show or change preferences.
    Settings {
        #[command(subcommand)]
        action: Option<SettingsAction>,
    },
}

#[derive(Subcommand)]
enum SettingsAction {
    /// Print current settings.
    Show,

    /// Change one or more settings.
    Set {
        /// Interface language tag (e.g. "en").
        #[arg(long)]
        language: Option<String>,

        /// Color theme: light or dark.
        #[arg(long)]
        theme: Option<Theme>,

        /// Assistant tone: balanced, creative, precise, friendly, professional.
        #[arg(long)]
        ai_style: Option<AiStyle>,

        /// Sampling temperature, clamped to 0.0..=1.0.
        #[arg(long)]
        temperature: Option<f32>,
    },

    /// Restore defaults.
    Reset,
}

fn init_logging() {
    let filter = EnvFilter::try_from_env("PARLEY_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let config = match load_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("parley: error: {e}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "configuration loaded");

    let result = match cli.command {
        Commands::Login { email, password } => cli::auth::login(&config, &email, password),
        Commands::Register {
            name,
            email,
            password,
        } => cli::auth::register(&config, &name, &email, password),
        Commands::Logout => cli::auth::logout(&config),
        Commands::Whoami => cli::auth::whoami(&config),
        Commands::New => cli::conversations::new(&config),
        Commands::List => cli::conversations::list(&config),
        Commands::Show { id } => cli::conversations::show(&config, id.as_deref()),
        Commands::Delete { id } => cli::conversations::delete(&config, &id),
        Commands::Send { conversation, text } => {
            cli::send::send(&config, conversation.as_deref(), &text.join(" ")).await
        }
        Commands::Chat { conversation } => cli::send::chat(&config, conversation.as_deref()).await,
        Commands::Settings { action } => match action.unwrap_or(SettingsAction::Show) {
            SettingsAction::Show => cli::settings::show(&config),
            SettingsAction::Set {
                language,
                theme,
                ai_style,
                temperature,
            } => cli::settings::set(
                &config,
                &SettingsPatch {
                    language,
                    theme,
                    ai_style,
                    temperature,
                },
            ),
            SettingsAction::Reset => cli::settings::reset(&config),
        },
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("parley: error: {e}");
            ExitCode::FAILURE
        }
    }
}
