//! barkcast CLI - send push notifications to Bark-compatible servers.
//!
//! This is the main binary entry point. See the `barkcast` library for the
//! core functionality.

use anyhow::Result;
use barkcast::commands::{self, send, SendOptions};
use barkcast::env::Environment;
use barkcast::{DispatchError, Message, NotificationLevel};
use clap::{Parser, Subcommand};
use mimalloc::MiMalloc;

/// mimalloc provides better multi-threaded performance than the system allocator.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[command(name = "barkcast")]
#[command(version)]
#[command(about = "Fan a push notification out to Bark-compatible servers")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send a push to the selected (or named) targets
    Send(SendArgs),
    /// Manage delivery targets
    Targets {
        #[command(subcommand)]
        action: TargetAction,
    },
    /// Inspect delivery history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Open an encrypted `data` value with a push key
    Decrypt {
        /// Push key the envelope was sealed with
        #[arg(long)]
        key: String,
        /// The `nonce:tag:ciphertext` value
        data: String,
    },
    /// Print the effective configuration (keys masked)
    Config,
}

#[derive(clap::Args)]
struct SendArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    body: String,
    #[arg(long)]
    sound: Option<String>,
    #[arg(long)]
    icon: Option<String>,
    /// URL opened when the notification is tapped
    #[arg(long)]
    url: Option<String>,
    #[arg(long)]
    group: Option<String>,
    #[arg(long)]
    badge: Option<i64>,
    /// Text placed on the receiver's clipboard
    #[arg(long)]
    copy: Option<String>,
    /// active, timeSensitive or passive
    #[arg(long)]
    level: Option<NotificationLevel>,
    #[arg(long)]
    auto_copy: bool,
    #[arg(long)]
    loop_sound: bool,
    /// Keep the notification in the receiver's archive
    #[arg(long)]
    archive: bool,
    /// Encrypt title and body regardless of the config setting
    #[arg(long, conflicts_with = "no_encrypt")]
    encrypt: bool,
    /// Send title and body in the clear regardless of the config setting
    #[arg(long)]
    no_encrypt: bool,
    /// Target name; repeat to send to several. Defaults to the selection.
    #[arg(long = "target")]
    targets: Vec<String>,
}

impl SendArgs {
    fn into_parts(self) -> (Message, SendOptions) {
        let mut message = Message::new(self.title, self.body)
            .with_auto_copy(self.auto_copy)
            .with_loop_sound(self.loop_sound)
            .with_archive(self.archive);
        if let Some(sound) = self.sound {
            message = message.with_sound(sound);
        }
        if let Some(icon) = self.icon {
            message = message.with_icon(icon);
        }
        if let Some(url) = self.url {
            message = message.with_url(url);
        }
        if let Some(group) = self.group {
            message = message.with_group(group);
        }
        if let Some(badge) = self.badge {
            message = message.with_badge(badge);
        }
        if let Some(copy) = self.copy {
            message = message.with_copy(copy);
        }
        if let Some(level) = self.level {
            message = message.with_level(level);
        }

        let encrypt = match (self.encrypt, self.no_encrypt) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        let options = SendOptions {
            targets: self.targets,
            encrypt,
        };
        (message, options)
    }
}

#[derive(Subcommand)]
enum TargetAction {
    /// List configured targets
    List,
    /// Add a target
    Add {
        name: String,
        /// Device push key
        #[arg(long)]
        key: String,
        /// Server base URL (defaults to the configured default server)
        #[arg(long)]
        server: Option<String>,
        /// Include the target in the default selection
        #[arg(long)]
        select: bool,
    },
    /// Remove a target
    Remove { name: String },
    /// Add targets to the default selection
    Select { names: Vec<String> },
    /// Drop targets from the default selection
    Deselect { names: Vec<String> },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List records, newest first
    List {
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Delete a record by id
    Delete { id: String },
    /// Delete every record
    Clear,
}

fn init_logging() {
    let env = env_logger::Env::default()
        .default_filter_or(Environment::current().default_log_filter());
    let mut builder = env_logger::Builder::from_env(env);
    builder.format_timestamp_secs();

    // BARKCAST_LOG_FILE redirects logs away from stderr
    if let Ok(path) = std::env::var("BARKCAST_LOG_FILE") {
        match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("warning: cannot open log file {path}: {e}"),
        }
    }
    builder.init();
}

async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Send(args) => {
            let (message, options) = args.into_parts();
            commands::send_message(message, options).await?;
        }
        Commands::Targets { action } => match action {
            TargetAction::List => commands::targets::list()?,
            TargetAction::Add {
                name,
                key,
                server,
                select,
            } => commands::targets::add(&name, &key, server.as_deref(), select)?,
            TargetAction::Remove { name } => commands::targets::remove(&name)?,
            TargetAction::Select { names } => commands::targets::select(&names, true)?,
            TargetAction::Deselect { names } => commands::targets::select(&names, false)?,
        },
        Commands::History { action } => match action {
            HistoryAction::List { limit } => commands::history::list(limit)?,
            HistoryAction::Delete { id } => commands::history::delete(&id)?,
            HistoryAction::Clear => commands::history::clear()?,
        },
        Commands::Decrypt { key, data } => commands::decrypt::run(&key, &data)?,
        Commands::Config => commands::config::show()?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_logging();
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        log::error!("{err:#}");
        eprintln!("Error: {err:#}");
        let code = err
            .downcast_ref::<DispatchError>()
            .map_or(1, send::exit_code);
        std::process::exit(code);
    }
}
