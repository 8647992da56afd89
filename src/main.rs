//! CLI entry point for `tagbox`.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};

use tagbox::config::{self, Config};
use tagbox::error::MailError;
use tagbox::export::smtp::{Envelope, MailSender};
use tagbox::mailbox::Mailboxes;
use tagbox::model::documents::StoredDocuments;
use tagbox::model::input::InputMail;
use tagbox::model::mail::Mail;
use tagbox::search::MailboxIndexer;
use tagbox::service::MailService;
use tagbox::store::{InMemoryStore, Querier};

#[derive(Parser)]
#[command(name = "tagbox", version, about = "Inspect mails through the tagbox mail/tag core")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Own address, overriding `account.address` from the config
    #[arg(long, global = true, env = "TAGBOX_ADDRESS")]
    address: Option<String>,

    /// Verbose logging (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the JSON projection of a stored mail (flags/headers/body documents as JSON)
    Show { path: PathBuf },
    /// Render a draft/send JSON request as MIME
    Compose {
        path: PathBuf,
        /// Render the SMTP wire format instead (CRLF, From set, no Bcc)
        #[arg(long)]
        smtp: bool,
    },
    /// Import raw messages into a mailbox and list them by tag
    List {
        /// Raw RFC 5322 messages
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Mailbox the files are imported into
        #[arg(short, long, default_value = "INBOX")]
        mailbox: String,
        /// Tags to list (any of them matches); defaults to every mail
        #[arg(short, long)]
        tag: Vec<String>,
    },
    /// Show the effective configuration
    Config,
}

/// The CLI never talks to an SMTP server.
struct NoTransport;

impl MailSender for NoTransport {
    fn send(&self, _envelope: &Envelope) -> tagbox::error::Result<()> {
        Err(MailError::Send("no SMTP transport configured".into()))
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = config::load_config();
    if let Some(address) = cli.address {
        config.account.address = address;
    }

    let log_level = match cli.verbose {
        0 => config.general.log_level.as_str(),
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    setup_logging(log_level, &config);

    match cli.command {
        Commands::Show { path } => cmd_show(&path, &config),
        Commands::Compose { path, smtp } => cmd_compose(&path, smtp, &config),
        Commands::List {
            files,
            mailbox,
            tag,
        } => cmd_list(&files, &mailbox, &tag, &config),
        Commands::Config => cmd_config(&config),
    }
}

/// Set up tracing with stderr output and optional file logging.
fn setup_logging(level: &str, config: &Config) {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let log_dir = config::cache_dir(config);
    if std::fs::create_dir_all(&log_dir).is_ok() {
        let file_appender = tracing_appender::rolling::never(&log_dir, "tagbox.log");
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .with_writer(file_appender);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .with(file_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(stderr_layer)
            .init();
    }
}

fn read_file(path: &Path) -> anyhow::Result<String> {
    if !path.exists() {
        anyhow::bail!("File not found: {}", path.display());
    }
    Ok(std::fs::read_to_string(path).map_err(|e| MailError::io(path, e))?)
}

fn cmd_show(path: &Path, config: &Config) -> anyhow::Result<()> {
    let docs: StoredDocuments = serde_json::from_str(&read_file(path)?)?;
    let mail = Mail::from_documents(&docs)?;
    let dict = mail.as_dict(&config.account.address);
    println!("{}", serde_json::to_string_pretty(&dict)?);
    Ok(())
}

fn cmd_compose(path: &Path, smtp: bool, config: &Config) -> anyhow::Result<()> {
    let value: serde_json::Value = serde_json::from_str(&read_file(path)?)?;
    let mail = Mail::from_input(InputMail::from_json(&value)?)?;
    if smtp {
        if config.account.address.is_empty() {
            anyhow::bail!("No sending address: set account.address or pass --address");
        }
        print!("{}", mail.to_smtp_format(&config.account.from_header()));
    } else {
        print!("{}", mail.to_mime_multipart());
    }
    Ok(())
}

fn cmd_list(files: &[PathBuf], mailbox: &str, tags: &[String], config: &Config) -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStore::new());
    for path in files {
        match store.import_raw(&read_file(path)?, mailbox) {
            Ok(ident) => tracing::debug!(path = %path.display(), ident = %ident, "Imported"),
            Err(e) if e.is_per_mail() => {
                tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable message");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let querier: Arc<dyn Querier> = store;
    let indexer = config
        .indexer
        .enabled
        .then(|| Arc::new(MailboxIndexer::start(Arc::clone(&querier))));
    let mut names = config.account.mailboxes.clone();
    names.push(mailbox.to_string());
    let mailboxes = Mailboxes::new(querier, &names, indexer);
    let service = MailService::new(mailboxes, Arc::new(NoTransport), config.account.clone());

    let requested: BTreeSet<String> = tags.iter().map(|t| t.trim().to_lowercase()).collect();
    let listing = service.mails(&requested)?;
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

fn cmd_config(config: &Config) -> anyhow::Result<()> {
    match config::config_file_path() {
        Some(path) => println!("# {}", path.display()),
        None => println!("# (no config path available)"),
    }
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
