use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use error_stack::{Report, ResultExt};
use photos_admin::{
    admin::{
        history::InMemoryAdminHistory,
        photo::{NoticeDispatch, PhotoAdmin, NOTICE_RECIPIENTS_SETTING},
    },
    auth::{permissions::InMemoryPermissionRegistry, InMemoryUserDirectory, Principal, UserId},
    config::NotificationConfig,
    email::{services::NoopEmailService, templates::create_templates, EmailSender},
    event_log::InMemoryEventLog,
    models::photo::queries::InMemoryPhotoStore,
    notification::{EmailNotifier, InMemorySettings, NoticeType, DEFAULT_NOTICE_TEMPLATES},
    server,
    storage::Storage,
    tracing_config::configure_tracing,
    Error,
};
use tracing::{event, Level};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Serve(ServeCommand),
}

#[derive(Args, Debug)]
struct ServeCommand {
    /// The IP host to bind to
    #[clap(long, env = "HOST", default_value_t = String::from("127.0.0.1"))]
    host: String,

    /// The TCP port to listen on
    #[clap(long, env = "PORT", default_value_t = 7823)]
    port: u16,

    /// The environment in which this server is running
    #[clap(long = "env", env = "ENV", default_value_t = String::from("development"))]
    env: String,

    /// Request timeout, in seconds
    #[clap(long, env = "REQUEST_TIMEOUT", default_value_t = 60)]
    request_timeout: u64,

    /// Username of the superuser created at startup
    #[clap(long, env = "ADMIN_USERNAME", default_value_t = String::from("admin"))]
    admin_username: String,

    /// Email of the superuser created at startup
    #[clap(long, env = "ADMIN_EMAIL", default_value_t = String::from("admin@example.com"))]
    admin_email: String,

    /// API key for the superuser created at startup
    #[clap(long, env = "ADMIN_API_KEY")]
    admin_api_key: String,

    /// Directory where uploaded images are stored. Images are kept in memory when omitted.
    #[clap(long, env = "STORAGE_PATH")]
    storage_path: Option<String>,

    /// The From address on notice emails. Defaults to the `EMAIL_FROM` environment variable.
    #[clap(long)]
    email_from: Option<String>,

    /// The notice type sent when a photo is saved. Defaults to the `NOTICE_TYPE` environment
    /// variable. Notices are disabled when neither is set.
    #[clap(long)]
    notice_type: Option<String>,

    /// Comma-separated addresses that receive notices. Defaults to the `NOTICE_RECIPIENTS`
    /// environment variable.
    #[clap(long)]
    notice_recipients: Option<String>,
}

impl ServeCommand {
    fn notification_config(&self) -> NotificationConfig {
        let mut config = NotificationConfig::from_env("");
        config.merge(NotificationConfig {
            from: self.email_from.clone(),
            notice_type: self
                .notice_type
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(NoticeType::new),
            recipients: self.notice_recipients.clone(),
        });
        config
    }
}

fn notice_dispatch(config: &NotificationConfig) -> Result<Option<NoticeDispatch>, Report<Error>> {
    let Some(notice_type) = config.notice_type.clone() else {
        event!(Level::WARN, "No notice type configured, notices are disabled");
        return Ok(None);
    };

    let templates = create_templates(DEFAULT_NOTICE_TEMPLATES.iter().copied())
        .change_context(Error::ServerStart)?;
    let sender = EmailSender::new(
        config
            .from
            .clone()
            .unwrap_or_else(|| "noreply@localhost".to_string()),
        Arc::new(templates),
        Arc::new(NoopEmailService {}),
    );

    Ok(Some(NoticeDispatch {
        notifier: Arc::new(EmailNotifier::new(Arc::new(sender))),
        notice_type,
    }))
}

async fn serve(cmd: ServeCommand) -> Result<(), Report<Error>> {
    configure_tracing(
        "",
        tracing_subscriber::fmt::time::SystemTime,
        std::io::stdout,
    )
    .change_context(Error::TracingConfig)?;

    let notifications = cmd.notification_config();

    let settings = Arc::new(InMemorySettings::new());
    if let Some(recipients) = &notifications.recipients {
        let (scope, scope_category, name) = NOTICE_RECIPIENTS_SETTING;
        settings.set(scope, scope_category, name, recipients.as_str());
    }

    let storage = match &cmd.storage_path {
        Some(path) => Storage::new_local(path.clone()).change_context(Error::Storage)?,
        None => Storage::new_in_memory(),
    };

    let users = Arc::new(InMemoryUserDirectory::new());
    users.add(
        cmd.admin_api_key.clone(),
        Principal {
            id: UserId::new(),
            username: cmd.admin_username.clone(),
            email: cmd.admin_email.clone(),
            active: true,
            is_staff: true,
            is_superuser: true,
            groups: vec![],
        },
    );

    let event_log = Arc::new(InMemoryEventLog::new());
    let photo_admin = PhotoAdmin::builder()
        .store(Arc::new(InMemoryPhotoStore::new()))
        .permissions(Arc::new(InMemoryPermissionRegistry::new()))
        .event_log(event_log.clone())
        .history(Arc::new(InMemoryAdminHistory::new()))
        .storage(Arc::new(storage))
        .settings(settings)
        .notices(notice_dispatch(&notifications)?)
        .build();

    let server = server::create_server(server::Config {
        env: cmd.env,
        host: cmd.host,
        port: cmd.port,
        request_timeout: std::time::Duration::from_secs(cmd.request_timeout),
        photo_admin,
        users,
        event_log,
    })
    .await?;

    server.run().await?;

    event!(Level::INFO, "Shut down complete");

    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
pub async fn main() -> Result<(), Report<Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve(cmd) => serve(cmd).await,
    }
}
