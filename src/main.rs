use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, bail};
use rust_decimal::Decimal;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;
use tracing_subscriber::EnvFilter;
use tutorbook::application::context::{AppContext, ProcessorFactory, Services};
use tutorbook::application::orchestrator::SubmitOutcome;
use tutorbook::config::{ClientConfig, DEFAULT_API_BASE, DEFAULT_RETURN_URL};
use tutorbook::domain::auth::{RegisterRequest, Role};
use tutorbook::domain::booking::SessionLength;
use tutorbook::domain::payment::ProcessorConfig;
use tutorbook::domain::ports::{CredentialStoreBox, NotifierRef, PaymentProcessorRef};
use tutorbook::domain::tutor::TutorId;
use tutorbook::infrastructure::file_store::JsonFileCredentialStore;
use tutorbook::infrastructure::http::ApiClient;
use tutorbook::infrastructure::stripe::StripeProcessor;
use tutorbook::interfaces::console::{
    ConsoleNotifier, render_directory, render_summary, render_tutor,
};
use tutorbook::interfaces::csv::tutor_writer::TutorWriter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Base URL of the marketplace API
    #[arg(long, env = "TUTORBOOK_API_BASE", default_value = DEFAULT_API_BASE, global = true)]
    api_base: String,

    /// File holding the saved login
    #[arg(
        long,
        env = "TUTORBOOK_CREDENTIALS",
        default_value = ".tutorbook/credentials.json",
        global = true
    )]
    credentials: PathBuf,

    /// Path to a RocksDB database for the saved login (needs the
    /// `storage-rocksdb` feature)
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Where the payment processor redirects after 3-D Secure
    #[arg(long, env = "TUTORBOOK_RETURN_URL", default_value = DEFAULT_RETURN_URL, global = true)]
    return_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 30, global = true)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and save the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "TUTORBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and save the session
    Register(RegisterArgs),
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// List tutors
    Tutors {
        /// Print the directory as CSV
        #[arg(long)]
        csv: bool,
    },
    /// Show one tutor
    Tutor { id: i64 },
    /// Book and pay for a session
    Book(BookArgs),
}

#[derive(Clone, Copy, ValueEnum)]
enum CliRole {
    Student,
    Tutor,
}

impl From<CliRole> for Role {
    fn from(role: CliRole) -> Self {
        match role {
            CliRole::Student => Role::Student,
            CliRole::Tutor => Role::Tutor,
        }
    }
}

#[derive(Args)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "TUTORBOOK_PASSWORD", hide_env_values = true)]
    password: String,
    #[arg(long, value_enum, default_value_t = CliRole::Student)]
    role: CliRole,
    #[arg(long, default_value = "")]
    phone: String,
    #[arg(long, default_value = "")]
    bio: String,
    /// Subject taught (tutors only, repeatable)
    #[arg(long = "subject")]
    subjects: Vec<String>,
    #[arg(long)]
    hourly_rate: Option<Decimal>,
}

#[derive(Args)]
struct BookArgs {
    tutor_id: i64,
    #[arg(long)]
    subject: String,
    /// Session date, YYYY-MM-DD
    #[arg(long)]
    date: NaiveDate,
    /// Session start, HH:MM in local time
    #[arg(long, value_parser = parse_time)]
    time: NaiveTime,
    /// 30, 60, 90 or 120
    #[arg(long, default_value_t = 60)]
    duration: u32,
    #[arg(long, default_value = "")]
    notes: String,
    /// Processor payment-method reference, e.g. pm_card_visa
    #[arg(long)]
    payment_method: String,
}

fn parse_time(s: &str) -> std::result::Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M:%S"))
        .map_err(|e| format!("expected HH:MM: {e}"))
}

fn open_credentials(cli: &Cli) -> Result<CredentialStoreBox> {
    if let Some(db_path) = &cli.db_path {
        #[cfg(feature = "storage-rocksdb")]
        {
            let store =
                tutorbook::infrastructure::rocksdb::RocksDbCredentialStore::open(db_path)
                    .into_diagnostic()?;
            return Ok(Box::new(store));
        }
        #[cfg(not(feature = "storage-rocksdb"))]
        warn!(
            db_path = %db_path.display(),
            "WARNING: Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to the credentials file."
        );
    }
    Ok(Box::new(JsonFileCredentialStore::new(&cli.credentials)))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tutorbook=info")),
        )
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .init();

    let cli = Cli::parse();

    // Reject bad input before touching the network.
    if let Command::Book(args) = &cli.command {
        SessionLength::try_from(args.duration).into_diagnostic()?;
    }

    let config = ClientConfig::new(&cli.api_base)
        .with_return_url(&cli.return_url)
        .with_timeout(Duration::from_secs(cli.timeout_secs));

    let api = Arc::new(ApiClient::new(config.clone()).into_diagnostic()?);
    let services = Services {
        directory: api.clone(),
        booking: api.clone(),
        auth: api.clone(),
        config: api,
    };
    let notifier: NotifierRef = Arc::new(ConsoleNotifier::stdout());
    let stripe_config = config.clone();
    let processor_factory: ProcessorFactory = Box::new(move |processor: ProcessorConfig| {
        StripeProcessor::new(processor, &stripe_config)
            .map(|stripe| Arc::new(stripe) as PaymentProcessorRef)
    });

    let credentials = open_credentials(&cli)?;
    let mut ctx = AppContext::new(config, services, credentials, notifier, processor_factory);
    ctx.restore_login().await;

    match cli.command {
        Command::Login { email, password } => {
            let user = ctx.login(&email, &password).await.into_diagnostic()?;
            println!("Logged in as {} ({})", user.name, user.role);
        }
        Command::Register(args) => {
            let mut request = RegisterRequest {
                name: args.name,
                email: args.email,
                password: args.password,
                role: args.role.into(),
                phone: args.phone,
                bio: args.bio,
                subjects: Vec::new(),
                hourly_rate: args.hourly_rate,
            };
            for subject in &args.subjects {
                request.add_subject(subject);
            }
            let user = ctx.register(&request).await.into_diagnostic()?;
            println!("Registered {} ({})", user.name, user.role);
        }
        Command::Logout => ctx.logout().await.into_diagnostic()?,
        Command::Whoami => match ctx.current_user() {
            Some(user) => println!("{} ({}) <{}>", user.name, user.role, user.email),
            None => println!("Not logged in"),
        },
        Command::Tutors { csv } => {
            let tutors = ctx.list_tutors().await.into_diagnostic()?;
            if csv {
                let stdout = io::stdout();
                TutorWriter::new(stdout.lock())
                    .write_tutors(&tutors)
                    .into_diagnostic()?;
            } else {
                print!("{}", render_directory(&tutors));
            }
        }
        Command::Tutor { id } => {
            let tutor = ctx.get_tutor(TutorId(id)).await.into_diagnostic()?;
            print!("{}", render_tutor(&tutor));
        }
        Command::Book(args) => book(&mut ctx, args).await?,
    }

    Ok(())
}

async fn book(ctx: &mut AppContext, args: BookArgs) -> Result<()> {
    ctx.load_processor().await;
    let mut dialog = ctx
        .open_booking(TutorId(args.tutor_id))
        .await
        .into_diagnostic()?;

    let form = dialog.form_mut().into_diagnostic()?;
    form.set_subject(&args.subject);
    form.set_date(args.date);
    form.set_time(args.time);
    form.set_duration(args.duration).into_diagnostic()?;
    form.set_notes(&args.notes);
    print!("{}", render_summary(&dialog.form().summary()));

    if ctx.submit_booking(&dialog).await != SubmitOutcome::PaymentDetailsRequired {
        dialog.close();
        bail!("could not start the payment");
    }

    dialog
        .orchestrator()
        .attach_payment_method(args.payment_method)
        .into_diagnostic()?;

    match ctx.submit_booking(&dialog).await {
        SubmitOutcome::Booked(confirmation) => {
            println!(
                "{}",
                serde_json::to_string_pretty(&confirmation).into_diagnostic()?
            );
            if let Some(tutors) = ctx.close_booking(dialog).await.into_diagnostic()? {
                println!("{} tutors in the directory", tutors.len());
            }
            Ok(())
        }
        _ => {
            dialog.close();
            bail!("the booking was not completed");
        }
    }
}
