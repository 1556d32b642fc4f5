//! eunoia CLI: coherence-gated conversational agent.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use miette::{IntoDiagnostic, Result};

use eunoia::config::EngineConfig;
use eunoia::engine::Engine;
use eunoia::paths::EunoiaPaths;
use eunoia::store::{JsonFileStore, SessionStore, SnapshotStore};

#[derive(Parser)]
#[command(name = "eunoia", version, about = "Coherence scoring and drift tracking agent")]
struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/eunoia/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Session database (default: $XDG_DATA_HOME/eunoia/sessions.redb).
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Session name.
    #[arg(long, global = true, default_value = "default")]
    session: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage the config file.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// List or delete stored sessions.
    Sessions {
        #[command(subcommand)]
        action: Option<SessionsAction>,
    },

    #[command(flatten)]
    Session(SessionCommand),
}

#[derive(Subcommand)]
enum SessionCommand {
    /// Interactive conversation on stdin. `/review`, `/summary` and `/quit`
    /// are commands.
    Chat,

    /// Process one input and print the response.
    Say {
        text: String,

        /// Print scores, drift and curvature.
        #[arg(long)]
        verbose: bool,
    },

    /// Score an input without recording it.
    Score { text: String },

    /// Review the last exchange and print the self summary.
    Review,

    /// Print the self summary.
    Summary,

    /// Write the session snapshot to a JSON file.
    Export { file: PathBuf },

    /// Replace the session with a JSON snapshot.
    Import { file: PathBuf },
}

#[derive(Subcommand)]
enum SessionsAction {
    /// List stored sessions (the default).
    List,
    /// Delete a stored session.
    Rm { name: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write the default config.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
    /// Print the effective config as TOML.
    Show,
}

struct Resolved {
    config_file: PathBuf,
    db: PathBuf,
}

impl Resolved {
    fn from_cli(cli: &Cli) -> Result<Self> {
        if let (Some(config_file), Some(db)) = (&cli.config, &cli.db) {
            return Ok(Self {
                config_file: config_file.clone(),
                db: db.clone(),
            });
        }
        let paths = EunoiaPaths::resolve()?;
        paths.ensure_dirs()?;
        Ok(Self {
            config_file: cli.config.clone().unwrap_or_else(|| paths.config_file()),
            db: cli.db.clone().unwrap_or_else(|| paths.sessions_db()),
        })
    }
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let resolved = Resolved::from_cli(&cli)?;

    match cli.command {
        Commands::Config { action } => config_command(&action, &resolved),
        Commands::Sessions { action } => sessions_command(action, &resolved),
        Commands::Session(command) => session_command(command, &cli.session, &resolved),
    }
}

fn config_command(action: &ConfigAction, resolved: &Resolved) -> Result<()> {
    match action {
        ConfigAction::Init { force } => {
            if resolved.config_file.exists() && !force {
                println!(
                    "Config already exists at {} (use --force to overwrite)",
                    resolved.config_file.display()
                );
            } else {
                EngineConfig::default().save(&resolved.config_file)?;
                println!("Wrote {}", resolved.config_file.display());
            }
        }
        ConfigAction::Show => {
            let config = EngineConfig::load_or_default(&resolved.config_file)?;
            let text = config.to_toml().map_err(|m| miette::miette!("{m}"))?;
            print!("{text}");
        }
    }
    Ok(())
}

fn sessions_command(action: Option<SessionsAction>, resolved: &Resolved) -> Result<()> {
    let store = SessionStore::open(&resolved.db)?;
    match action.unwrap_or(SessionsAction::List) {
        SessionsAction::List => {
            for name in store.list_sessions()? {
                println!("{name}");
            }
        }
        SessionsAction::Rm { name } => {
            if store.remove(&name)? {
                println!("Removed session \"{name}\"");
            } else {
                miette::bail!("no session named \"{name}\"");
            }
        }
    }
    Ok(())
}

fn session_command(command: SessionCommand, name: &str, resolved: &Resolved) -> Result<()> {
    let config = EngineConfig::load_or_default(&resolved.config_file)?;
    let store = SessionStore::open(&resolved.db)?;
    let session = store.session(name);
    let mut engine = Engine::new(config)?;
    engine.load_from(&session)?;

    match command {
        SessionCommand::Chat => {
            chat(&mut engine)?;
            engine.save_to(&session)?;
        }

        SessionCommand::Say { text, verbose } => {
            let exchange = engine.exchange(&text);
            println!("{}", exchange.response());
            if verbose {
                let r = &exchange.record;
                println!("  scores:    {}", r.scores);
                println!("  coherence: {:.4}", r.coherence);
                println!(
                    "  drift:     {:.4} (baseline {:.4})",
                    r.trajectory_drift, r.baseline_drift
                );
                println!("  curvature: {:.4}", r.curvature);
                println!("  gate:      {:?}", r.decision);
                if let Some(kernel) = &r.kernel {
                    println!("  kernel:    {kernel}");
                }
            }
            engine.proactive_review();
            engine.save_to(&session)?;
        }

        SessionCommand::Score { text } => {
            println!("{}", engine.score(&text));
        }

        SessionCommand::Review => {
            match engine.self_review() {
                Some(review) => println!("{review}\n"),
                None => println!("Nothing to review yet.\n"),
            }
            println!("{}", engine.summary());
            engine.save_to(&session)?;
        }

        SessionCommand::Summary => {
            println!("{}", engine.summary());
        }

        SessionCommand::Export { file } => {
            JsonFileStore::new(&file).save(&engine.snapshot())?;
            println!("Exported session \"{name}\" to {}", file.display());
        }

        SessionCommand::Import { file } => {
            if !engine.load_from(&JsonFileStore::new(&file))? {
                miette::bail!("no snapshot at {}", file.display());
            }
            engine.save_to(&session)?;
            println!("Imported {} into session \"{name}\"", file.display());
        }
    }

    Ok(())
}

fn chat(engine: &mut Engine) -> Result<()> {
    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    println!("{} is listening. Type /quit to leave.", engine.summary().identity);

    loop {
        print!("> ");
        stdout.flush().into_diagnostic()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line).into_diagnostic()? == 0 {
            break;
        }
        let input = line.trim();
        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/review" => match engine.self_review() {
                Some(review) => println!("{review}"),
                None => println!("Nothing to review yet."),
            },
            "/summary" => println!("{}", engine.summary()),
            _ => {
                let response = engine.process(input);
                println!("{}: {response}", engine.summary().identity);
                if engine.proactive_review() {
                    println!("(realigned after a run of low coherence)");
                }
            }
        }
    }
    Ok(())
}
