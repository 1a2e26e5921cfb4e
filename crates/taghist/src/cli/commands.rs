use super::render::{self, InfoView};
use super::setup::{parse_cli, AddArgs, Cli, Commands, FindArgs, RollbackArgs};
use anyhow::{bail, Context, Result};
use chrono::Utc;
use std::path::PathBuf;
use taghistory::config::TagHistConfig;
use taghistory::{Backend, History, Tag, TagStore};
use tracing_subscriber::EnvFilter;

type DynHistory = History<Box<dyn TagStore>>;

/// Resolved store location after merging config and flags.
struct Target {
    database: PathBuf,
    backend: Backend,
}

impl Target {
    fn open(&self, writable: bool) -> Result<DynHistory> {
        let store = self
            .backend
            .open(&self.database, writable)
            .with_context(|| format!("opening {}", self.database.display()))?;
        Ok(History::new(store))
    }
}

pub fn run() -> Result<()> {
    let cli = parse_cli();
    init_tracing(cli.verbose);

    let cwd = std::env::current_dir().context("reading working directory")?;
    let config = TagHistConfig::load(&cwd)?;
    let target = resolve_target(&cli, config);
    tracing::debug!(
        database = %target.database.display(),
        backend = %target.backend,
        "resolved history store"
    );

    match cli.command {
        Commands::Create { fqrn } => handle_create(&target, &fqrn),
        Commands::Info => handle_info(&target),
        Commands::List { json } => handle_list(&target, json),
        Commands::Add(args) => handle_add(&target, args),
        Commands::Remove { names } => handle_remove(&target, &names),
        Commands::Rollback(args) => handle_rollback(&target, args),
        Commands::Find(args) => handle_find(&target, args),
        Commands::Channels => handle_channels(&target),
        Commands::Referenced => handle_referenced(&target),
        Commands::SetPrevious { hash } => handle_set_previous(&target, &hash),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_env("TAGHIST_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    // A subscriber may already be installed when running under a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn resolve_target(cli: &Cli, config: TagHistConfig) -> Target {
    Target {
        database: cli.database.clone().unwrap_or(config.database),
        backend: cli.backend.unwrap_or(config.backend),
    }
}

fn handle_create(target: &Target, fqrn: &str) -> Result<()> {
    target
        .backend
        .create(&target.database, fqrn)
        .with_context(|| format!("creating {}", target.database.display()))?;
    print!(
        "{}",
        render::render_success(&format!(
            "Created {} history for {} at {}",
            target.backend,
            fqrn,
            target.database.display()
        ))
    );
    Ok(())
}

fn handle_info(target: &Target) -> Result<()> {
    let history = target.open(false)?;
    let tags = history.tags()?;
    let store = history.store();
    let info = InfoView {
        fqrn: store.fqrn(),
        path: store.path(),
        writable: store.is_writable(),
        tags: store.number_of_tags()?,
        previous_revision: store.previous_revision()?,
        head: tags.head(),
    };
    print!("{}", render::render_info(&info));
    Ok(())
}

fn handle_list(target: &Target, json: bool) -> Result<()> {
    let tags = target.open(false)?.tags()?;
    if json {
        println!("{}", serde_json::to_string_pretty(tags.tags())?);
    } else {
        print!("{}", render::render_tag_table(&tags));
    }
    Ok(())
}

fn handle_add(target: &Target, args: AddArgs) -> Result<()> {
    let mut history = target.open(true)?;
    let revision = match args.revision {
        Some(revision) => revision,
        None => history.next_revision()?,
    };
    let tag = Tag::new(
        args.name,
        args.hash,
        args.size,
        revision,
        args.timestamp.unwrap_or_else(Utc::now),
        args.channel,
        args.description,
    );
    let message = format!(
        "Tagged revision {} as {} ({})",
        tag.revision,
        tag.name,
        tag.channel_name()
    );
    history.add_tag(tag)?;
    print!("{}", render::render_success(&message));
    Ok(())
}

fn handle_remove(target: &Target, names: &[String]) -> Result<()> {
    let mut history = target.open(true)?;
    let removed = history.remove_tags(names)?;
    for name in names {
        if removed.contains(name) {
            print!("{}", render::render_success(&format!("Removed {}", name)));
        } else {
            print!("{}", render::render_warning(&format!("No tag named {}", name)));
        }
    }
    Ok(())
}

fn handle_rollback(target: &Target, args: RollbackArgs) -> Result<()> {
    let mut history = target.open(true)?;
    let dropped = match (args.revision, args.tag) {
        (Some(revision), _) => history.rollback(revision)?,
        (None, Some(name)) => match history.rollback_to(&name)? {
            Some(dropped) => dropped,
            None => bail!("no tag named {}", name),
        },
        (None, None) => bail!("a revision or --tag is required"),
    };
    if dropped.is_empty() {
        print!("{}", render::render_warning("Nothing to roll back"));
    }
    for tag in &dropped {
        print!(
            "{}",
            render::render_success(&format!(
                "Discarded {} (revision {})",
                tag.name, tag.revision
            ))
        );
    }
    Ok(())
}

fn handle_find(target: &Target, args: FindArgs) -> Result<()> {
    let tags = target.open(false)?.tags()?;
    let found = if let Some(name) = &args.name {
        tags.find_tag(name)
    } else if let Some(date) = args.date {
        tags.find_tag_by_date(date)
    } else if let Some(revision) = args.revision {
        tags.find_revision(revision)
    } else if let Some(hash) = &args.hash {
        tags.find_hash(hash)
    } else {
        bail!("one of --name, --date, --revision or --hash is required");
    };
    match found {
        Some(tag) => print!("{}", render::render_tag_detail(tag)),
        None => bail!("no matching tag"),
    }
    Ok(())
}

fn handle_channels(target: &Target) -> Result<()> {
    let tops = target.open(false)?.channel_tops()?;
    print!("{}", render::render_channels(&tops));
    Ok(())
}

fn handle_referenced(target: &Target) -> Result<()> {
    for hash in target.open(false)?.referenced_hashes()? {
        println!("{}", hash);
    }
    Ok(())
}

fn handle_set_previous(target: &Target, hash: &taghistory::RootHash) -> Result<()> {
    let mut history = target.open(true)?;
    history.set_previous_revision(hash)?;
    print!(
        "{}",
        render::render_success(&format!("Previous revision set to {}", hash))
    );
    Ok(())
}
