use std::path::PathBuf;

use anyhow::{Result, bail};
use bwbind::{Field, ListFilters, ObjectKind, ScopedSession, Session, SessionConfig};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string()))
        .init();

    // Reset SIGPIPE to default so piping output to `head` etc. exits cleanly
    // instead of panicking with "broken pipe".
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (opts, rest) = split_opts(&args)?;
    let cmd = rest.first().map(String::as_str).unwrap_or("help");

    match cmd {
        "get" => cmd_get(&opts, &rest[1..]),
        "item" => cmd_item(&opts, &rest[1..]),
        "template" => cmd_template(&opts, &rest[1..]),
        "list" => cmd_list(&opts, &rest[1..]),
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        other => {
            eprintln!("unknown command: {other}");
            print_help();
            std::process::exit(1);
        }
    }
}

fn print_help() {
    println!(
        "\
bwbind - session-scoped Bitwarden CLI wrapper

USAGE:
    bwbind [options] <command> [args...]

COMMANDS:
    get <field> <search>                Print one field of a matching item
                                        (fields: username, password, uri, totp,
                                        notes via item, ...)
    item <search>                       Print a matching item as JSON
    template <kind>                     Print an object template as JSON
                                        (e.g. item, item.login, folder)
    list <kind> [filters...]            Print matching objects as a JSON array
                                        (kinds: items, folders, collections,
                                        organizations, org-collections, org-members)
    help                                Show this help

OPTIONS:
    --user <email>                      Account to log in as (required)
    --bw <path>                         Path to the bw executable (default: PATH)
    --askpass <path>                    Password prompt program (default: $SSH_ASKPASS)

LIST FILTERS:
    --search <term>   --url <url>   --folder <id>
    --collection <id> --org <id>    --trash

NOTES:
    The master password is taken from the BWBIND_PASSWORD environment
    variable when set; otherwise the askpass program is launched. Every
    run performs a fresh login and logs out again on exit, even when
    the command fails."
    );
}

#[derive(Debug, Default)]
struct Opts {
    username: Option<String>,
    executable: Option<PathBuf>,
    askpass: Option<PathBuf>,
}

/// Split global `--flag value` options from the command words.
fn split_opts(args: &[String]) -> Result<(Opts, Vec<String>)> {
    let mut opts = Opts::default();
    let mut rest = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--user" => opts.username = Some(required_value(&mut iter, "--user")?),
            "--bw" => opts.executable = Some(required_value(&mut iter, "--bw")?.into()),
            "--askpass" => opts.askpass = Some(required_value(&mut iter, "--askpass")?.into()),
            _ => rest.push(arg.clone()),
        }
    }
    Ok((opts, rest))
}

fn required_value(iter: &mut std::slice::Iter<'_, String>, flag: &str) -> Result<String> {
    match iter.next() {
        Some(value) => Ok(value.clone()),
        None => bail!("{flag} requires a value"),
    }
}

/// Build the session config and log in; the returned guard logs out on
/// every exit path.
fn open_session(opts: &Opts) -> Result<ScopedSession> {
    let Some(username) = &opts.username else {
        bail!("--user is required (the account email to log in as)");
    };
    let mut config = SessionConfig::new(username.as_str());
    if let Ok(password) = std::env::var("BWBIND_PASSWORD") {
        config = config.with_password(password);
    }
    if let Some(path) = &opts.executable {
        config = config.with_executable(path);
    }
    if let Some(path) = &opts.askpass {
        config = config.with_prompt_program(path);
    }
    Ok(Session::open(config)?)
}

/// Log out explicitly so a failure is visible, not just a warn log.
fn close_session(scoped: ScopedSession) -> Result<()> {
    let (_session, result) = scoped.finish();
    result.map_err(Into::into)
}

fn cmd_get(opts: &Opts, args: &[String]) -> Result<()> {
    let [field, search] = args else {
        bail!("usage: bwbind get <field> <search>");
    };
    let Some(field) = Field::parse(field) else {
        bail!("unknown field `{field}`");
    };

    let session = open_session(opts)?;
    let value = session.get(field, search)?;
    println!("{value}");
    close_session(session)
}

fn cmd_item(opts: &Opts, args: &[String]) -> Result<()> {
    let [search] = args else {
        bail!("usage: bwbind item <search>");
    };

    let session = open_session(opts)?;
    let item = session.get_item(search)?;
    println!("{}", serde_json::to_string_pretty(&item)?);
    close_session(session)
}

fn cmd_template(opts: &Opts, args: &[String]) -> Result<()> {
    let [kind] = args else {
        bail!("usage: bwbind template <kind>");
    };

    let session = open_session(opts)?;
    let template = session.get_template(kind)?;
    println!("{}", serde_json::to_string_pretty(&template)?);
    close_session(session)
}

fn cmd_list(opts: &Opts, args: &[String]) -> Result<()> {
    let Some(kind) = args.first() else {
        bail!("usage: bwbind list <kind> [filters...]");
    };
    let Some(kind) = ObjectKind::parse(kind) else {
        bail!("unknown object kind `{kind}`");
    };
    let filters = parse_filters(&args[1..])?;

    let session = open_session(opts)?;
    let objects = session.list(kind, &filters)?;
    println!("{}", serde_json::to_string_pretty(&objects)?);
    close_session(session)
}

fn parse_filters(args: &[String]) -> Result<ListFilters> {
    let mut filters = ListFilters::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--search" => filters = filters.search(required_value(&mut iter, "--search")?),
            "--url" => filters = filters.url(required_value(&mut iter, "--url")?),
            "--folder" => filters = filters.folder_id(required_value(&mut iter, "--folder")?),
            "--collection" => {
                filters = filters.collection_id(required_value(&mut iter, "--collection")?)
            }
            "--org" => filters = filters.organization_id(required_value(&mut iter, "--org")?),
            "--trash" => filters = filters.trash(true),
            other => bail!("unknown list filter: {other}"),
        }
    }
    Ok(filters)
}
