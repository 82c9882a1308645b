//! Interactive terminal front end for the Red Line trainer.
//!
//! Usage:
//!   redline [--utm-source=<s>] [--utm-campaign=<c>] [--ref=<r>]
//!
//! Commands (one per line on stdin):
//!   list                 - Show all scenarios
//!   show                 - Show the current scenario and its choices
//!   pick <n|id|title>    - Jump to a scenario
//!   next                 - Move to the next scenario
//!   choose <key>         - Submit a choice for the current scenario
//!   score                - Show the running score or how many answers remain
//!   role <role>          - Set your role (Student, Procurement, Finance, HR, Auditor, Other)
//!   region <region>      - Set your region (Europe, Asia, Africa, Americas, MENA, Oceania)
//!   export [path]        - Write your session as CSV
//!   share                - Print a share link
//!   help / quit

use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use anyhow::Result;
use rand::{rngs::StdRng, SeedableRng};
use serde_json::json;

use redline::config::Config;
use redline::logging::{log, obj, v_str, Domain, Level};
use redline::session::{AcquisitionTags, Region, Role, SessionState};
use redline::share::{build_share_url, ShareOrigin, ShareTags};
use redline::Trainer;

const APP_NAME: &str = "Red Line – Anti-Corruption Simulator";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    List,
    Show,
    Pick(String),
    Next,
    Choose(String),
    Score,
    Role(String),
    Region(String),
    Export(Option<PathBuf>),
    Share,
    Help,
    Quit,
    Unknown(String),
}

fn parse_command(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let (head, rest) = match line.split_once(char::is_whitespace) {
        Some((h, r)) => (h, r.trim()),
        None => (line, ""),
    };
    let cmd = match (head.to_lowercase().as_str(), rest) {
        ("list" | "ls", _) => Command::List,
        ("show", _) => Command::Show,
        ("pick", arg) if !arg.is_empty() => Command::Pick(arg.to_string()),
        ("next" | "n", _) => Command::Next,
        ("choose" | "c", arg) if !arg.is_empty() => Command::Choose(arg.to_uppercase()),
        ("score", _) => Command::Score,
        ("role", arg) if !arg.is_empty() => Command::Role(arg.to_string()),
        ("region", arg) if !arg.is_empty() => Command::Region(arg.to_string()),
        ("export", "") => Command::Export(None),
        ("export", arg) => Command::Export(Some(PathBuf::from(arg))),
        ("share", _) => Command::Share,
        ("help" | "?", _) => Command::Help,
        ("quit" | "exit" | "q", _) => Command::Quit,
        _ => Command::Unknown(line.to_string()),
    };
    Some(cmd)
}

fn parse_args(args: impl Iterator<Item = String>) -> AcquisitionTags {
    let mut tags = AcquisitionTags::default();
    for arg in args {
        if let Some(v) = arg.strip_prefix("--utm-source=") {
            tags.utm_source = v.to_string();
        } else if let Some(v) = arg.strip_prefix("--utm-campaign=") {
            tags.utm_campaign = v.to_string();
        } else if let Some(v) = arg.strip_prefix("--ref=") {
            tags.referrer = v.to_string();
        }
    }
    tags
}

fn print_help(out: &mut impl Write) -> io::Result<()> {
    writeln!(out, "Commands: list, show, pick <n|id|title>, next, choose <key>, score,")?;
    writeln!(out, "          role <role>, region <region>, export [path], share, help, quit")
}

fn show_current(out: &mut impl Write, trainer: &Trainer, session: &SessionState) -> io::Result<()> {
    match trainer.get_current(session) {
        Ok(d) => {
            writeln!(out)?;
            writeln!(out, "== {}", d.title)?;
            writeln!(out, "{}", d.context)?;
            writeln!(out)?;
            writeln!(out, "What would you do?")?;
            for label in d.choice_labels() {
                writeln!(out, "  {}", label)?;
            }
            Ok(())
        }
        Err(err) => writeln!(out, "! {}", err),
    }
}

fn pick(trainer: &Trainer, session: &mut SessionState, arg: &str) -> redline::error::Result<()> {
    if let Ok(n) = arg.parse::<usize>() {
        let id = n
            .checked_sub(1)
            .and_then(|i| trainer.catalog().get_all().get(i))
            .map(|d| d.id.clone())
            .ok_or_else(|| redline::TrainerError::InvalidSelection { id: arg.to_string() })?;
        trainer.select(session, &id)?;
    } else if trainer.catalog().index_of(arg).is_some() {
        trainer.select(session, arg)?;
    } else {
        trainer.select_by_title(session, arg)?;
    }
    Ok(())
}

fn main() -> Result<()> {
    let cfg = Config::from_env();
    let trainer = Trainer::from_config(&cfg)?;
    let mut rng = match cfg.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut session = trainer.start_session(&mut rng);
    session.profile.tags = parse_args(std::env::args().skip(1));

    log(
        Level::Info,
        Domain::System,
        "startup",
        obj(&[
            ("session_id", v_str(session.id().as_str())),
            ("min_responses", json!(trainer.policy().min_responses)),
            ("dilemmas", json!(trainer.catalog().len())),
        ]),
    );

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{}", APP_NAME)?;
    writeln!(out, "Choose an action in realistic scenarios. Get instant feedback and a score.")?;
    writeln!(out, "Training prototype – no legal advice.")?;
    writeln!(out, "Role: {} · Region: {}", session.profile.role, session.profile.region)?;
    print_help(&mut out)?;
    show_current(&mut out, &trainer, &session)?;

    let stdin = io::stdin();
    for line in stdin.lock().lines() {
        let line = line?;
        let Some(cmd) = parse_command(&line) else { continue };
        match cmd {
            Command::List => {
                let current = session.selection.current_id().map(str::to_string);
                for (i, d) in trainer.catalog().get_all().iter().enumerate() {
                    let marker = if current.as_deref() == Some(d.id.as_str()) { "*" } else { " " };
                    writeln!(out, "{} {}. {}", marker, i + 1, d.title)?;
                }
            }
            Command::Show => show_current(&mut out, &trainer, &session)?,
            Command::Pick(arg) => match pick(&trainer, &mut session, &arg) {
                Ok(()) => show_current(&mut out, &trainer, &session)?,
                Err(err) => writeln!(out, "! {}", err)?,
            },
            Command::Next => {
                trainer.advance(&mut session);
                show_current(&mut out, &trainer, &session)?;
            }
            Command::Choose(key) => {
                trainer.record_interaction(&mut session);
                match trainer.submit_current(&mut session, &key) {
                    Ok(outcome) => {
                        writeln!(out, "Feedback: {}", outcome.feedback)?;
                        writeln!(out, "{}", outcome.progress.message())?;
                        if !outcome.resources.is_empty() {
                            writeln!(out, "Learn more:")?;
                            for r in &outcome.resources {
                                writeln!(out, "  - {} <{}>", r.name, r.url)?;
                            }
                        }
                        writeln!(out, "Play another scenario with `next` or `pick`.")?;
                    }
                    Err(err) => writeln!(out, "! {}", err)?,
                }
            }
            Command::Score => writeln!(out, "{}", trainer.progress(&session).message())?,
            Command::Role(arg) => match arg.parse::<Role>() {
                Ok(role) => {
                    session.profile.role = role;
                    writeln!(out, "Role set to {}", role)?;
                }
                Err(err) => writeln!(out, "! {}", err)?,
            },
            Command::Region(arg) => match arg.parse::<Region>() {
                Ok(region) => {
                    session.profile.region = region;
                    writeln!(out, "Region set to {}", region)?;
                }
                Err(err) => writeln!(out, "! {}", err)?,
            },
            Command::Export(path) => {
                let path = path.unwrap_or_else(|| cfg.export_path.clone());
                match trainer.export_to_file(&session, &path) {
                    Ok(n) => writeln!(out, "Wrote {} rows to {}", n, path.display())?,
                    Err(err) => writeln!(out, "! export failed: {:#}", err)?,
                }
            }
            Command::Share => {
                let tags = ShareTags {
                    utm_source: cfg.utm_source.clone(),
                    utm_campaign: cfg.utm_campaign.clone(),
                };
                match ShareOrigin::from_base(&cfg.share_base).and_then(|o| build_share_url(&o, &tags)) {
                    Ok(url) => writeln!(out, "Share this experience: {}", url)?,
                    Err(err) => writeln!(out, "! {:#}", err)?,
                }
            }
            Command::Help => print_help(&mut out)?,
            Command::Quit => break,
            Command::Unknown(text) => writeln!(out, "! unknown command: {} (try `help`)", text)?,
        }
        out.flush()?;
    }

    log(
        Level::Info,
        Domain::System,
        "shutdown",
        obj(&[
            ("session_id", v_str(session.id().as_str())),
            ("responses", json!(session.responses().len())),
            ("progress", json!(trainer.progress(&session))),
        ]),
    );
    Ok(())
}
