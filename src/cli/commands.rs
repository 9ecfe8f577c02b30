use std::env;
use std::fmt::Write as _;
use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::Args;
use unicode_width::UnicodeWidthStr;

use crate::config::AppConfig;
use crate::contacts::Contact;
use crate::delivery::{dispatch, Delivery, DispatchEvent, DispatchReport};
use crate::message::normalize_message;
use crate::resolver::{
    is_raw_handle, parse_targets_message, rank_matches, resolve, resolve_with_handles,
};
use crate::storage::{RosterEntry, RosterStore};

const USAGE: &str = "usage: rostertui send [--list LIST] [--yes] [to] NAME... : MESSAGE";
const DEFAULT_LIST: &str = "all";

#[derive(Args, Debug, Clone)]
pub struct SendArgs {
    /// Roster to send from; a leading word naming a roster works too
    #[arg(long, short)]
    pub list: Option<String>,
    /// Send without asking for confirmation
    #[arg(long, short)]
    pub yes: bool,
    /// Recipients and message: `[to] NAME... : MESSAGE`
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    pub words: Vec<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Roster label or alias
    pub list: String,
}

/// ANSI styling for terminal output; every field is empty when colour is off.
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    bold: &'static str,
    dim: &'static str,
    head: &'static str,
    name: &'static str,
    number: &'static str,
    meta: &'static str,
    reset: &'static str,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        if !enabled {
            return Self::plain();
        }
        Self {
            bold: "\x1b[1m",
            dim: "\x1b[2m",
            head: "\x1b[95m",
            name: "\x1b[97m",
            number: "\x1b[36m",
            meta: "\x1b[90m",
            reset: "\x1b[0m",
        }
    }

    pub fn plain() -> Self {
        Self {
            bold: "",
            dim: "",
            head: "",
            name: "",
            number: "",
            meta: "",
            reset: "",
        }
    }

    pub fn detect() -> Self {
        Self::new(atty::is(atty::Stream::Stdout) && env::var_os("NO_COLOR").is_none())
    }
}

pub fn send(
    config: &AppConfig,
    store: &RosterStore,
    delivery: &dyn Delivery,
    args: SendArgs,
) -> Result<()> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_send(
        config,
        store,
        delivery,
        &args,
        &mut stdin.lock(),
        &mut stdout.lock(),
        Palette::detect(),
    )?;
    Ok(())
}

/// Resolves, previews, confirms and dispatches. Returns `None` when the
/// operator declines at the prompt.
pub fn run_send<R: BufRead, W: Write>(
    config: &AppConfig,
    store: &RosterStore,
    delivery: &dyn Delivery,
    args: &SendArgs,
    input: &mut R,
    out: &mut W,
    palette: Palette,
) -> Result<Option<DispatchReport>> {
    let p = palette;
    let (label, words) = split_list(store, args);
    let Some((tokens, message)) = parse_targets_message(&words.join(" ")) else {
        bail!("{USAGE}");
    };

    let entry = store.find(&label).unwrap_or_else(|| RosterEntry {
        path: store.path_for(&label),
        label: label.clone(),
    });
    let contacts = store
        .load(&entry)
        .with_context(|| format!("loading roster {}", entry.label))?;
    let message = normalize_message(&message);
    let resolution = resolve_with_handles(&tokens, &contacts);

    if resolution.is_empty() {
        writeln!(out, "No recipients matched.")?;
        if !resolution.missing.is_empty() {
            writeln!(out, "Unmatched: {}", resolution.missing.join(", "))?;
        }
        bail!("no recipients matched");
    }

    let file_name = entry
        .path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    writeln!(
        out,
        "{}{}List:{} {}{}{}  {}|{}  {}CSV:{} {}",
        p.bold, p.head, p.reset, p.bold, entry.label, p.reset, p.meta, p.reset, p.head, p.reset,
        file_name
    )?;
    writeln!(
        out,
        "{}Recipients ({}):{}",
        p.meta,
        resolution.resolved.len(),
        p.reset
    )?;
    out.write_all(recipient_table(&resolution.resolved, p).as_bytes())?;

    for note in ambiguity_notes(&tokens, &contacts) {
        writeln!(out, "{}{note}{}", p.meta, p.reset)?;
    }
    if !resolution.missing.is_empty() {
        writeln!(
            out,
            "\n{}Unmatched (ignored): {}{}",
            p.meta,
            resolution.missing.join(", "),
            p.reset
        )?;
    }
    writeln!(out, "\n{}Message:{}\n", p.head, p.reset)?;
    writeln!(out, "{message}\n")?;

    if !args.yes && !confirm(input, out)? {
        writeln!(out, "Canceled.")?;
        return Ok(None);
    }
    delivery.check_ready()?;

    writeln!(
        out,
        "\nSending {} message(s)...",
        resolution.resolved.len()
    )?;
    let mut write_error = None;
    let report = dispatch(
        &resolution.resolved,
        &message,
        delivery,
        config.delivery.pause(),
        |event| {
            let result = match event {
                DispatchEvent::Started { contact, .. } => {
                    write!(out, "  -> {} ... ", contact.name).and_then(|_| out.flush())
                }
                DispatchEvent::Finished { result, .. } => {
                    writeln!(out, "{}", if result.outcome.ok { "✔" } else { "✖" })
                }
            };
            if let Err(err) = result {
                write_error.get_or_insert(err);
            }
        },
    );
    if let Some(err) = write_error {
        return Err(err).context("writing progress");
    }

    writeln!(
        out,
        "\nDone. Sent: {}  |  Failed: {}  |  {}",
        report.sent(),
        report.failed(),
        report.finished_clock()
    )?;
    let failed = report.failed_names();
    if !failed.is_empty() {
        writeln!(out, "Failed: {}", failed.join(", "))?;
    }
    Ok(Some(report))
}

pub fn lists(store: &RosterStore) -> Result<()> {
    print!("{}", format_lists(store));
    Ok(())
}

pub fn show(store: &RosterStore, args: ShowArgs) -> Result<()> {
    let entry = store
        .find(&args.list)
        .with_context(|| format!("no roster named {}", args.list))?;
    let contacts = store.load(&entry)?;
    print!("{}", format_roster(&contacts));
    Ok(())
}

/// Explicit `--list` wins; otherwise a first word naming a roster selects it.
fn split_list(store: &RosterStore, args: &SendArgs) -> (String, Vec<String>) {
    if let Some(list) = &args.list {
        return (list.clone(), args.words.clone());
    }
    if let Some((first, rest)) = args.words.split_first() {
        let known = store
            .entries()
            .into_iter()
            .find(|entry| entry.label.eq_ignore_ascii_case(first));
        if let Some(entry) = known {
            if !rest.is_empty() && !first.contains(':') {
                return (entry.label, rest.to_vec());
            }
        }
    }
    (DEFAULT_LIST.to_string(), args.words.clone())
}

fn confirm<R: BufRead, W: Write>(input: &mut R, out: &mut W) -> Result<bool> {
    write!(out, "Press Enter to send; anything else cancels... ")?;
    out.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer).context("reading confirmation")?;
    Ok(answer.trim().is_empty() && !answer.is_empty())
}

/// Tokens that matched more than one contact, naming the runners-up.
fn ambiguity_notes(tokens: &[String], contacts: &[Contact]) -> Vec<String> {
    if tokens.iter().any(|token| token.eq_ignore_ascii_case("all")) {
        return Vec::new();
    }
    let mut notes = Vec::new();
    for token in tokens.iter().filter(|token| !is_raw_handle(token)) {
        let Some(chosen) = resolve(std::slice::from_ref(token), contacts)
            .resolved
            .into_iter()
            .next()
        else {
            continue;
        };
        let others: Vec<&str> = rank_matches(token, contacts)
            .into_iter()
            .map(|(_, contact)| contact)
            .filter(|contact| contact.number != chosen.number)
            .take(3)
            .map(|contact| contact.name.as_str())
            .collect();
        if !others.is_empty() {
            notes.push(format!(
                "note: \"{token}\" -> {}; also matches {}",
                chosen.name,
                others.join(", ")
            ));
        }
    }
    notes
}

fn recipient_table(resolved: &[Contact], p: Palette) -> String {
    let idx_w = resolved.len().to_string().len();
    let name_w = resolved
        .iter()
        .map(|contact| contact.name.width())
        .max()
        .unwrap_or(4)
        .max(4);
    let num_w = resolved
        .iter()
        .map(|contact| contact.number.len())
        .max()
        .unwrap_or(6)
        .max(6);

    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        "{} {:>idx_w$}  {}  {:>num_w$} {}",
        p.meta,
        "#",
        pad("Name", name_w),
        "Number",
        p.reset
    );
    for (i, contact) in resolved.iter().enumerate() {
        let _ = writeln!(
            &mut out,
            " {}{:>idx_w$}{}  {}{}{}{}  {}{:>num_w$}{}",
            p.dim,
            i + 1,
            p.reset,
            p.bold,
            p.name,
            pad(&contact.name, name_w),
            p.reset,
            p.number,
            contact.number,
            p.reset
        );
    }
    out
}

fn format_lists(store: &RosterStore) -> String {
    let entries = store.entries();
    let label_w = entries
        .iter()
        .map(|entry| entry.label.width())
        .max()
        .unwrap_or(0);
    let mut out = String::new();
    for entry in entries {
        let status = match store.load(&entry) {
            Ok(contacts) => format!("{} contact(s)", contacts.len()),
            Err(err) => err.to_string(),
        };
        let _ = writeln!(&mut out, "{}  {status}", pad(&entry.label, label_w));
    }
    out
}

fn format_roster(contacts: &[Contact]) -> String {
    if contacts.is_empty() {
        return "(empty roster)\n".to_string();
    }
    let name_w = contacts
        .iter()
        .map(|contact| contact.name.width())
        .max()
        .unwrap_or(0)
        .max(4);
    let num_w = contacts
        .iter()
        .map(|contact| contact.number.len())
        .max()
        .unwrap_or(0)
        .max(6);
    let mut out = String::new();
    let _ = writeln!(
        &mut out,
        "{}  {}  Aliases",
        pad("Name", name_w),
        pad("Number", num_w)
    );
    for contact in contacts {
        let _ = writeln!(
            &mut out,
            "{}  {}  {}",
            pad(&contact.name, name_w),
            pad(&contact.number, num_w),
            contact.aliases_joined(", ")
        );
    }
    out.lines()
        .map(|line| format!("{}\n", line.trim_end()))
        .collect()
}

/// Left-aligns by display width, which `format!` padding does not account for.
fn pad(text: &str, width: usize) -> String {
    let used = text.width();
    format!("{text}{}", " ".repeat(width.saturating_sub(used)))
}
