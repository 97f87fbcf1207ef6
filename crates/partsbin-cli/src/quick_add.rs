//! `partsbin quick-add`: runs the whole wizard non-interactively.

use std::fmt::Write as _;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Args;
use partsbin_client::InventoryClient;
use partsbin_core::{AppConfig, SearchCandidate};
use partsbin_quickadd::{
    CommitReport, FormField, JsonFilePreferences, QuickAddError, QuickAddSession,
};

#[derive(Debug, Args)]
pub struct QuickAddArgs {
    /// Free-text part search
    pub query: String,

    /// Which search result to use (1-based)
    #[arg(long, default_value_t = 1)]
    pub pick: usize,

    /// Stock location id; defaults to the last location used
    #[arg(long)]
    pub location: Option<i64>,

    #[arg(long)]
    pub quantity: Option<String>,

    #[arg(long = "min-quantity")]
    pub min_quantity: Option<String>,

    /// Unit price; omit to leave it unset
    #[arg(long)]
    pub price: Option<String>,

    /// Override the part name taken from the search result
    #[arg(long)]
    pub name: Option<String>,

    /// Image suggestion to attach (1-based, repeatable)
    #[arg(long = "image")]
    pub images: Vec<usize>,

    /// Image search query, if the part number finds nothing useful.
    /// Only meaningful together with --image.
    #[arg(long = "image-query", requires = "images")]
    pub image_query: Option<String>,

    /// Specification value, repeatable: --set "Package=DIP-8"
    #[arg(long = "set", value_parser = parse_spec_assignment)]
    pub specs: Vec<(String, String)>,
}

/// Runs search → select → confirm → commit and prints the outcome.
///
/// A partial image failure still exits non-zero so scripts notice it.
///
/// # Errors
///
/// Returns an error for failed searches, out-of-range picks, validation
/// failures and a rejected create.
pub async fn run(
    client: InventoryClient,
    config: &AppConfig,
    args: QuickAddArgs,
) -> anyhow::Result<ExitCode> {
    let prefs = JsonFilePreferences::new(&config.prefs_path);
    let mut session = QuickAddSession::new(Arc::new(client), prefs);

    let found = session.search(&args.query).await?;
    if found == 0 {
        anyhow::bail!("no parts found for \"{}\"", args.query);
    }
    let index = args
        .pick
        .checked_sub(1)
        .filter(|i| *i < found)
        .with_context(|| format!("--pick must be between 1 and {found}"))?;
    session.select(index).await?;

    let confirm = session
        .wizard()
        .confirm()
        .context("wizard did not enter the confirmation step")?;
    println!("{}", describe_candidate(args.pick, confirm.candidate()));
    if let Some(message) = confirm.directory_error() {
        eprintln!("warning: {message}");
    }

    apply_overrides(&mut session, &args)?;

    if !args.images.is_empty() {
        if let Some(query) = &args.image_query {
            session.search_images(query)?;
        }
        let wait = Duration::from_secs(config.request_timeout_secs.saturating_add(5));
        if tokio::time::timeout(wait, session.wait_for_images()).await.is_err() {
            anyhow::bail!("timed out waiting for image suggestions");
        }
        select_images(&mut session, &args.images)?;
    }

    let result = match session.submit().await {
        Ok(result) => result,
        Err(QuickAddError::ValidationFailed(errors)) => {
            for e in &errors {
                eprintln!("  {e}");
            }
            if errors.iter().any(|e| e.field == FormField::Location) {
                eprintln!("{}", list_locations(&session));
            }
            anyhow::bail!("{} field(s) need attention", errors.len());
        }
        Err(e) => return Err(e.into()),
    };

    let report = result.report();
    println!("{}", report.summary());
    for outcome in &result.image_outcomes {
        match &outcome.error {
            None => println!("  attached {}", outcome.url),
            Some(error) => println!("  FAILED   {} ({error})", outcome.url),
        }
    }
    Ok(match report {
        CommitReport::Complete { .. } => ExitCode::SUCCESS,
        CommitReport::Partial { .. } => ExitCode::from(2),
    })
}

fn apply_overrides(
    session: &mut QuickAddSession<InventoryClient, JsonFilePreferences>,
    args: &QuickAddArgs,
) -> anyhow::Result<()> {
    let wizard = session.wizard_mut();
    if let Some(id) = args.location {
        wizard.set_field(FormField::Location, id.to_string())?;
    }
    let fields = [
        (FormField::Name, &args.name),
        (FormField::Quantity, &args.quantity),
        (FormField::MinimumQuantity, &args.min_quantity),
        (FormField::UnitPrice, &args.price),
    ];
    for (field, value) in fields {
        if let Some(value) = value {
            wizard.set_field(field, value.clone())?;
        }
    }
    for (name, value) in &args.specs {
        wizard
            .set_spec_value(name, value.clone())
            .with_context(|| format!("--set {name}={value}"))?;
    }
    Ok(())
}

fn select_images(
    session: &mut QuickAddSession<InventoryClient, JsonFilePreferences>,
    picks: &[usize],
) -> anyhow::Result<()> {
    let urls: Vec<String> = session
        .wizard()
        .visible_suggestions()
        .iter()
        .map(|s| s.url.clone())
        .collect();
    for &pick in picks {
        let url = pick
            .checked_sub(1)
            .and_then(|i| urls.get(i))
            .with_context(|| format!("--image {pick}: only {} suggestion(s) available", urls.len()))?;
        if !session.wizard().confirm().is_some_and(|c| c.is_selected(url)) {
            session.wizard_mut().toggle_image(url)?;
        }
    }
    Ok(())
}

fn list_locations(session: &QuickAddSession<InventoryClient, JsonFilePreferences>) -> String {
    let mut out = String::from("available locations:");
    for location in session
        .wizard()
        .confirm()
        .map(|c| c.locations())
        .unwrap_or_default()
    {
        let _ = write!(out, "\n  {:>4}  {}", location.id, location.name);
    }
    out
}

/// One search result as printed by `search` and `quick-add`.
pub fn describe_candidate(position: usize, candidate: &SearchCandidate) -> String {
    let mut line = format!("{position:>2}. {}", candidate.mpn);
    if let Some(manufacturer) = &candidate.manufacturer {
        let _ = write!(line, " ({manufacturer})");
    }
    if let Some(description) = &candidate.short_description {
        let _ = write!(line, " - {description}");
    }
    for spec in &candidate.specs {
        let _ = write!(line, "\n      {spec}");
    }
    line
}

/// Parses `NAME=VALUE`; the value may itself contain `=`.
fn parse_spec_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got \"{raw}\""))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing specification name in \"{raw}\""));
    }
    Ok((name.to_owned(), value.trim().to_owned()))
}
