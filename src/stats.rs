use crate::author::parse_author_spec;
use crate::cli::{CommonArgs, RunArgs};
use crate::error::Result;
use crate::model::{
    ContributionRow, ContributionTriple, DateWindow, RepositorySelection, RunOutput, SCHEMA_VERSION,
};
use crate::observer::ProgressReporter;
use crate::orchestrator::{Orchestrator, RunRequest, RunResult};
use crate::settings::{
    get_list, load_repositories, set_list, ConfigStore, SettingsStore, FORM_AUTHORS, FORM_EXCLUSIONS,
    FORM_FLAGS, FORM_SINCE, FORM_UNTIL,
};
use crate::tool::ExternalTool;
use anyhow::Context;
use chrono::Utc;
use console::style;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq)]
struct RunForm {
    authors: String,
    since: String,
    until: String,
    exclusions: Vec<String>,
    flags: Vec<String>,
}

impl RunForm {
    fn resolve(store: &dyn ConfigStore, args: &RunArgs) -> Result<Self> {
        let text = |given: &Option<String>, key: &str| -> Result<String> {
            match given {
                Some(v) => Ok(v.clone()),
                None => Ok(store.get(key)?.unwrap_or_default()),
            }
        };
        let list = |given: &[String], key: &str| -> Result<Vec<String>> {
            if given.is_empty() {
                get_list(store, key)
            } else {
                Ok(given
                    .iter()
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .collect())
            }
        };

        Ok(Self {
            authors: text(&args.authors, FORM_AUTHORS)?,
            since: text(&args.since, FORM_SINCE)?,
            until: text(&args.until, FORM_UNTIL)?,
            exclusions: list(&args.exclusions, FORM_EXCLUSIONS)?,
            flags: list(&args.flags, FORM_FLAGS)?,
        })
    }

    fn save(&self, store: &mut dyn ConfigStore) -> Result<()> {
        store.set(FORM_AUTHORS, &self.authors)?;
        store.set(FORM_SINCE, &self.since)?;
        store.set(FORM_UNTIL, &self.until)?;
        set_list(store, FORM_EXCLUSIONS, &self.exclusions)?;
        set_list(store, FORM_FLAGS, &self.flags)
    }
}

pub async fn exec(common: &CommonArgs, args: RunArgs) -> anyhow::Result<()> {
    let mut store = SettingsStore::open(common.settings.as_ref()).context("Failed to open settings")?;

    let form = RunForm::resolve(&store, &args).context("Failed to read saved run settings")?;
    let window = DateWindow::parse(&form.since, &form.until).context("Invalid date window")?;
    let authors = parse_author_spec(&form.authors);

    let repositories: Vec<RepositorySelection> = if args.repos.is_empty() {
        load_repositories(&store).context("Failed to load repository list")?
    } else {
        args.repos.iter().map(RepositorySelection::included).collect()
    };
    debug!("Repositories: {:?}", repositories);

    let tool = ExternalTool::locate(args.shell.as_deref(), args.git.as_deref())
        .context("Failed to locate the external log tool")?;

    let request = RunRequest {
        repositories,
        authors,
        window,
        exclusions: form.exclusions.clone(),
        extra_flags: form.flags.clone(),
    };

    let machine_output = args.json || args.ndjson;
    let reporter = Arc::new(ProgressReporter::new(!machine_output && !common.quiet));
    let handle = Orchestrator::new(tool)
        .with_timeout(args.timeout)
        .with_jobs(args.jobs)
        .spawn(request, reporter);

    let cancel = handle.cancellation_token();
    let interrupt = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupted; abandoning run");
            cancel.cancel();
        }
    });
    let result = handle.join().await;
    interrupt.abort();
    let result = result.context("Contribution run failed")?;

    // only a run the engine accepted replaces the remembered fields
    if !args.no_save {
        form.save(&mut store).context("Failed to remember run settings")?;
    }

    if args.json {
        output_json(&result)?;
    } else if args.ndjson {
        output_ndjson(&result)?;
    } else {
        output_table(&result);
    }

    Ok(())
}

fn run_output(result: &RunResult) -> RunOutput {
    RunOutput {
        version: SCHEMA_VERSION,
        generated_at: Utc::now(),
        since: result.window.since_arg(),
        until: result.window.until_arg(),
        authors: result.authors.clone(),
        repositories: result.aggregate.per_repository.clone(),
        totals: result.aggregate.totals.clone(),
        pairs_total: result.pairs_total,
        pairs_skipped: result.pairs_skipped,
    }
}

fn rows(result: &RunResult) -> Vec<ContributionRow> {
    result
        .aggregate
        .per_repository
        .iter()
        .flat_map(|repo| {
            repo.authors.iter().map(|a| ContributionRow {
                repository: repo.repository.clone(),
                author: a.author.clone(),
                stats: a.stats,
            })
        })
        .collect()
}

fn output_json(result: &RunResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&run_output(result))?);
    Ok(())
}

fn output_ndjson(result: &RunResult) -> anyhow::Result<()> {
    for row in rows(result) {
        println!("{}", serde_json::to_string(&row)?);
    }
    Ok(())
}

fn output_table(result: &RunResult) {
    println!(
        "Contributions from {} to {}",
        result.window.since_arg(),
        result.window.until_arg()
    );

    for repo in &result.aggregate.per_repository {
        println!("\n{}", style(&repo.repository).bold());
        print_header();
        for group in &result.authors {
            print_line(&group.display_name, repo.get(&group.display_name));
        }
    }

    println!("\n{}", style("Totals").bold());
    print_header();
    for total in &result.aggregate.totals {
        print_line(&total.author, Some(&total.stats));
    }

    if let Some(note) = skipped_note(result) {
        println!("\n{note}");
    }
}

fn skipped_note(result: &RunResult) -> Option<String> {
    if result.pairs_skipped == 0 {
        return None;
    }
    Some(format!(
        "{} of {} queries produced no result (no matching commits, or a failed query; rerun with -vv for details)",
        style(result.pairs_skipped).yellow(),
        result.pairs_total
    ))
}

fn print_header() {
    println!(
        "{:<30} {:>10} {:>10} {:>10}",
        style("Author").bold(),
        style("Added").bold(),
        style("Removed").bold(),
        style("Net").bold()
    );
    println!("{}", "─".repeat(63));
}

fn print_line(author: &str, stats: Option<&ContributionTriple>) {
    match stats {
        Some(t) => println!("{:<30} {:>10} {:>10} {:>10}", author, t.added, t.removed, t.net),
        None => println!("{:<30} {:>10} {:>10} {:>10}", author, "-", "-", "-"),
    }
}
