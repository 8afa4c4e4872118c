use crate::aggregate::{AggregateState, Aggregator};
use crate::error::{ContribError, Result};
use crate::model::{AuthorGroup, ContributionTriple, DateWindow, RepositorySelection};
use crate::numstat::{parse_triple, InvalidResult};
use crate::observer::RunObserver;
use crate::query::LogQuery;
use crate::runner::{ProcessRunner, RunnerFailure, DEFAULT_TIMEOUT};
use crate::tool::ExternalTool;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub repositories: Vec<RepositorySelection>,
    pub authors: Vec<AuthorGroup>,
    pub window: DateWindow,
    pub exclusions: Vec<String>,
    pub extra_flags: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RunResult {
    pub window: DateWindow,
    pub authors: Vec<AuthorGroup>,
    pub aggregate: AggregateState,
    pub pairs_total: usize,
    pub pairs_skipped: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PairFailure {
    #[error(transparent)]
    Runner(#[from] RunnerFailure),
    #[error(transparent)]
    Invalid(#[from] InvalidResult),
}

#[derive(Debug, Clone)]
struct Pair {
    repository: String,
    path: PathBuf,
    author: String,
    aliases: Vec<String>,
}

impl Pair {
    fn label(&self) -> String {
        format!("{} / {}", self.repository, self.author)
    }
}

#[derive(Debug)]
struct RunPlan {
    repositories: Vec<String>,
    pairs: Vec<Pair>,
}

impl RunPlan {
    fn prepare(request: &RunRequest) -> Result<Self> {
        if request.authors.is_empty() {
            return Err(ContribError::config("no authors given"));
        }

        let mut names = HashSet::new();
        for group in &request.authors {
            if !names.insert(group.display_name.as_str()) {
                return Err(ContribError::Config(format!(
                    "author '{}' starts more than one group",
                    group.display_name
                )));
            }
        }

        let mut seen = HashSet::new();
        let mut repositories = Vec::new();
        for selection in request.repositories.iter().filter(|r| r.included) {
            if !selection.path.is_dir() {
                debug!("Skipping missing repository {}", selection.path.display());
                continue;
            }
            let key = selection
                .path
                .canonicalize()
                .unwrap_or_else(|_| selection.path.clone());
            if seen.insert(key) {
                repositories.push(selection);
            } else {
                debug!("Skipping duplicate repository {}", selection.path.display());
            }
        }
        if repositories.is_empty() {
            return Err(ContribError::config("no existing repositories selected"));
        }

        let pairs = repositories
            .iter()
            .flat_map(|selection| {
                request.authors.iter().map(move |group| Pair {
                    repository: selection.display_name(),
                    path: selection.path.clone(),
                    author: group.display_name.clone(),
                    aliases: group.aliases.clone(),
                })
            })
            .collect();

        Ok(Self {
            repositories: repositories.iter().map(|r| r.display_name()).collect(),
            pairs,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Orchestrator {
    tool: ExternalTool,
    timeout: Duration,
    jobs: usize,
    state: RunState,
}

impl Orchestrator {
    pub fn new(tool: ExternalTool) -> Self {
        Self {
            tool,
            timeout: DEFAULT_TIMEOUT,
            jobs: 1,
            state: RunState::Idle,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Invalid input fails with [`ContribError::Config`] before any pair starts.
    pub async fn run(
        &mut self,
        request: &RunRequest,
        observer: &dyn RunObserver,
        cancel: &CancellationToken,
    ) -> Result<RunResult> {
        let plan = RunPlan::prepare(request)?;

        self.state = RunState::Running;
        let result = self.execute(plan, request, observer, cancel).await;
        self.state = RunState::Idle;
        result
    }

    pub fn spawn(mut self, request: RunRequest, observer: Arc<dyn RunObserver>) -> RunHandle {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let task = tokio::spawn(async move { self.run(&request, observer.as_ref(), &token).await });
        RunHandle { cancel, task }
    }

    async fn execute(
        &self,
        plan: RunPlan,
        request: &RunRequest,
        observer: &dyn RunObserver,
        cancel: &CancellationToken,
    ) -> Result<RunResult> {
        let started = Instant::now();
        let total = plan.pairs.len();
        info!(
            "Starting run: {} repositories x {} authors ({} pairs, {} at a time)",
            plan.repositories.len(),
            request.authors.len(),
            total,
            self.jobs
        );

        let query = LogQuery::new(&self.tool.git, request.window)
            .with_exclusions(&request.exclusions)
            .with_extra_flags(&request.extra_flags);
        let runner = ProcessRunner::new(&self.tool.shell, self.timeout);
        let mut aggregator = Aggregator::seed(&request.authors);

        let (query, runner) = (&query, &runner);
        let mut pending = stream::iter(plan.pairs)
            .map(move |pair| evaluate_pair(runner, query, pair, observer))
            .buffer_unordered(self.jobs);

        let mut completed = 0;
        let mut skipped = 0;
        loop {
            let next = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!("Run cancelled after {completed}/{total} pairs");
                    return Err(ContribError::Cancelled);
                }
                next = pending.next() => next,
            };
            let Some((pair, outcome)) = next else {
                break;
            };

            match outcome {
                Ok(triple) => aggregator.record_pair(&pair.repository, &pair.author, triple),
                Err(failure) => {
                    skipped += 1;
                    warn!("Skipping {}: {}", pair.label(), failure);
                    observer.on_log_line(&format!("{}: skipped: {}", pair.label(), failure));
                }
            }

            completed += 1;
            observer.on_progress(completed, total);
        }

        let result = RunResult {
            window: request.window,
            authors: request.authors.clone(),
            aggregate: aggregator.finalize(&plan.repositories),
            pairs_total: total,
            pairs_skipped: skipped,
        };
        info!(
            "Run finished in {:.1}s: {} pairs, {} skipped",
            started.elapsed().as_secs_f64(),
            total,
            skipped
        );
        observer.on_run_complete(&result);
        Ok(result)
    }
}

async fn evaluate_pair(
    runner: &ProcessRunner,
    query: &LogQuery,
    pair: Pair,
    observer: &dyn RunObserver,
) -> (Pair, std::result::Result<ContributionTriple, PairFailure>) {
    let command = query.for_authors(&pair.aliases);
    debug!("{}: {}", pair.label(), command);
    observer.on_log_line(&command);

    let outcome = match runner.run(&pair.path, &command).await {
        Ok(output) => {
            if !output.stderr.is_empty() {
                observer.on_log_line(&format!("{}: stderr: {}", pair.label(), output.stderr));
            }
            observer.on_log_line(&format!("{}: raw '{}'", pair.label(), output.stdout.trim()));
            parse_triple(&output.stdout).map_err(PairFailure::from)
        }
        Err(failure) => Err(failure.into()),
    };

    if let Ok(triple) = &outcome {
        observer.on_log_line(&format!(
            "{}: added {}, removed {}, net {}",
            pair.label(),
            triple.added,
            triple.removed,
            triple.net
        ));
    }

    (pair, outcome)
}

pub struct RunHandle {
    cancel: CancellationToken,
    task: JoinHandle<Result<RunResult>>,
}

impl RunHandle {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub async fn join(self) -> Result<RunResult> {
        self.task.await?
    }
}
