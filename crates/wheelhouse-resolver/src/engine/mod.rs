//! Resolution engine
//!
//! Walks the dependency closure of a set of package specifications with an
//! explicit worklist. Each package name moves through a tri-state lifecycle
//! (claimed, resolved, unresolvable); a name is claimed before its
//! dependencies are expanded, which is what terminates circular dependency
//! chains. Conflict detection runs as a separate pass once expansion is
//! complete.

use std::collections::VecDeque;
use std::sync::Arc;

use indexmap::IndexMap;
use tokio::sync::{Mutex, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use wheelhouse_core::types::constraint::parse_dependency;
use wheelhouse_core::{
    ConflictStrategy, Environment, ResolutionResult, ResolvedPackage, VersionConstraint,
};
use wheelhouse_registry::RegistryClient;

use crate::conflict::ConflictDetector;
use crate::ResolverResult;

/// Engine configuration
#[derive(Debug, Clone)]
pub struct ResolverOptions {
    /// Concurrent fetch limit for `resolve_parallel`
    pub max_workers: usize,
    /// Fan-out cap on declared dependencies expanded per package;
    /// 0 disables the cap
    pub max_dependencies_per_package: usize,
    /// Conflict-handling strategy
    pub strategy: ConflictStrategy,
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            max_workers: 4,
            max_dependencies_per_package: 20,
            strategy: ConflictStrategy::default(),
        }
    }
}

/// Lifecycle of one package name during expansion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PackageStatus {
    /// Claimed by a worker; dependencies not yet expanded
    Fetching,
    Resolved,
    Unresolvable,
}

/// Shared mutable state for one resolution run
#[derive(Debug, Default)]
pub(crate) struct ResolutionState {
    /// One entry per distinct package name, insertion-ordered
    pub(crate) packages: IndexMap<String, ResolvedPackage>,
    pub(crate) status: IndexMap<String, PackageStatus>,
    /// Every constraint recorded against each name, across all dependents
    pub(crate) constraints: IndexMap<String, Vec<VersionConstraint>>,
    /// Which resolved packages depend on each name
    pub(crate) dependents: IndexMap<String, Vec<String>>,
    pub(crate) warnings: Vec<String>,
}

/// One pending expansion
#[derive(Debug, Clone)]
struct WorkItem {
    constraint: VersionConstraint,
    parent: Option<String>,
    direct: bool,
}

/// Dependency resolver over a shared registry client
#[derive(Debug)]
pub struct Resolver {
    registry: Arc<RegistryClient>,
    options: ResolverOptions,
}

impl Resolver {
    pub fn new(registry: Arc<RegistryClient>, options: ResolverOptions) -> Self {
        Self { registry, options }
    }

    /// Resolve a set of package specifications sequentially
    pub async fn resolve(
        &self,
        specs: &[String],
        environment: &Environment,
    ) -> ResolverResult<ResolutionResult> {
        let mut initial = ResolutionState::default();
        let mut queue = parse_roots(specs, &mut initial);
        let state = Arc::new(Mutex::new(initial));

        while let Some(item) = queue.pop_front() {
            let admitted = admit(&mut *state.lock().await, &item);
            if !admitted {
                continue;
            }
            let children = resolve_one(
                Arc::clone(&self.registry),
                Arc::clone(&state),
                item,
                environment.clone(),
                self.options.max_dependencies_per_package,
            )
            .await;
            queue.extend(children);
        }

        self.finish(take_state(state).await, environment).await
    }

    /// Resolve a set of package specifications with bounded concurrency.
    ///
    /// Expansion proceeds in waves: every unclaimed name in the current
    /// frontier is fetched concurrently under the worker limit, results are
    /// merged into the shared state, and the children form the next frontier.
    /// Produces the same package set as [`resolve`](Self::resolve) for a
    /// stable registry.
    pub async fn resolve_parallel(
        &self,
        specs: &[String],
        environment: &Environment,
    ) -> ResolverResult<ResolutionResult> {
        let mut initial = ResolutionState::default();
        let mut frontier: Vec<WorkItem> = parse_roots(specs, &mut initial).into();
        let state = Arc::new(Mutex::new(initial));
        let semaphore = Arc::new(Semaphore::new(self.options.max_workers.max(1)));

        while !frontier.is_empty() {
            let mut admitted = Vec::new();
            {
                let mut state = state.lock().await;
                for item in frontier.drain(..) {
                    if admit(&mut state, &item) {
                        admitted.push(item);
                    }
                }
            }

            let mut join_set = JoinSet::new();
            for item in admitted {
                let registry = Arc::clone(&self.registry);
                let state = Arc::clone(&state);
                let semaphore = Arc::clone(&semaphore);
                let environment = environment.clone();
                let max_dependencies = self.options.max_dependencies_per_package;
                join_set.spawn(async move {
                    let _permit = semaphore.acquire_owned().await.ok();
                    resolve_one(registry, state, item, environment, max_dependencies).await
                });
            }

            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(children) => frontier.extend(children),
                    Err(error) => {
                        warn!(%error, "resolution task panicked");
                        state
                            .lock()
                            .await
                            .warnings
                            .push(format!("A resolution task failed: {error}"));
                    }
                }
            }
        }

        let mut state = take_state(state).await;
        self.optimize_versions(&mut state).await;
        self.finish(state, environment).await
    }

    /// Settle each multiply-constrained package on the newest published
    /// version satisfying its full constraint set.
    ///
    /// Wave expansion can pick a version for a name before a later wave
    /// records another constraint against it; this pass re-checks every
    /// such package once the constraint set is complete.
    async fn optimize_versions(&self, state: &mut ResolutionState) {
        let names: Vec<String> = state.packages.keys().cloned().collect();
        for name in names {
            let constraints = state.constraints.get(&name).cloned().unwrap_or_default();
            if constraints.len() < 2 {
                continue;
            }
            let versions = self.registry.list_versions(&name).await;
            let best = versions
                .iter()
                .rev()
                .find(|v| constraints.iter().all(|c| c.contains(v)))
                .cloned();
            if let Some(best) = best {
                let best_str = best.to_string();
                if let Some(package) = state.packages.get_mut(&name) {
                    if package.version != best_str {
                        debug!(package = %name, previous = %package.version, settled = %best_str, "optimized version after expansion");
                        package.version = best_str;
                    }
                }
            }
        }
    }

    /// Conflict pass and result assembly
    async fn finish(
        &self,
        mut state: ResolutionState,
        environment: &Environment,
    ) -> ResolverResult<ResolutionResult> {
        let detector = ConflictDetector::new(Arc::clone(&self.registry));
        let conflicts = detector.detect(&mut state).await;
        let resolutions = detector
            .resolve(&conflicts, &mut state, &self.options.strategy, environment)
            .await?;

        let dependency_tree: IndexMap<String, Vec<String>> = state
            .packages
            .iter()
            .map(|(name, package)| (name.clone(), package.dependencies.clone()))
            .collect();
        let success = ResolutionResult::compute_success(&conflicts, &resolutions);

        info!(
            packages = state.packages.len(),
            conflicts = conflicts.len(),
            resolutions = resolutions.len(),
            success,
            "resolution finished"
        );

        Ok(ResolutionResult {
            packages: state.packages.into_values().collect(),
            conflicts,
            resolutions,
            dependency_tree,
            success,
            warnings: state.warnings,
        })
    }
}

/// Parse the requested specifications into root work items. A malformed
/// specification is skipped with a warning; it never aborts the run.
fn parse_roots(specs: &[String], state: &mut ResolutionState) -> VecDeque<WorkItem> {
    let mut queue = VecDeque::new();
    for spec in specs {
        match VersionConstraint::parse(spec) {
            Ok(constraint) => queue.push_back(WorkItem {
                constraint,
                parent: None,
                direct: true,
            }),
            Err(error) => {
                warn!(spec = %spec, %error, "skipping malformed specification");
                state
                    .warnings
                    .push(format!("Skipped malformed specification '{spec}': {error}"));
            }
        }
    }
    queue
}

/// Record a work item's constraint and edges, claiming the name when it has
/// not been visited yet. Returns whether the caller should resolve it.
fn admit(state: &mut ResolutionState, item: &WorkItem) -> bool {
    let name = item.constraint.name.clone();

    state
        .constraints
        .entry(name.clone())
        .or_default()
        .push(item.constraint.clone());

    if let Some(parent) = &item.parent {
        let dependents = state.dependents.entry(name.clone()).or_default();
        if !dependents.contains(parent) {
            dependents.push(parent.clone());
        }
    }

    if item.direct {
        if let Some(package) = state.packages.get_mut(&name) {
            package.direct = true;
        }
    }

    if state.status.contains_key(&name) {
        return false;
    }
    state.status.insert(name, PackageStatus::Fetching);
    true
}

/// Resolve one claimed package name and return its dependency work items.
///
/// Registry calls run without holding the state lock; the lock is taken
/// only to merge the outcome.
async fn resolve_one(
    registry: Arc<RegistryClient>,
    state: Arc<Mutex<ResolutionState>>,
    item: WorkItem,
    environment: Environment,
    max_dependencies: usize,
) -> Vec<WorkItem> {
    let name = item.constraint.name.clone();
    let python = environment.python_version.as_str();

    let mut warning = None;
    let mut chosen = registry
        .find_optimal_version(&name, python, &item.constraint, true)
        .await;

    if chosen.is_none() {
        // One fallback: newest constraint-matching version regardless of the
        // declared Python range.
        let versions = registry.list_versions(&name).await;
        chosen = versions
            .iter()
            .rev()
            .find(|v| item.constraint.contains(v))
            .cloned();
        if let Some(version) = &chosen {
            warning = Some(format!(
                "'{name}': no version passed the Python {python} check; \
                 using {version} with runtime compatibility unconfirmed"
            ));
        }
    }

    let Some(version) = chosen else {
        warn!(package = %name, constraint = %item.constraint.clauses_display(), "unresolvable package");
        let mut state = state.lock().await;
        state.status.insert(name.clone(), PackageStatus::Unresolvable);
        state.warnings.push(format!(
            "Could not resolve '{name}' ({})",
            item.constraint.clauses_display()
        ));
        return Vec::new();
    };

    let version_str = version.to_string();
    let metadata = registry.version_metadata(&name, &version_str).await;

    let mut truncated = 0usize;
    let mut dependency_names = Vec::new();
    let mut children = Vec::new();
    if let Some(metadata) = metadata {
        let mut declared = metadata.dependencies;
        if max_dependencies > 0 && declared.len() > max_dependencies {
            truncated = declared.len() - max_dependencies;
            declared.truncate(max_dependencies);
        }
        for raw in &declared {
            // Markers and extras are stripped; unparseable residue is skipped
            let Some(constraint) = parse_dependency(raw) else {
                debug!(package = %name, dependency = raw, "skipping unparseable dependency");
                continue;
            };
            dependency_names.push(constraint.name.clone());
            children.push(WorkItem {
                constraint,
                parent: Some(name.clone()),
                direct: false,
            });
        }
    }

    debug!(package = %name, version = %version_str, dependencies = dependency_names.len(), "resolved package");

    {
        let mut state = state.lock().await;
        let mut package = ResolvedPackage::new(name.clone(), version_str, item.direct);
        package.dependencies = dependency_names;
        state.packages.insert(name.clone(), package);
        state.status.insert(name.clone(), PackageStatus::Resolved);
        if let Some(warning) = warning {
            state.warnings.push(warning);
        }
        if truncated > 0 {
            state.warnings.push(format!(
                "'{name}': expanded only the first {max_dependencies} declared dependencies ({truncated} skipped)"
            ));
        }
    }

    children
}

async fn take_state(state: Arc<Mutex<ResolutionState>>) -> ResolutionState {
    match Arc::try_unwrap(state) {
        Ok(mutex) => mutex.into_inner(),
        Err(shared) => std::mem::take(&mut *shared.lock().await),
    }
}
