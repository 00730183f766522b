//! Cross-solution reference search.
//!
//! [`find_all_references`] walks every solution below a root, and in each
//! solution that contains the source project finds the projects that reach it
//! through references. Each consumer is indexed and its usage sites of the
//! searched type are reported as [`Reference`]s.
//!
//! The search is a pull-based [`ReferenceStream`]: solutions are opened and
//! consumers indexed only as items are requested, and a solution is fully
//! drained before the next one is opened. Failures scoped to one solution or
//! project are yielded as `Err` items and the search continues; cancellation
//! ends the stream after a single `Cancelled` item.

pub mod graph;

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::time::Duration;

use petgraph::graph::NodeIndex;
use tracing::debug;

use crate::core::error::{FinderError, Result};
use crate::core::project::ProjectDetails;
use crate::core::types::{Reference, TypeQuery};
use crate::core::version::VersionIdentifier;
use crate::index::{SymbolIndexer, TypeIndexer, Usages};
use crate::ops::open::{open_solution, OpenOptions};
use crate::ops::scan::{find_solutions, ScanOptions, SolutionScan};
use crate::util::cancel::CancelToken;

pub use graph::{EdgeKind, ProjectGraph};

/// Options for [`find_all_references`].
#[derive(Debug, Clone)]
pub struct FindOptions {
    pub scan: ScanOptions,
    pub open: OpenOptions,
    /// Checked before every step
    pub cancel: CancelToken,
}

impl Default for FindOptions {
    fn default() -> Self {
        let cancel = CancelToken::new();
        FindOptions {
            scan: ScanOptions {
                cancel: cancel.clone(),
                ..ScanOptions::default()
            },
            open: OpenOptions {
                cancel: cancel.clone(),
                ..OpenOptions::default()
            },
            cancel,
        }
    }
}

impl FindOptions {
    /// Bound the whole search by `timeout`. Expiry behaves like cancellation.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let cancel = self.cancel.clone().timeout(timeout);
        self.scan.cancel = cancel.clone();
        self.open.cancel = cancel.clone();
        self.cancel = cancel;
        self
    }
}

/// Find every usage of `class_name`, declared by `source_project`, in the
/// projects that reference it, across all solutions below `root`.
///
/// Empty names fail with `InvalidArgument` and a missing root with
/// `NotFound`, before anything is yielded.
pub fn find_all_references<'a>(
    root: &Path,
    source_project: &str,
    class_name: &str,
    indexer: &'a dyn SymbolIndexer,
    opts: &FindOptions,
) -> Result<ReferenceStream<'a>> {
    let source_project = source_project.trim();
    let class_name = class_name.trim();
    if source_project.is_empty() {
        return Err(FinderError::InvalidArgument {
            name: "source_project",
            message: "must not be empty".into(),
        });
    }
    if class_name.is_empty() {
        return Err(FinderError::InvalidArgument {
            name: "class_name",
            message: "must not be empty".into(),
        });
    }

    let scan = find_solutions(root, &opts.scan)?;
    debug!(
        "searching for {} of {} below {}",
        class_name,
        source_project,
        root.display()
    );

    Ok(ReferenceStream {
        source_project: source_project.to_string(),
        class_name: class_name.to_string(),
        indexer: TypeIndexer::new(indexer),
        open: opts.open.clone(),
        cancel: opts.cancel.clone(),
        scan: Some(scan),
        current: None,
    })
}

/// Lazily produced references, interleaved with per-item errors.
pub struct ReferenceStream<'a> {
    source_project: String,
    class_name: String,
    indexer: TypeIndexer<'a>,
    open: OpenOptions,
    cancel: CancelToken,
    /// `None` once the stream has ended
    scan: Option<SolutionScan>,
    current: Option<SolutionSearch>,
}

/// Search state inside one opened solution.
struct SolutionSearch {
    path: PathBuf,
    graph: ProjectGraph,
    source_path: PathBuf,
    query: TypeQuery,
    failures: VecDeque<FinderError>,
    consumers: VecDeque<NodeIndex>,
    indexing: Option<ConsumerUsages>,
}

/// Usage sites of the consumer being indexed.
struct ConsumerUsages {
    details: ProjectDetails,
    source_version: Option<VersionIdentifier>,
    usages: Usages,
}

enum Step {
    Yield(Result<Reference>),
    Continue,
    End,
}

impl<'a> ReferenceStream<'a> {
    /// Drop held sessions and end the stream.
    fn finish(&mut self) {
        self.current = None;
        self.scan = None;
    }

    fn step(&mut self) -> Step {
        let Some(search) = self.current.as_mut() else {
            return self.next_solution();
        };

        if let Some(err) = search.failures.pop_front() {
            return Step::Yield(Err(err));
        }

        if let Some(consumer) = search.indexing.as_mut() {
            return match consumer.usages.next() {
                Some(Ok(site)) if search.query.matches(&site.referenced_type) => {
                    Step::Yield(Ok(Reference {
                        source_project: self.source_project.clone(),
                        source_path: search.source_path.clone(),
                        consumer: consumer.details.clone(),
                        solution_path: search.path.clone(),
                        class_name: self.class_name.clone(),
                        location: site,
                        source_version: consumer.source_version.clone(),
                    }))
                }
                Some(Ok(_)) => Step::Continue,
                Some(Err(e)) => Step::Yield(Err(e)),
                None => {
                    search.indexing = None;
                    Step::Continue
                }
            };
        }

        let Some(node) = search.consumers.pop_front() else {
            debug!("finished {}", search.path.display());
            self.current = None;
            return Step::Continue;
        };

        let project = search.graph.project(node);
        match self
            .indexer
            .usages(project.absolute_path(), self.cancel.clone())
        {
            Ok(usages) => {
                search.indexing = Some(ConsumerUsages {
                    details: project.details(),
                    source_version: project
                        .package_reference(&self.source_project)
                        .and_then(|p| p.version.clone()),
                    usages,
                });
                Step::Continue
            }
            Err(e) => Step::Yield(Err(e)),
        }
    }

    fn next_solution(&mut self) -> Step {
        let Some(scan) = self.scan.as_mut() else {
            return Step::End;
        };
        let path = match scan.next() {
            None => return Step::End,
            Some(Err(e)) => return Step::Yield(Err(e)),
            Some(Ok(path)) => path,
        };

        let solution = match open_solution(&path, &self.open) {
            Ok(solution) => solution,
            Err(e) => return Step::Yield(Err(e)),
        };
        if !solution.has_project(&self.source_project) {
            debug!(
                "skipping {}: no project named {}",
                path.display(),
                self.source_project
            );
            return Step::Continue;
        }

        let mut failures = VecDeque::new();
        let mut projects = Vec::new();
        let mut sources = Vec::new();
        for (entry, project) in solution.into_units() {
            match project {
                Ok(project) => {
                    if entry.is_named(&self.source_project) {
                        sources.push(NodeIndex::new(projects.len()));
                    }
                    projects.push(project);
                }
                Err(e) => failures.push_back(e),
            }
        }

        let graph = ProjectGraph::new(projects);
        let consumers: VecDeque<_> = graph.consumers_of(&sources).into();
        let source_path = sources
            .first()
            .map(|&n| graph.project(n).absolute_path().to_path_buf())
            .unwrap_or_default();
        debug!(
            "{}: {} consumer(s) of {}",
            path.display(),
            consumers.len(),
            self.source_project
        );

        let mut declared = Vec::new();
        if !consumers.is_empty() {
            for &node in &sources {
                match self.indexer.declared_types(graph.project(node).absolute_path()) {
                    Ok(types) => declared.extend(types),
                    Err(e) => failures.push_back(e),
                }
            }
        }
        let query = TypeQuery::resolve(&self.class_name, &declared);
        debug!("{} resolves to {:?}", self.class_name, query.names());

        self.current = Some(SolutionSearch {
            path,
            graph,
            source_path,
            query,
            failures,
            consumers,
            indexing: None,
        });
        Step::Continue
    }
}

impl Iterator for ReferenceStream<'_> {
    type Item = Result<Reference>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.scan.as_ref()?;
            if let Err(e) = self.cancel.check() {
                self.finish();
                return Some(Err(e));
            }

            match self.step() {
                Step::Yield(Err(e)) if e.is_cancelled() => {
                    self.finish();
                    return Some(Err(e));
                }
                Step::Yield(item) => return Some(item),
                Step::Continue => {}
                Step::End => {
                    self.finish();
                    return None;
                }
            }
        }
    }
}

impl std::iter::FusedIterator for ReferenceStream<'_> {}
