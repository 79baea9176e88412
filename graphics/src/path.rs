//! Dependency-ordered frame driver.
//!
//! A [`RenderPath`] holds a DAG of operations, one per drawing
//! destination. [`RenderPath::draw`] validates the graph, then runs it
//! on a worker pool: every operation executes its target's update phase
//! followed by its draw phase, and an operation never starts before all
//! of its dependencies finished both phases. Operations with no path
//! between them genuinely overlap.

use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use aster_core::ThreadPool;

use crate::error::RenderError;
use crate::scene::SceneGraph;
use crate::target::Renderable;

/// Identifies an operation within one [`RenderPath`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OpHandle(usize);

impl fmt::Display for OpHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

struct Operation {
    target: Arc<dyn Renderable>,
    label: Option<String>,
    /// Operations that wait for this one.
    dependents: Vec<usize>,
    /// Number of operations this one waits for.
    dependencies: usize,
}

/// Schedules per-target frames across a dependency graph.
pub struct RenderPath {
    operations: Vec<Operation>,
    pool: ThreadPool,
}

impl RenderPath {
    /// Creates a path sized to the available parallelism.
    pub fn new() -> Self {
        Self {
            operations: Vec::new(),
            pool: ThreadPool::default_threads(),
        }
    }

    /// Creates a path with an explicit worker count (clamped to one).
    pub fn with_threads(thread_count: usize) -> Self {
        Self {
            operations: Vec::new(),
            pool: ThreadPool::new(thread_count),
        }
    }

    /// Worker threads a draw will use.
    #[inline]
    pub fn thread_count(&self) -> usize {
        self.pool.num_threads()
    }

    /// Number of registered operations.
    #[inline]
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Whether the path has no operations.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    /// Registers a target behind the listed dependencies.
    ///
    /// Every dependency handle must come from this path, and the list
    /// must not repeat a handle.
    pub fn add_operation(&mut self, target: Arc<dyn Renderable>, deps: &[OpHandle]) -> OpHandle {
        for (i, dep) in deps.iter().enumerate() {
            assert!(
                dep.0 < self.operations.len(),
                "dependency on an unknown operation"
            );
            assert!(
                !deps[..i].contains(dep),
                "duplicate dependency on {dep}"
            );
        }

        let index = self.operations.len();
        self.operations.push(Operation {
            target,
            label: None,
            dependents: Vec::new(),
            dependencies: deps.len(),
        });
        for dep in deps {
            self.operations[dep.0].dependents.push(index);
        }
        log::trace!("added operation {} with {} dependencies", index, deps.len());
        OpHandle(index)
    }

    /// Adds one dependency edge after both operations exist.
    ///
    /// Unlike [`add_operation`](RenderPath::add_operation), wiring edges
    /// this way can close a cycle; that is caught by the next draw.
    pub fn add_dependency(&mut self, op: OpHandle, dep: OpHandle) {
        assert!(op.0 < self.operations.len(), "unknown operation {op}");
        assert!(dep.0 < self.operations.len(), "unknown dependency {dep}");
        assert_ne!(op.0, dep.0, "{op} cannot depend on itself");
        assert!(
            !self.operations[dep.0].dependents.contains(&op.0),
            "duplicate dependency on {dep}"
        );
        self.operations[dep.0].dependents.push(op.0);
        self.operations[op.0].dependencies += 1;
    }

    /// Attaches a debug label to an operation.
    pub fn label_operation(&mut self, op: OpHandle, label: impl Into<String>) {
        assert!(op.0 < self.operations.len(), "unknown operation {op}");
        self.operations[op.0].label = Some(label.into());
    }

    /// Kahn's algorithm over the dependency graph; the schedule is
    /// discarded, only schedulability matters.
    fn check_schedulable(&self) -> Result<(), RenderError> {
        let mut indegree: Vec<usize> = self.operations.iter().map(|op| op.dependencies).collect();
        let mut queue: VecDeque<usize> = indegree
            .iter()
            .enumerate()
            .filter(|(_, d)| **d == 0)
            .map(|(i, _)| i)
            .collect();

        let mut scheduled = 0;
        while let Some(index) = queue.pop_front() {
            scheduled += 1;
            for dependent in &self.operations[index].dependents {
                indegree[*dependent] -= 1;
                if indegree[*dependent] == 0 {
                    queue.push_back(*dependent);
                }
            }
        }

        if scheduled != self.operations.len() {
            log::error!(
                "render path has a dependency cycle: only {} of {} operations are schedulable",
                scheduled,
                self.operations.len()
            );
            return Err(RenderError::CyclicDependency(format!(
                "only {} of {} operations are schedulable",
                scheduled,
                self.operations.len()
            )));
        }
        Ok(())
    }

    /// Runs one frame: every operation's update then draw, in
    /// dependency order, spread across the worker pool.
    pub fn draw(&self, scene: &SceneGraph) -> Result<(), RenderError> {
        if self.operations.is_empty() {
            return Ok(());
        }
        self.check_schedulable()?;

        let total = self.operations.len();
        let pending: Vec<AtomicUsize> = self
            .operations
            .iter()
            .map(|op| AtomicUsize::new(op.dependencies))
            .collect();
        let ready: Mutex<VecDeque<usize>> = Mutex::new(
            self.operations
                .iter()
                .enumerate()
                .filter(|(_, op)| op.dependencies == 0)
                .map(|(i, _)| i)
                .collect(),
        );
        let ready_signal = Condvar::new();
        let completed = AtomicUsize::new(0);

        let workers = self.pool.num_threads().min(total);
        log::trace!("drawing {} operations on {} workers", total, workers);

        self.pool.scope(|s| {
            for _ in 0..workers {
                s.spawn(|| loop {
                    let index = {
                        let mut queue = ready.lock();
                        loop {
                            if completed.load(Ordering::Acquire) == total {
                                return;
                            }
                            match queue.pop_front() {
                                Some(index) => break index,
                                None => ready_signal.wait(&mut queue),
                            }
                        }
                    };

                    let op = &self.operations[index];
                    op.target.update(scene);
                    op.target.draw();
                    log::trace!(
                        "operation {} ({}) complete",
                        index,
                        op.label.as_deref().unwrap_or("unlabeled")
                    );

                    for dependent in &op.dependents {
                        if pending[*dependent].fetch_sub(1, Ordering::AcqRel) == 1 {
                            ready.lock().push_back(*dependent);
                            ready_signal.notify_one();
                        }
                    }
                    if completed.fetch_add(1, Ordering::AcqRel) + 1 == total {
                        // A worker between its completion check and its
                        // wait still holds the queue lock; taking it here
                        // keeps the final notify from slipping past them.
                        let _queue = ready.lock();
                        ready_signal.notify_all();
                    }
                });
            }
        });
        Ok(())
    }
}

impl Default for RenderPath {
    fn default() -> Self {
        Self::new()
    }
}

static_assertions::assert_impl_all!(RenderPath: Send, Sync);
