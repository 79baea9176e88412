//! Scoped worker pool for frame-graph execution.

/// A thread pool for running borrowed work items in parallel.
///
/// On native targets, uses `std::thread::scope` for scoped parallel
/// execution. On WASM, executes all tasks sequentially on the main thread.
///
/// # Example
///
/// ```
/// use aster_core::ThreadPool;
///
/// let pool = ThreadPool::new(4);
///
/// let mut results = vec![0u32; 4];
/// pool.scope(|s| {
///     for (i, slot) in results.iter_mut().enumerate() {
///         s.spawn(move || {
///             *slot = (i as u32) * 10;
///         });
///     }
/// });
/// assert_eq!(results, vec![0, 10, 20, 30]);
/// ```
pub struct ThreadPool {
    num_threads: usize,
}

impl ThreadPool {
    /// Creates a new thread pool with the given number of worker threads.
    ///
    /// The count is clamped to at least one. On WASM it is ignored
    /// (single-threaded execution).
    pub fn new(num_threads: usize) -> Self {
        let num_threads = num_threads.max(1);
        log::trace!("thread pool created with {} workers", num_threads);
        Self { num_threads }
    }

    /// Creates a thread pool sized to the number of available CPU cores.
    pub fn default_threads() -> Self {
        Self::new(std::thread::available_parallelism().map_or(1, |n| n.get()))
    }

    /// Number of worker threads a scope will use.
    #[inline]
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Executes tasks within a scoped context.
    ///
    /// All tasks spawned within the closure are guaranteed to complete
    /// before this method returns. Tasks can borrow local variables
    /// thanks to scoped lifetimes.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn scope<'env, F>(&self, f: F)
    where
        F: for<'scope> FnOnce(&Scope<'scope, 'env>),
    {
        std::thread::scope(|s| {
            let scope = Scope { inner: s };
            f(&scope);
        });
    }

    /// Executes tasks within a scoped context (WASM: sequential).
    #[cfg(target_arch = "wasm32")]
    pub fn scope<'env, F>(&self, f: F)
    where
        F: for<'scope> FnOnce(&Scope<'scope, 'env>),
    {
        let scope = Scope {
            _marker: std::marker::PhantomData,
        };
        f(&scope);
    }
}

impl Default for ThreadPool {
    fn default() -> Self {
        Self::default_threads()
    }
}

/// A scope for spawning tasks that must complete before the scope exits.
#[cfg(not(target_arch = "wasm32"))]
pub struct Scope<'scope, 'env: 'scope> {
    inner: &'scope std::thread::Scope<'scope, 'env>,
}

#[cfg(not(target_arch = "wasm32"))]
impl<'scope, 'env> Scope<'scope, 'env> {
    /// Spawns a task within this scope on a new thread.
    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        self.inner.spawn(f);
    }
}

/// A scope for spawning tasks (WASM: sequential execution).
#[cfg(target_arch = "wasm32")]
pub struct Scope<'scope, 'env: 'scope> {
    _marker: std::marker::PhantomData<(&'scope (), &'env ())>,
}

#[cfg(target_arch = "wasm32")]
impl<'scope, 'env> Scope<'scope, 'env> {
    /// Spawns a task within this scope (WASM: executes immediately).
    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'scope,
    {
        f();
    }
}
