use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::RwLock;

use crate::dataset::{LoadOptions, Library, load_library};

#[derive(Debug, Default)]
struct Current {
    library: Option<Arc<Library>>,
    error: Option<String>,
    generation: u64,
}

/// The one "current books" value the service reads from.
///
/// Every reload takes a generation number when it starts. A finished load
/// only replaces the snapshot if no newer reload has started since, so
/// overlapping reloads resolve to the latest request.
#[derive(Debug, Clone, Default)]
pub struct LibraryHandle {
    current: Arc<RwLock<Current>>,
    started: Arc<AtomicU64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadOutcome {
    Applied { books: usize },
    Failed { message: String },
    Stale,
}

impl LibraryHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// The loaded snapshot, or the message from the load that failed.
    pub async fn snapshot(&self) -> Result<Arc<Library>, String> {
        let current = self.current.read().await;
        match (&current.library, &current.error) {
            (Some(library), _) => Ok(Arc::clone(library)),
            (None, Some(error)) => Err(error.clone()),
            (None, None) => Err("book data has not been loaded yet".to_owned()),
        }
    }

    pub fn begin_reload(&self) -> u64 {
        self.started.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Applies the result of reload `generation`. A failed load clears the
    /// snapshot so the failure is what readers see.
    pub async fn finish_reload(
        &self,
        generation: u64,
        result: anyhow::Result<Library>,
    ) -> ReloadOutcome {
        let mut current = self.current.write().await;
        if generation < self.started.load(Ordering::SeqCst) || generation <= current.generation {
            tracing::debug!(generation, "discarding stale reload");
            return ReloadOutcome::Stale;
        }
        current.generation = generation;

        match result {
            Ok(library) => {
                let books = library.books.len();
                current.library = Some(Arc::new(library));
                current.error = None;
                ReloadOutcome::Applied { books }
            }
            Err(err) => {
                let message = format!("{err:#}");
                tracing::error!(generation, error = %message, "reload failed");
                current.library = None;
                current.error = Some(message.clone());
                ReloadOutcome::Failed { message }
            }
        }
    }

    pub async fn reload(&self, location: &str, options: &LoadOptions) -> ReloadOutcome {
        let generation = self.begin_reload();
        let result = load_library(location, options).await;
        self.finish_reload(generation, result).await
    }
}
