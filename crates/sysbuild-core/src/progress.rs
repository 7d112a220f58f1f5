use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::info;

/// A user-visible build step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildEvent {
    Compiled { source: PathBuf },
    ArchiveRebuilt { archive: PathBuf },
    /// Archive left untouched; reported so incremental decisions are auditable
    ArchiveSkipped { archive: PathBuf },
    Linked { output: PathBuf },
}

impl fmt::Display for BuildEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildEvent::Compiled { source } => write!(f, "Compiled {}", source.display()),
            BuildEvent::ArchiveRebuilt { archive } => {
                write!(f, "Archived {}", archive.display())
            }
            BuildEvent::ArchiveSkipped { archive } => {
                write!(f, "Up to date {}", archive.display())
            }
            BuildEvent::Linked { output } => write!(f, "Linked {}", output.display()),
        }
    }
}

/// Trait for receiving build progress
/// This allows for dependency injection and testing with collecting handlers
pub trait ProgressHandler: Send + Sync {
    fn report(&self, event: BuildEvent);

    fn events(&self) -> Vec<BuildEvent>;

    fn compiled_count(&self) -> usize {
        self.events()
            .iter()
            .filter(|e| matches!(e, BuildEvent::Compiled { .. }))
            .count()
    }
}

/// Progress handler that logs every event
pub struct ConsoleProgressHandler {
    events: Mutex<Vec<BuildEvent>>,
}

impl ConsoleProgressHandler {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }
}

impl Default for ConsoleProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler for ConsoleProgressHandler {
    fn report(&self, event: BuildEvent) {
        info!("{}", event);
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<BuildEvent> {
        self.events.lock().unwrap().clone()
    }
}

/// Collecting progress handler for testing
/// Collects all events without printing
pub struct CollectingProgressHandler {
    events: Mutex<Vec<BuildEvent>>,
}

impl CollectingProgressHandler {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl Default for CollectingProgressHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressHandler for CollectingProgressHandler {
    fn report(&self, event: BuildEvent) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<BuildEvent> {
        self.events.lock().unwrap().clone()
    }
}
