use std::io::Write;
use std::sync::Arc;

/// `(section, current, total, description)`
pub type ProgressCallback = Arc<dyn Fn(&str, usize, usize, &str) + Send + Sync>;

const BAR_WIDTH: usize = 40;

/// Progress sink shared by the generator builders and the build/publish passes.
///
/// Without a caller-supplied callback it renders a textual bar on stderr.
#[derive(Clone, Default)]
pub struct Progress {
    callback: Option<ProgressCallback>,
}

impl Progress {
    pub fn new(callback: Option<ProgressCallback>) -> Self {
        Self { callback }
    }

    pub fn from_fn<F>(f: F) -> Self
    where
        F: Fn(&str, usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Some(Arc::new(f)),
        }
    }

    pub fn report(&self, section: &str, current: usize, total: usize, description: &str) {
        match &self.callback {
            Some(cb) => cb(section, current, total, description),
            None => {
                let line = render_bar(section, current, total, description);
                let mut stderr = std::io::stderr().lock();
                let _ = write!(stderr, "\r{line}");
                if total > 0 && current >= total {
                    let _ = writeln!(stderr);
                }
                let _ = stderr.flush();
            }
        }
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress")
            .field("custom", &self.callback.is_some())
            .finish()
    }
}

/// Render one progress line, clamping out-of-range counters.
pub fn render_bar(section: &str, current: usize, total: usize, description: &str) -> String {
    let total = total.max(1);
    let current = current.min(total);
    let blocks = current * BAR_WIDTH / total;
    let percentage = current * 100 / total;

    format!(
        "{section} [{}{}] {percentage}% ({current}/{total}) | {description}",
        "=".repeat(blocks),
        " ".repeat(BAR_WIDTH - blocks),
    )
}
