//! Bounded worker pool, one rendering task per source file.

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::render::FrameRenderer;

/// A source file that failed to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FailedFrame {
    pub file: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderSummary {
    /// Written frames, in input order
    pub rendered: Vec<PathBuf>,
    pub failed: Vec<FailedFrame>,
}

pub struct RenderPool {
    pool: ThreadPool,
}

impl RenderPool {
    /// Pool of `workers` threads, or one per available CPU.
    pub fn new(workers: Option<usize>) -> Result<Self, ThreadPoolBuildError> {
        let workers = workers
            .filter(|n| *n > 0)
            .unwrap_or_else(default_workers);
        let pool = ThreadPoolBuilder::new()
            .num_threads(workers)
            .thread_name(|i| format!("frame-render-{}", i))
            .build()?;
        Ok(Self { pool })
    }

    pub fn workers(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Render every source into `out_dir`. A failing file is logged and
    /// counted; its siblings still render.
    pub fn run(&self, renderer: &FrameRenderer, sources: &[PathBuf], out_dir: &Path) -> RenderSummary {
        let start = Instant::now();

        let results: Vec<Result<PathBuf, FailedFrame>> = self.pool.install(|| {
            sources
                .par_iter()
                .map(|source| {
                    renderer.render_to(source, out_dir).map_err(|e| {
                        let file = source.display().to_string();
                        warn!(file = %file, error = %e, "Frame failed");
                        FailedFrame {
                            file,
                            reason: e.to_string(),
                        }
                    })
                })
                .collect()
        });

        let mut summary = RenderSummary::default();
        for result in results {
            match result {
                Ok(path) => summary.rendered.push(path),
                Err(failed) => summary.failed.push(failed),
            }
        }

        info!(
            workers = self.workers(),
            rendered = summary.rendered.len(),
            failed = summary.failed.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Rendering complete"
        );
        summary
    }
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(NonZeroUsize::get)
        .unwrap_or(1)
}

/// Files in `dir` (non-recursive) named `<prefix>*<suffix>`, sorted by name.
pub fn discover_sources(dir: &Path, prefix: &str, suffix: &str) -> Result<Vec<PathBuf>, walkdir::Error> {
    let mut sources = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry?;
        if !entry.path().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy();
        if name.starts_with(prefix) && name.ends_with(suffix) {
            sources.push(entry.into_path());
        }
    }
    sources.sort();
    Ok(sources)
}
