//! Build orchestrator: independent producer tasks run concurrently, cleanup runs after all succeed.

use std::path::PathBuf;
use std::time::Instant;

use rayon::prelude::*;
use tracing::{error, info};

use crate::asset_paths::SearchRoots;
use crate::cleanup::cleanup;
use crate::deploy::{DeployOptions, deploy};
use crate::error::{PipelineError, PipelineResult};
use crate::flatten::copy_flattened;
use crate::models::OutputArtifact;
use crate::project::{CopyJob, ProjectLayout};

/// Name of the manifest bundling task.
pub const DEPLOY_TASK: &str = "deploy";
/// Name of the barrier task that removes intermediates.
pub const CLEANUP_TASK: &str = "cleanup";

/// A producer node of the build graph. Cleanup is not a node: it runs after every producer.
#[derive(Debug, Clone)]
pub enum Task<'a> {
  /// Bundle the manifest's reference blocks.
  Deploy,
  /// Flatten-copy one group of patterns.
  Copy(&'a CopyJob),
}

impl Task<'_> {
  /// Task name as accepted on the command line.
  pub fn name(&self) -> &str {
    match self {
      Self::Deploy => DEPLOY_TASK,
      Self::Copy(job) => &job.name,
    }
  }
}

/// Artifacts written by one producer task.
#[derive(Debug, Clone)]
pub struct TaskReport {
  /// Task name.
  pub task: String,
  /// Files written.
  pub artifacts: Vec<OutputArtifact>,
}

/// Outcome of a run.
#[derive(Debug, Clone, Default)]
pub struct BuildReport {
  /// Producer reports in graph order.
  pub producers: Vec<TaskReport>,
  /// Paths removed by cleanup; empty when cleanup did not run.
  pub removed: Vec<PathBuf>,
  /// Whether the cleanup barrier executed.
  pub cleaned: bool,
}

impl BuildReport {
  /// Every artifact written during the run.
  pub fn artifacts(&self) -> impl Iterator<Item = &OutputArtifact> {
    self.producers.iter().flat_map(|report| report.artifacts.iter())
  }
}

/// High-level entry point running the asset pipeline for a project layout.
pub struct Pipeline {
  layout: ProjectLayout,
}

impl Pipeline {
  /// Create a pipeline for the provided layout.
  pub fn new(layout: ProjectLayout) -> Self {
    Self { layout }
  }

  /// The layout this pipeline operates on.
  pub fn layout(&self) -> &ProjectLayout {
    &self.layout
  }

  /// Producer tasks: deploy, then one copy task per configured job.
  pub fn producers(&self) -> Vec<Task<'_>> {
    std::iter::once(Task::Deploy)
      .chain(self.layout.copies.iter().map(Task::Copy))
      .collect()
  }

  /// Every task name, cleanup last.
  pub fn task_names(&self) -> Vec<String> {
    self
      .producers()
      .iter()
      .map(|task| task.name().to_string())
      .chain(std::iter::once(CLEANUP_TASK.to_string()))
      .collect()
  }

  /// Run the full graph: all producers concurrently, then cleanup.
  ///
  /// The first producer failure aborts the run and cleanup is skipped, since it would remove
  /// files the failed producer may never have (re)created.
  pub fn run(&self) -> PipelineResult<BuildReport> {
    let started = Instant::now();
    let producers = self.producers();
    info!(tasks = producers.len(), "running producers");

    let reports = producers
      .par_iter()
      .map(|task| self.execute_producer(task))
      .collect::<PipelineResult<Vec<_>>>()
      .map_err(|err| {
        error!(%err, "producer failed; skipping cleanup");
        err
      })?;

    let removed = self.execute_cleanup()?;
    info!(
      artifacts = reports.iter().map(|r| r.artifacts.len()).sum::<usize>(),
      removed = removed.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "build finished"
    );

    Ok(BuildReport {
      producers: reports,
      removed,
      cleaned: true,
    })
  }

  /// Run a single task by name. Running a producer alone never triggers cleanup.
  pub fn run_task(&self, name: &str) -> PipelineResult<BuildReport> {
    if name == CLEANUP_TASK {
      let removed = self.execute_cleanup()?;
      return Ok(BuildReport {
        producers: Vec::new(),
        removed,
        cleaned: true,
      });
    }

    let producers = self.producers();
    let Some(task) = producers.iter().find(|task| task.name() == name) else {
      return Err(PipelineError::UnknownTask {
        name: name.to_string(),
        available: self.task_names().join(", "),
      });
    };

    let report = self.execute_producer(task)?;
    Ok(BuildReport {
      producers: vec![report],
      removed: Vec::new(),
      cleaned: false,
    })
  }

  fn execute_producer(&self, task: &Task<'_>) -> PipelineResult<TaskReport> {
    let started = Instant::now();
    info!(task = task.name(), "task started");

    let artifacts = match task {
      Task::Deploy => deploy(
        &self.layout.manifest,
        &SearchRoots::new(self.layout.search_roots.clone()),
        &self.layout.output_dir,
        &DeployOptions::from_layout(&self.layout),
      )?,
      Task::Copy(job) => copy_flattened(&job.patterns, &job.destination)?,
    };

    info!(
      task = task.name(),
      artifacts = artifacts.len(),
      elapsed_ms = started.elapsed().as_millis() as u64,
      "task finished"
    );
    Ok(TaskReport {
      task: task.name().to_string(),
      artifacts,
    })
  }

  fn execute_cleanup(&self) -> PipelineResult<Vec<PathBuf>> {
    info!(task = CLEANUP_TASK, targets = self.layout.cleanup.len(), "task started");
    cleanup(&self.layout.output_dir, &self.layout.cleanup)
  }
}
