//! Copy resolution and execution
//!
//! A copy request is first resolved into a flat list of single-object copy
//! instructions following `cp` semantics, then executed one remote call at a
//! time. Both phases share one [`ErrorPolicy`].
//!
//! | source      | destination        | result                                  |
//! |-------------|--------------------|-----------------------------------------|
//! | `a/`        | `b/` (absent)      | copy `a` → `b`                          |
//! | `a/`        | `b/` (present)     | delete `b`, then copy `a` → `b`         |
//! | `f`         | `d/`               | copy `f` → `d/<basename f>`             |
//! | `f`         | `g`                | copy `f` → `g`                          |
//! | `[f1, f2]`  | `d/`               | each element resolved against `d/`      |

use crate::client::RemoteClient;
use crate::error::{DbxError, DbxResult};
use crate::operations::{CopyOptions, ErrorPolicy};
use crate::path::{classify, has_trailing_intent, join_basename, strip_trailing};
use crate::sink::DiagnosticSink;

/// One path or an ordered batch of paths
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CopySource {
    Single(String),
    Many(Vec<String>),
}

impl From<&str> for CopySource {
    fn from(path: &str) -> Self {
        CopySource::Single(path.to_string())
    }
}

impl From<String> for CopySource {
    fn from(path: String) -> Self {
        CopySource::Single(path)
    }
}

impl From<Vec<String>> for CopySource {
    fn from(paths: Vec<String>) -> Self {
        CopySource::Many(paths)
    }
}

impl From<&[&str]> for CopySource {
    fn from(paths: &[&str]) -> Self {
        CopySource::Many(paths.iter().map(|p| p.to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for CopySource {
    fn from(paths: [&str; N]) -> Self {
        CopySource::Many(paths.iter().map(|p| p.to_string()).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyInstruction {
    pub source: String,
    pub destination: String,
}

impl CopyInstruction {
    pub fn new(source: impl Into<String>, destination: impl Into<String>) -> Self {
        Self { source: source.into(), destination: destination.into() }
    }
}

/// Resolved batch, ready for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    pub instructions: Vec<CopyInstruction>,
    pub policy: ErrorPolicy,
}

impl CopyPlan {
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

/// Turns a copy request into [`CopyInstruction`]s.
///
/// Resolution may talk to the remote: existence of a directory destination is
/// queried fresh every time, and an existing directory destination is deleted
/// before the folder copy is planned. Neither is atomic with the later copy.
pub struct CopyResolver<'a, C: RemoteClient + ?Sized> {
    client: &'a C,
    sink: &'a dyn DiagnosticSink,
}

impl<'a, C: RemoteClient + ?Sized> CopyResolver<'a, C> {
    pub fn new(client: &'a C, sink: &'a dyn DiagnosticSink) -> Self {
        Self { client, sink }
    }

    pub async fn resolve(
        &self,
        source: &CopySource,
        destination: &str,
        options: &CopyOptions,
    ) -> DbxResult<CopyPlan> {
        let policy = options.effective_policy();
        let mut instructions = Vec::new();

        match source {
            CopySource::Single(path) => {
                self.resolve_one(path, destination, options.recursive, policy, &mut instructions)
                    .await?;
            }
            CopySource::Many(paths) => {
                if policy == ErrorPolicy::Raise {
                    if let Some(folder) = paths.iter().find(|p| has_trailing_intent(p)) {
                        return Err(DbxError::Precondition(format!(
                            "multi-path copy accepts only files, got folder {folder}"
                        )));
                    }
                }
                for path in paths {
                    self.resolve_one(path, destination, options.recursive, policy, &mut instructions)
                        .await?;
                }
            }
        }

        tracing::debug!(count = instructions.len(), %policy, "copy resolved");
        Ok(CopyPlan { instructions, policy })
    }

    async fn resolve_one(
        &self,
        source: &str,
        destination: &str,
        recursive: bool,
        policy: ErrorPolicy,
        out: &mut Vec<CopyInstruction>,
    ) -> DbxResult<()> {
        let src = classify(source);
        let dst_is_dir = has_trailing_intent(destination);

        if src.has_trailing_intent && dst_is_dir {
            if !recursive {
                return Err(DbxError::Precondition(format!(
                    "recursive copy is required to copy folder {source}"
                )));
            }

            let source = strip_trailing(source);
            let destination = strip_trailing(destination);

            if self.client.exists(destination).await {
                tracing::debug!(path = destination, "removing existing copy destination");
                if let Err(e) = self.client.delete(destination).await {
                    match policy {
                        ErrorPolicy::Raise => return Err(e),
                        ErrorPolicy::Ignore => self.sink.warn("delete", destination, &e),
                    }
                }
            }

            out.push(CopyInstruction::new(source, destination));
        } else if dst_is_dir {
            out.push(CopyInstruction::new(source, join_basename(destination, source)));
        } else {
            out.push(CopyInstruction::new(source, destination));
        }

        Ok(())
    }
}

/// Issues one remote copy per instruction. Never retries.
pub struct CopyExecutor<'a, C: RemoteClient + ?Sized> {
    client: &'a C,
    sink: &'a dyn DiagnosticSink,
}

impl<'a, C: RemoteClient + ?Sized> CopyExecutor<'a, C> {
    pub fn new(client: &'a C, sink: &'a dyn DiagnosticSink) -> Self {
        Self { client, sink }
    }

    /// Returns the number of instructions that succeeded.
    pub async fn execute(&self, plan: &CopyPlan) -> DbxResult<usize> {
        let mut copied = 0;
        for instruction in &plan.instructions {
            match self.client.copy(&instruction.source, &instruction.destination).await {
                Ok(_) => {
                    tracing::debug!(
                        from = %instruction.source,
                        to = %instruction.destination,
                        "copied"
                    );
                    copied += 1;
                }
                Err(e) => match plan.policy {
                    ErrorPolicy::Raise => return Err(e),
                    ErrorPolicy::Ignore => self.sink.warn("copy", &instruction.source, &e),
                },
            }
        }
        Ok(copied)
    }
}

/// Resolve and execute in one step.
pub async fn copy<C: RemoteClient + ?Sized>(
    client: &C,
    sink: &dyn DiagnosticSink,
    source: &CopySource,
    destination: &str,
    options: &CopyOptions,
) -> DbxResult<usize> {
    let plan = CopyResolver::new(client, sink).resolve(source, destination, options).await?;
    CopyExecutor::new(client, sink).execute(&plan).await
}
