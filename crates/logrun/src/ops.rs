//! File operations built on top of [`Runner::run`] and [`Runner::shell`]
//!
//! These run ordinary utilities (`stat`, `ls`, `rsync`) and parse their
//! output, so they behave the same on local and remote runners.

use tracing::{debug, instrument};

use crate::error::Error;
use crate::runner::Runner;
use crate::settings::CommandSpec;

/// stderr marker for a path that does not exist
const NO_SUCH_FILE: &str = "No such file or directory";

const FILE_TYPES: &[&str] = &["regular file", "regular empty file"];
const DIR_TYPES: &[&str] = &["directory"];

impl Runner {
    /// Whether `path` exists and is a regular file, following symlinks
    ///
    /// The query is logged even in dry-run mode, which then answers `true`
    /// without running anything. A missing path is `Ok(false)`.
    ///
    /// # Errors
    /// `Error::NotAFile` if the path is something else, `Error::Access` if
    /// the query failed for another reason.
    #[instrument(skip(self), level = "debug")]
    pub async fn file_exists(&self, path: &str) -> Result<bool, Error> {
        let spec = &self.commands().file_stat;
        self.stat_matches(spec, path, FILE_TYPES)
            .await?
            .map_or(Ok(false), |is_file| {
                if is_file {
                    Ok(true)
                } else {
                    Err(Error::NotAFile(path.to_string()))
                }
            })
    }

    /// Whether `path` exists and is a directory, following symlinks
    ///
    /// Same dry-run and missing-path behaviour as [`Runner::file_exists`].
    ///
    /// # Errors
    /// `Error::NotADirectory` if the path is something else,
    /// `Error::Access` if the query failed for another reason.
    #[instrument(skip(self), level = "debug")]
    pub async fn dir_exists(&self, path: &str) -> Result<bool, Error> {
        let spec = &self.commands().dir_stat;
        self.stat_matches(spec, path, DIR_TYPES)
            .await?
            .map_or(Ok(false), |is_dir| {
                if is_dir {
                    Ok(true)
                } else {
                    Err(Error::NotADirectory(path.to_string()))
                }
            })
    }

    /// Query the type of `path`: `None` if missing, otherwise whether the
    /// reported type is one of `accepted`. Dry-run reports a match.
    async fn stat_matches(
        &self,
        spec: &CommandSpec,
        path: &str,
        accepted: &[&str],
    ) -> Result<Option<bool>, Error> {
        let args = spec.args(&[path]);
        self.log(&self.format_run(&spec.command, &args));
        if self.dryrun() {
            return Ok(Some(true));
        }

        let result = self.execute_run(&spec.command, &args).await;
        if !result.success() {
            if result.stderr.contains(NO_SUCH_FILE) {
                return Ok(None);
            }
            return Err(Error::Access {
                path: path.to_string(),
                output: result.stdout,
            });
        }

        // `<name>:<type>`; the name itself may contain ':'
        let (_, file_type) = result.stdout.rsplit_once(':').ok_or_else(|| Error::Parse {
            command: spec.command.clone(),
            output: result.stdout.clone(),
        })?;
        let file_type = file_type.trim();
        debug!(path = %path, file_type = %file_type, "stat");

        Ok(Some(accepted.contains(&file_type)))
    }

    /// Paths matching a shell glob, expanded by the target's shell
    ///
    /// Always executes, even in dry-run mode, because callers need the
    /// answer to carry on. Output lines are trimmed and blank ones dropped.
    ///
    /// # Errors
    /// `Error::Glob` with the listing's stderr if nothing matched or the
    /// listing failed.
    #[instrument(skip(self), level = "debug")]
    pub async fn glob(&self, pattern: &str) -> Result<Vec<String>, Error> {
        let line = self.commands().glob.line(&[pattern]);
        self.log(&self.format_shell(&line));

        let result = self.execute_shell(&line).await;
        if !result.success() {
            return Err(Error::Glob {
                pattern: pattern.to_string(),
                stderr: result.stderr,
            });
        }

        Ok(result
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(String::from)
            .collect())
    }

    /// Copy files or directories with rsync
    ///
    /// Either side may be remote (`user@host:path`). Goes through
    /// [`Runner::run`], so dry-run only logs.
    ///
    /// # Errors
    /// `Error::Rsync` with rsync's stderr on a non-zero exit
    #[instrument(skip(self), level = "debug")]
    pub async fn rsync(&self, src: &str, dest: &str) -> Result<(), Error> {
        let spec = &self.commands().rsync;
        let result = self.run(&spec.command, &spec.args(&[src, dest])).await;
        if !result.success() {
            return Err(Error::Rsync(result.stderr));
        }
        Ok(())
    }
}
