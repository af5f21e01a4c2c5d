use super::{ChangeContext, ChangeOutcome};
use crate::config::{ChangeKind, CommandChange};
use crate::error::{Error, Result};
use crate::runner::CommandSpec;
use std::path::Path;
use tracing::{debug, info};

/// Run a command change in the working copy.
///
/// The command sees `VERSION` set to the promoted version, followed by the
/// change's own environment. A non-zero exit fails the change with the
/// command's output.
pub async fn apply_command(
    ctx: &ChangeContext<'_>,
    dir: &Path,
    command: &CommandChange,
) -> Result<ChangeOutcome> {
    if command.name.trim().is_empty() {
        return Err(Error::Strategy {
            kind: ChangeKind::Command,
            message: "no command name specified".to_string(),
        });
    }

    let mut env = vec![("VERSION".to_string(), ctx.version.to_string())];
    env.extend(command.env.iter().map(|e| (e.name.clone(), e.value.clone())));

    let spec = CommandSpec {
        name: command.name.clone(),
        args: command.args.clone(),
        dir: dir.to_path_buf(),
        env,
    };

    info!(command = %spec.cli(), dir = %dir.display(), "running command");
    let output = ctx.runner.run(&spec).await?.check(&spec)?;
    debug!(stdout = %output.stdout.trim_end(), "command output");
    Ok(ChangeOutcome::Ran)
}
