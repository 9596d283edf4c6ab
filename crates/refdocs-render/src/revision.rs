use std::path::Path;
use std::process::Command;

use tracing::debug;

/// Short commit hash of the repository at `dir`, if git can tell.
///
/// Never fails: a missing `git`, a directory outside a repository or any
/// other problem yields `None`.
pub fn current_revision(dir: &Path) -> Option<String> {
    let output = match Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .current_dir(dir)
        .output()
    {
        Ok(output) => output,
        Err(err) => {
            debug!("git rev-parse unavailable: {}", err);
            return None;
        }
    };

    if !output.status.success() {
        debug!("git rev-parse exited with {}", output.status);
        return None;
    }

    let revision = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!revision.is_empty()).then_some(revision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outside_repository_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(current_revision(&dir.path().join("missing")), None);
    }
}
