//! Per-run working folder.

use anyhow::Context;
use std::path::{Path, PathBuf};

pub const RUN_PREFIX: &str = "superblock_run_";
pub const MAX_RUNS: u32 = 1000;

/// `superblock_run_<n>` with its three subfolders and the process log.
#[derive(Debug, Clone)]
pub struct RunFolder {
    pub root: PathBuf,
    pub prepared_input: PathBuf,
    pub temp: PathBuf,
    pub final_output: PathBuf,
    pub log_file: PathBuf,
}

impl RunFolder {
    /// Claim the first free `superblock_run_<n>` under `workspace`.
    pub fn create(workspace: &Path) -> anyhow::Result<Self> {
        std::fs::create_dir_all(workspace)
            .with_context(|| format!("Cannot create workspace {}", workspace.display()))?;

        for n in 1..=MAX_RUNS {
            let root = workspace.join(format!("{RUN_PREFIX}{n}"));
            match std::fs::create_dir(&root) {
                Ok(()) => return Self::populate(root),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => continue,
                Err(e) => {
                    return Err(e).with_context(|| format!("Cannot create {}", root.display()));
                }
            }
        }
        anyhow::bail!(
            "No free run folder in {} ({MAX_RUNS} runs exist)",
            workspace.display()
        )
    }

    fn populate(root: PathBuf) -> anyhow::Result<Self> {
        let folder = Self {
            prepared_input: root.join("prepared_input"),
            temp: root.join("temp"),
            final_output: root.join("final_output"),
            log_file: root.join("process.log"),
            root,
        };
        for dir in [&folder.prepared_input, &folder.temp, &folder.final_output] {
            std::fs::create_dir(dir).with_context(|| format!("Cannot create {}", dir.display()))?;
        }
        Ok(folder)
    }

    /// Copy an input dataset into `prepared_input/<role>/` and return the
    /// copy. Each role gets its own folder so equally named inputs coexist.
    pub fn stage_input(&self, source: &Path, role: &str) -> anyhow::Result<PathBuf> {
        let name = source
            .file_name()
            .with_context(|| format!("Not a file path: {}", source.display()))?;
        let dir = self.prepared_input.join(role);
        std::fs::create_dir_all(&dir).with_context(|| format!("Cannot create {}", dir.display()))?;
        let target = dir.join(name);
        std::fs::copy(source, &target)
            .with_context(|| format!("Cannot copy {} to {}", source.display(), target.display()))?;
        Ok(target)
    }

    pub fn remove(self) -> anyhow::Result<()> {
        std::fs::remove_dir_all(&self.root)
            .with_context(|| format!("Cannot remove {}", self.root.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_folders_are_numbered() {
        let dir = tempfile::tempdir().unwrap();
        let first = RunFolder::create(dir.path()).unwrap();
        let second = RunFolder::create(dir.path()).unwrap();

        assert!(first.root.ends_with("superblock_run_1"));
        assert!(second.root.ends_with("superblock_run_2"));
        assert!(first.prepared_input.is_dir());
        assert!(first.temp.is_dir());
        assert!(first.final_output.is_dir());
    }

    #[test]
    fn test_freed_number_is_reused() {
        let dir = tempfile::tempdir().unwrap();
        let first = RunFolder::create(dir.path()).unwrap();
        let _second = RunFolder::create(dir.path()).unwrap();
        first.remove().unwrap();

        let third = RunFolder::create(dir.path()).unwrap();
        assert!(third.root.ends_with("superblock_run_1"));
    }

    #[test]
    fn test_stage_input_copies() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("blocks.csv");
        std::fs::write(&source, "fid\n1\n").unwrap();

        let run = RunFolder::create(&dir.path().join("ws")).unwrap();
        let staged = run.stage_input(&source, "candidates").unwrap();
        assert_eq!(staged, run.prepared_input.join("candidates").join("blocks.csv"));
        assert_eq!(std::fs::read_to_string(staged).unwrap(), "fid\n1\n");
        assert!(source.exists());
    }

    #[test]
    fn test_same_file_name_in_two_roles() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("blocks")).unwrap();
        std::fs::create_dir(dir.path().join("buildings")).unwrap();
        let blocks = dir.path().join("blocks").join("data.csv");
        let buildings = dir.path().join("buildings").join("data.csv");
        std::fs::write(&blocks, "fid,width,height\n").unwrap();
        std::fs::write(&buildings, "parcel_id,GKLAS\n").unwrap();

        let run = RunFolder::create(&dir.path().join("ws")).unwrap();
        let staged_blocks = run.stage_input(&blocks, "candidates").unwrap();
        let staged_buildings = run.stage_input(&buildings, "buildings").unwrap();

        assert_ne!(staged_blocks, staged_buildings);
        assert_eq!(std::fs::read_to_string(staged_blocks).unwrap(), "fid,width,height\n");
        assert_eq!(std::fs::read_to_string(staged_buildings).unwrap(), "parcel_id,GKLAS\n");
    }
}
