use std::fs;
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::checkpoint::checkpoint::{file_name, parse_file_name, Checkpoint};
use crate::checkpoint::store::CheckpointStore;
use crate::error::{Result, TuneError};

/// Checkpoints stored as `epoch=<N>.checkpoint.json` files in one directory.
///
/// The directory is created on first use. A missing directory reads as an
/// empty store.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> DirStore {
        DirStore { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, epoch: usize) -> PathBuf {
        self.dir.join(file_name(epoch))
    }

    /// Checkpoint file names present in the directory, with their epochs.
    fn checkpoint_files(&self) -> Result<Vec<(usize, PathBuf)>> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                fs::create_dir_all(&self.dir)?;
                return Ok(Vec::new());
            }
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name();
            if let Some(epoch) = name.to_str().and_then(parse_file_name) {
                files.push((epoch, entry.path()));
            }
        }
        files.sort_by_key(|(epoch, _)| *epoch);
        Ok(files)
    }

    /// `epoch=<N>.checkpoint.json.tmp` files left by an interrupted save.
    fn leftover_temp_files(&self) -> Result<Vec<PathBuf>> {
        let mut leftovers = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let is_temp = name
                .to_str()
                .and_then(|n| n.strip_suffix(".tmp"))
                .and_then(parse_file_name)
                .is_some();
            if is_temp {
                leftovers.push(entry.path());
            }
        }
        Ok(leftovers)
    }
}

fn temp_path(path: &Path) -> PathBuf {
    path.with_extension("json.tmp")
}

fn write_then_rename(checkpoint: &Checkpoint, tmp: &Path, path: &Path) -> Result<()> {
    let file = fs::File::create(tmp)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, checkpoint)?;
    writer.flush()?;
    writer.get_ref().sync_all()?;
    drop(writer);
    fs::rename(tmp, path)?;
    Ok(())
}

impl CheckpointStore for DirStore {
    /// Writes to a temporary file and renames it into place, so a crash
    /// mid-write never leaves a truncated checkpoint under a valid name.
    /// The temporary file is removed when any step fails.
    fn save(&mut self, checkpoint: &Checkpoint) -> Result<()> {
        checkpoint.ensure_encodable()?;
        fs::create_dir_all(&self.dir)?;
        let path = self.path_for(checkpoint.epoch);
        let tmp = temp_path(&path);

        if let Err(e) = write_then_rename(checkpoint, &tmp, &path) {
            if let Err(cleanup) = fs::remove_file(&tmp) {
                if cleanup.kind() != ErrorKind::NotFound {
                    log::warn!("could not remove {}: {}", tmp.display(), cleanup);
                }
            }
            return Err(e);
        }
        log::debug!("saved checkpoint {}", path.display());
        Ok(())
    }

    fn load(&self, epoch: usize) -> Result<Option<Checkpoint>> {
        let path = self.path_for(epoch);
        let file = match fs::File::open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let checkpoint: Checkpoint = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| TuneError::CorruptCheckpoint { path: path.clone(), reason: e.to_string() })?;
        if checkpoint.epoch != epoch {
            return Err(TuneError::CorruptCheckpoint {
                path,
                reason: format!("file holds epoch {}", checkpoint.epoch),
            });
        }
        Ok(Some(checkpoint))
    }

    fn epochs(&self) -> Result<Vec<usize>> {
        Ok(self.checkpoint_files()?.into_iter().map(|(epoch, _)| epoch).collect())
    }

    fn clear(&mut self) -> Result<usize> {
        let files = self.checkpoint_files()?;
        for (_, path) in &files {
            fs::remove_file(path)?;
        }
        for path in self.leftover_temp_files()? {
            log::debug!("removing leftover {}", path.display());
            fs::remove_file(&path)?;
        }
        log::info!("removed {} checkpoints from {}", files.len(), self.dir.display());
        Ok(files.len())
    }

    fn location(&self) -> String {
        self.dir.display().to_string()
    }
}
