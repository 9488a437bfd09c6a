use crate::error::{LocalExecutorError, Result};
use async_trait::async_trait;
use autobackup_core::Archiver;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Native zip archiver. Symlinks are followed, so a dangling link aborts
/// the archive like any other traversal error.
///
/// The destination must already exist. A destination removed before the
/// worker opens it is reported as an error instead of being recreated.
#[derive(Debug, Clone, Default)]
pub struct ZipArchiver;

impl ZipArchiver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Archiver for ZipArchiver {
    async fn archive(&self, source_dir: &Path, dest_file: &Path) -> autobackup_core::Result<()> {
        let source = source_dir.to_path_buf();
        let dest = dest_file.to_path_buf();

        tokio::task::spawn_blocking(move || -> Result<()> {
            let file = OpenOptions::new().write(true).truncate(true).open(&dest)?;
            write_zip(&source, &dest, file)
        })
        .await
        .map_err(|e| LocalExecutorError::Other(anyhow::anyhow!("archive worker failed: {}", e)))??;

        Ok(())
    }
}

/// Write `source` into a new zip at `target`, rooted at the source's base name.
pub fn create_zip(source: &Path, target: &Path) -> Result<()> {
    let file = File::create(target)?;
    write_zip(source, target, file)
}

fn write_zip(source: &Path, target: &Path, file: File) -> Result<()> {
    info!("Archiving {:?} into {:?}", source, target);

    let root = archive_root(source);
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let dir_options = SimpleFileOptions::default();
    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut files = 0usize;
    for entry in WalkDir::new(source).follow_links(true).sort_by_file_name() {
        let entry = entry?;
        let name = entry_name(&root, source, entry.path())?;

        if entry.file_type().is_dir() {
            zip.add_directory(name, dir_options)?;
        } else {
            let mut input = File::open(entry.path())?;
            zip.start_file(name, file_options)?;
            io::copy(&mut input, &mut zip)?;
            files += 1;
        }
    }

    let mut writer = zip.finish()?;
    io::Write::flush(&mut writer)?;

    debug!("Archived {} files from {:?}", files, source);

    Ok(())
}

fn archive_root(source: &Path) -> String {
    source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "backup".to_string())
}

fn entry_name(root: &str, source: &Path, path: &Path) -> Result<String> {
    let relative: PathBuf = path
        .strip_prefix(source)
        .map_err(|e| LocalExecutorError::Other(anyhow::anyhow!("{:?} outside of {:?}: {}", path, source, e)))?
        .to_path_buf();

    let mut name = root.to_string();
    for component in relative.components() {
        name.push('/');
        name.push_str(&component.as_os_str().to_string_lossy());
    }
    Ok(name)
}
