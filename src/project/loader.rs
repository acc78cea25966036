use crate::config::ProjectConfig;
use crate::project::{Project, ProjectError};
use std::fs;
use std::path::Path;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Read every file under `dir` into a new [`Project`] named after the
/// directory.
pub fn load_project(dir: &Path, config: &ProjectConfig) -> Result<Project, ProjectError> {
    let name = dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "project".to_string());
    let project = Project::new(&name);

    let walker = WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            entry.depth() == 0
                || !config
                    .ignore
                    .iter()
                    .any(|ignored| entry.file_name().to_string_lossy() == ignored.as_str())
        });

    let mut loaded = 0usize;
    for entry in walker {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let metadata = entry.metadata()?;
        if metadata.len() > config.max_file_bytes {
            debug!(path = %path.display(), size = metadata.len(), "skipping large file");
            continue;
        }

        let bytes = fs::read(path).map_err(|source| ProjectError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let Ok(content) = String::from_utf8(bytes) else {
            debug!(path = %path.display(), "skipping non-UTF-8 file");
            continue;
        };

        let relative = path.strip_prefix(dir).unwrap_or(path);
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        project.add_file(&relative, content)?;
        loaded += 1;
    }

    info!(root = %dir.display(), files = loaded, "loaded project");
    Ok(project)
}
