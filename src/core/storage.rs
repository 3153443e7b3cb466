use crate::core::plan::CoachingPlan;
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs as std_fs;
use std::path::{Path, PathBuf};

use tokio::fs;

const REPORTS_DIR: &str = "reports";
const PLANS_DIR: &str = "plans";
const CALENDARS_DIR: &str = "calendars";
const REPORT_PREFIX: &str = "coaching_";
const REPORT_SUFFIX: &str = ".md";
const PLAN_PREFIX: &str = "plan_";
const PLAN_SUFFIX: &str = ".json";
const CALENDAR_PREFIX: &str = "routine_";
const CALENDAR_SUFFIX: &str = ".ics";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub file_type: FileType,
    pub size: u64,
    pub modified: std::time::SystemTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FileType {
    Report,
    Plan,
    Calendar,
}

impl FileType {
    pub fn label(&self) -> &'static str {
        match self {
            FileType::Report => "Report",
            FileType::Plan => "Plan",
            FileType::Calendar => "Calendar",
        }
    }
}

/// Export-only artifact store. Saving is always an explicit user action and
/// runs never read these files back to short-circuit work.
pub struct StorageService;

impl StorageService {
    fn ensure_directories() -> Result<()> {
        ensure_directory(Path::new(REPORTS_DIR))?;
        ensure_directory(Path::new(PLANS_DIR))?;
        ensure_directory(Path::new(CALENDARS_DIR))?;
        Ok(())
    }

    fn session_stamp() -> String {
        chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
    }

    pub async fn save_report(content: &str) -> Result<PathBuf> {
        Self::ensure_directories()?;
        let path = Path::new(REPORTS_DIR).join(format!(
            "{REPORT_PREFIX}{}{REPORT_SUFFIX}",
            Self::session_stamp()
        ));
        fs::write(&path, content).await?;
        Ok(path)
    }

    pub async fn save_plan(plan: &CoachingPlan) -> Result<PathBuf> {
        Self::ensure_directories()?;
        let path = Path::new(PLANS_DIR).join(format!(
            "{PLAN_PREFIX}{}{PLAN_SUFFIX}",
            Self::session_stamp()
        ));
        let pretty = serde_json::to_string_pretty(plan)?;
        fs::write(&path, &pretty).await?;
        Ok(path)
    }

    pub async fn save_calendar(ics: &str) -> Result<PathBuf> {
        Self::ensure_directories()?;
        let path = Path::new(CALENDARS_DIR).join(format!(
            "{CALENDAR_PREFIX}{}{CALENDAR_SUFFIX}",
            Self::session_stamp()
        ));
        fs::write(&path, ics).await?;
        Ok(path)
    }

    pub fn list_files() -> Result<Vec<FileEntry>> {
        Self::ensure_directories()?;
        let mut files = Vec::new();

        scan_directory(REPORTS_DIR, REPORT_PREFIX, REPORT_SUFFIX, FileType::Report, &mut files)?;
        scan_directory(PLANS_DIR, PLAN_PREFIX, PLAN_SUFFIX, FileType::Plan, &mut files)?;
        scan_directory(
            CALENDARS_DIR,
            CALENDAR_PREFIX,
            CALENDAR_SUFFIX,
            FileType::Calendar,
            &mut files,
        )?;

        // Newest first.
        files.sort_by(|a, b| b.modified.cmp(&a.modified));

        Ok(files)
    }

    pub fn delete_file(path: &Path) -> Result<()> {
        Self::ensure_directories()?;
        ensure_managed_path(path)?;
        std_fs::remove_file(path)?;
        Ok(())
    }
}

fn scan_directory(
    dir: &str,
    prefix: &str,
    suffix: &str,
    file_type: FileType,
    files: &mut Vec<FileEntry>,
) -> Result<()> {
    let Ok(entries) = std_fs::read_dir(dir) else {
        return Ok(());
    };

    for entry in entries {
        let entry = entry?;
        let path = entry.path();

        if let Some(name) = path.file_name().and_then(|n| n.to_str())
            && name.starts_with(prefix)
            && name.ends_with(suffix)
        {
            let metadata = entry.metadata()?;
            files.push(FileEntry {
                path: path.clone(),
                name: name.to_string(),
                file_type,
                size: metadata.len(),
                modified: metadata.modified()?,
            });
        }
    }

    Ok(())
}

fn ensure_directory(path: &Path) -> Result<()> {
    std_fs::create_dir_all(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let metadata = std_fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        if permissions.mode() & 0o777 != 0o700 {
            permissions.set_mode(0o700);
            std_fs::set_permissions(path, permissions)?;
        }
    }

    Ok(())
}

fn ensure_managed_path(path: &Path) -> Result<()> {
    let canonical = path
        .canonicalize()
        .map_err(|_| Error::custom("Target file does not exist or cannot be resolved"))?;

    let allowed = [REPORTS_DIR, PLANS_DIR, CALENDARS_DIR]
        .iter()
        .filter_map(|dir| Path::new(dir).canonicalize().ok())
        .any(|base| canonical.starts_with(base));

    if !allowed {
        return Err(Error::custom(
            "Refusing to operate on files outside managed artifact directories",
        ));
    }

    Ok(())
}
