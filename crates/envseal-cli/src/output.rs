//! Output file naming and writing.

use std::path::{Path, PathBuf};

use anyhow::Context;

/// File name of an input path, for deriving output names.
fn base_name(input: &Path) -> anyhow::Result<String> {
    input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", input.display()))
}

/// `data.csv` → `Mdata.csv.xml`
pub fn sealed_file_name(input: &Path) -> anyhow::Result<String> {
    Ok(format!("M{}.xml", base_name(input)?))
}

/// `Mdata.csv.xml` → `Mdata.csv.xml.encdata`
pub fn opened_file_name(input: &Path) -> anyhow::Result<String> {
    Ok(format!("{}.encdata", base_name(input)?))
}

/// Resolve the output path: an explicit `--out`, else `default_name` in the
/// current directory.
pub fn resolve_output(out: Option<&Path>, default_name: String) -> PathBuf {
    out.map_or_else(|| PathBuf::from(default_name), Path::to_path_buf)
}

/// Write `contents` to a temporary sibling, then rename it over `path`.
///
/// Readers never see a partially written file.
pub fn write_atomically(path: &Path, contents: &[u8]) -> anyhow::Result<()> {
    let mut tmp_name = path
        .file_name()
        .with_context(|| format!("{} has no file name", path.display()))?
        .to_os_string();
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }

    std::fs::write(&tmp, contents)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o660))?;
    }
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move {} into place", path.display()))?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_legacy_convention() {
        assert_eq!(
            sealed_file_name(Path::new("/data/in/report.csv")).unwrap(),
            "Mreport.csv.xml"
        );
        assert_eq!(
            opened_file_name(Path::new("inbox/Mreport.csv.xml")).unwrap(),
            "Mreport.csv.xml.encdata"
        );
        assert!(sealed_file_name(Path::new("/")).is_err());
    }

    #[test]
    fn explicit_output_wins() {
        assert_eq!(
            resolve_output(Some(Path::new("/tmp/x.xml")), "Mdefault.xml".into()),
            PathBuf::from("/tmp/x.xml")
        );
        assert_eq!(
            resolve_output(None, "Mdefault.xml".into()),
            PathBuf::from("Mdefault.xml")
        );
    }

    #[test]
    fn atomic_write_replaces_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.xml");
        std::fs::write(&path, "old").unwrap();
        write_atomically(&path, b"new").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "new");
        assert!(!dir.path().join("out.xml.tmp").exists());
    }
}
