use std::path::Path;

use tokio::{
    fs::File,
    io::{AsyncWriteExt, BufWriter},
};

use crate::{
    errors::ManifestError,
    internal::{
        entry::{FileEntry, format_mtime},
        manifest::layout::{ENTRIES_CSV_FIELDS, ENTRIES_FILE_NAME, METADATA_FILE_NAME},
    },
};

/// Check that `entry` encodes as a row [`parse_entry_line`] reads back: a non-empty name and no
/// separator or line break in any text field.
///
/// [`parse_entry_line`]: crate::internal::manifest::reader::parse_entry_line
pub fn validate_entry(entry: &FileEntry) -> Result<(), ManifestError> {
    if entry.name.is_empty() {
        return Err(ManifestError::invalid_entry(&entry.name, "name is empty"));
    }
    let fields = [
        ("name", entry.name.as_str()),
        ("path", entry.path.as_str()),
        ("sha256", entry.sha256()),
    ];
    for (field, value) in fields {
        if value.contains([',', '\n', '\r']) {
            return Err(ManifestError::invalid_entry(
                &entry.name,
                format!("{field} contains a separator or line break"),
            ));
        }
    }
    Ok(())
}

/// Encode one entry as a `name,path,size,sha256,mtime` row, without the line terminator.
pub fn render_entry_line(entry: &FileEntry) -> String {
    let mtime = entry
        .modified_time
        .as_ref()
        .map(format_mtime)
        .unwrap_or_default();
    format!(
        "{},{},{},{},{}",
        entry.name,
        entry.path,
        entry.size,
        entry.sha256(),
        mtime
    )
}

/// Sort `entries` by modification time (stable, entries without a time first) and write them to
/// `dir/entries.csv`, replacing any previous file.
pub(crate) async fn write_entries(
    dir: &Path,
    entries: &mut [FileEntry],
) -> Result<(), ManifestError> {
    entries.sort_by(|a, b| a.modified_time.cmp(&b.modified_time));

    let file = File::create(dir.join(ENTRIES_FILE_NAME)).await?;
    let mut writer = BufWriter::new(file);
    writer.write_all(ENTRIES_CSV_FIELDS.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    for entry in entries.iter() {
        writer.write_all(render_entry_line(entry).as_bytes()).await?;
        writer.write_all(b"\n").await?;
    }
    writer.flush().await?;
    Ok(())
}

pub(crate) async fn write_metadata(dir: &Path, document: &str) -> Result<(), ManifestError> {
    tokio::fs::write(dir.join(METADATA_FILE_NAME), document).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;

    use super::*;

    #[test]
    fn test_render_entry_line() {
        let mtime = DateTime::parse_from_rfc3339("2024-05-17T08:30:01.5Z").unwrap();
        let entry = FileEntry::new("a.txt", "/x/a.txt", 10)
            .with_sha256("aa")
            .with_modified_time(mtime);
        assert_eq!(
            render_entry_line(&entry),
            "a.txt,/x/a.txt,10,aa,2024-05-17T08:30:01.5Z"
        );

        let bare = FileEntry::new("b.txt", "/x/b.txt", 0);
        assert_eq!(render_entry_line(&bare), "b.txt,/x/b.txt,0,,");
    }

    #[test]
    fn test_validate_entry() {
        assert!(validate_entry(&FileEntry::new("a.txt", "/x/a.txt", 1)).is_ok());

        let rejected = [
            FileEntry::new("", "/x/empty", 1),
            FileEntry::new("a,b.txt", "/x/a.txt", 1),
            FileEntry::new("a.txt", "/x/a,b.txt", 1),
            FileEntry::new("a\nb.txt", "/x/a.txt", 1),
            FileEntry::new("a.txt", "/x/a\r.txt", 1),
            FileEntry::new("a.txt", "/x/a.txt", 1).with_sha256("aa,bb"),
        ];
        for entry in &rejected {
            assert!(
                matches!(validate_entry(entry), Err(ManifestError::InvalidEntry { .. })),
                "{entry:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn test_write_entries_sorts_stably() {
        let dir = tempfile::tempdir().unwrap();
        let t0 = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap();
        let t1 = DateTime::parse_from_rfc3339("2024-01-02T00:00:00Z").unwrap();
        let mut entries = vec![
            FileEntry::new("late", "/late", 1).with_modified_time(t1),
            FileEntry::new("first-tie", "/first-tie", 2).with_modified_time(t0),
            FileEntry::new("second-tie", "/second-tie", 3).with_modified_time(t0),
        ];

        write_entries(dir.path(), &mut entries).await.unwrap();

        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["first-tie", "second-tie", "late"]);

        let text = tokio::fs::read_to_string(dir.path().join(ENTRIES_FILE_NAME))
            .await
            .unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], ENTRIES_CSV_FIELDS);
        assert!(lines[1].starts_with("first-tie,"));
        assert!(lines[3].starts_with("late,"));
        assert_eq!(lines.len(), 4);
    }
}
