/*
 * `ItemProcessor` that renames photos after their capture time. The capture
 * timestamp is read from the photo's EXIF data (`DateTimeOriginal`, falling
 * back to `DateTime`), turned into a file name such as
 * `2021-05-01 10-20-30.jpg` (source extension kept, case preserved) and the
 * photo is copied or moved to that name directly inside the destination
 * folder.
 *
 * Two photos taken within the same second map to the same destination name;
 * the later one replaces the earlier one. Photos produce no intermediate
 * progress.
 */
use super::config::PhotoAction;
use super::item_processor::{ItemError, ItemProcessor, Result};
use exif::{In, Reader, Tag, Value};
use std::fs::{self, File, FileTimes};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};
use time::PrimitiveDateTime;
use time::format_description::BorrowedFormatItem;
use time::macros::format_description;

const EXIF_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]:[month]:[day] [hour]:[minute]:[second]");
const FILE_NAME_TIMESTAMP_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day] [hour]-[minute]-[second]");

const CAPTURE_TIME_TAGS: [Tag; 2] = [Tag::DateTimeOriginal, Tag::DateTime];

pub struct PhotoRenamer {
    source_root: PathBuf,
    dest_root: PathBuf,
    action: PhotoAction,
}

impl PhotoRenamer {
    pub fn new(source_root: PathBuf, dest_root: PathBuf, action: PhotoAction) -> Self {
        PhotoRenamer {
            source_root,
            dest_root,
            action,
        }
    }
}

/*
 * Reads the raw EXIF capture timestamp text (e.g. "2021:05:01 10:20:30")
 * from an image file.
 */
pub fn read_capture_timestamp(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|source| ItemError::IoFailure {
        path: path.to_path_buf(),
        source,
    })?;
    let exif_data = Reader::new()
        .read_from_container(&mut BufReader::new(file))
        .map_err(|err| ItemError::MetadataUnreadable {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })?;

    for tag in CAPTURE_TIME_TAGS {
        let Some(field) = exif_data.get_field(tag, In::PRIMARY) else {
            continue;
        };
        if let Value::Ascii(ref values) = field.value {
            if let Some(first) = values.first() {
                return Ok(String::from_utf8_lossy(first).trim().to_string());
            }
        }
    }
    Err(ItemError::MetadataUnreadable {
        path: path.to_path_buf(),
        reason: "no capture timestamp in EXIF data".to_string(),
    })
}

/*
 * Builds the destination file name for a photo: the timestamp with ':'
 * replaced by '-', followed by the source file's extension. Timestamps that
 * are not a valid "YYYY:MM:DD HH:MM:SS" date (cameras write blanks when the
 * clock was never set) are rejected.
 */
pub fn destination_file_name(
    timestamp: &str,
    source_path: &Path,
) -> std::result::Result<String, String> {
    // Stricter than a plain ':' to '-' substitution: zeroed dates and trailing subseconds are rejected too.
    let captured = PrimitiveDateTime::parse(timestamp, EXIF_TIMESTAMP_FORMAT)
        .map_err(|err| format!("invalid capture timestamp '{timestamp}': {err}"))?;
    let stem = captured
        .format(FILE_NAME_TIMESTAMP_FORMAT)
        .map_err(|err| format!("cannot format capture timestamp '{timestamp}': {err}"))?;
    Ok(match source_path.extension() {
        Some(extension) => format!("{stem}.{}", extension.to_string_lossy()),
        None => stem,
    })
}

/*
 * Copies `source` to `destination`, following symlinks, and carries over the
 * modification and access times. Failing to carry over the times is logged
 * but not treated as a failed copy.
 */
fn copy_with_metadata(source: &Path, destination: &Path) -> io::Result<()> {
    fs::copy(source, destination)?;
    let metadata = fs::metadata(source)?;
    let mut times = FileTimes::new();
    if let Ok(modified) = metadata.modified() {
        times = times.set_modified(modified);
    }
    if let Ok(accessed) = metadata.accessed() {
        times = times.set_accessed(accessed);
    }
    let applied = File::options()
        .write(true)
        .open(destination)
        .and_then(|file| file.set_times(times));
    if let Err(err) = applied {
        log::debug!("PhotoRenamer: Could not carry file times over to {destination:?}: {err}");
    }
    Ok(())
}

// True if both paths resolve to the same existing file.
fn is_same_file(source: &Path, destination: &Path) -> bool {
    match (fs::canonicalize(source), fs::canonicalize(destination)) {
        (Ok(source), Ok(destination)) => source == destination,
        _ => false,
    }
}

fn move_file(source: &Path, destination: &Path) -> io::Result<()> {
    match fs::rename(source, destination) {
        Ok(()) => Ok(()),
        Err(err) => {
            // Typically a move across file systems.
            log::debug!(
                "PhotoRenamer: Rename {source:?} -> {destination:?} failed ({err}); copying instead."
            );
            copy_with_metadata(source, destination)?;
            fs::remove_file(source)
        }
    }
}

impl ItemProcessor for PhotoRenamer {
    fn name(&self) -> &'static str {
        "PhotoRenamer"
    }

    fn required_directories(&self) -> Vec<PathBuf> {
        vec![self.dest_root.clone()]
    }

    fn process(&self, item_name: &str, _progress: &mut dyn FnMut(f64)) -> Result<()> {
        let source = self.source_root.join(item_name);
        let timestamp = read_capture_timestamp(&source)?;
        let file_name = destination_file_name(&timestamp, &source).map_err(|reason| {
            ItemError::MetadataUnreadable {
                path: source.clone(),
                reason,
            }
        })?;
        let destination = self.dest_root.join(&file_name);
        if is_same_file(&source, &destination) {
            log::info!("PhotoRenamer: {source:?} already carries its capture-time name.");
            return Ok(());
        }
        if destination.exists() {
            log::warn!(
                "PhotoRenamer: Destination {destination:?} already exists and will be replaced by {source:?}."
            );
        }

        let transferred = match self.action {
            PhotoAction::CopyAndRename => copy_with_metadata(&source, &destination),
            PhotoAction::MoveAndRename => move_file(&source, &destination),
        };
        transferred.map_err(|io_err| ItemError::IoFailure {
            path: source.clone(),
            source: io_err,
        })?;
        log::info!(
            "PhotoRenamer: {} {source:?} -> {destination:?}.",
            self.action
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /*
     * Builds a minimal JPEG whose only content is an APP1 EXIF segment holding
     * `DateTimeOriginal`. `timestamp` must be the 19-character EXIF form,
     * e.g. "2021:05:01 10:20:30".
     */
    pub(crate) fn jpeg_with_capture_time(timestamp: &str) -> Vec<u8> {
        assert_eq!(timestamp.len(), 19, "EXIF timestamps are 19 characters");
        let mut tiff: Vec<u8> = Vec::new();
        // Little-endian TIFF header, IFD0 at offset 8.
        tiff.extend_from_slice(b"II");
        tiff.extend_from_slice(&42u16.to_le_bytes());
        tiff.extend_from_slice(&8u32.to_le_bytes());
        // IFD0: one entry pointing at the Exif IFD (offset 26).
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x8769u16.to_le_bytes());
        tiff.extend_from_slice(&4u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&26u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());
        // Exif IFD: DateTimeOriginal, ASCII, 20 bytes at offset 44.
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x9003u16.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes());
        tiff.extend_from_slice(&20u32.to_le_bytes());
        tiff.extend_from_slice(&44u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());
        tiff.extend_from_slice(timestamp.as_bytes());
        tiff.push(0);

        let segment_length = (2 + 6 + tiff.len()) as u16;
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        jpeg.extend_from_slice(&segment_length.to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::jpeg_with_capture_time;
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_reads_date_time_original() -> io::Result<()> {
        let dir = tempdir()?;
        let photo = dir.path().join("IMG_0001.JPG");
        fs::write(&photo, jpeg_with_capture_time("2021:05:01 10:20:30"))?;
        assert_eq!(
            read_capture_timestamp(&photo).unwrap(),
            "2021:05:01 10:20:30"
        );
        Ok(())
    }

    #[test]
    fn test_destination_name_replaces_colons_and_keeps_extension_case() {
        assert_eq!(
            destination_file_name("2021:05:01 10:20:30", Path::new("a/IMG_1.jpg")).unwrap(),
            "2021-05-01 10-20-30.jpg"
        );
        assert_eq!(
            destination_file_name("2021:05:01 10:20:30", Path::new("IMG_1.JPG")).unwrap(),
            "2021-05-01 10-20-30.JPG"
        );
        assert!(destination_file_name("    :  :     :  :  ", Path::new("x.jpg")).is_err());
        assert!(destination_file_name("2021:13:01 10:20:30", Path::new("x.jpg")).is_err());
        assert!(destination_file_name("0000:00:00 00:00:00", Path::new("x.jpg")).is_err());
    }

    #[test]
    fn test_copy_and_rename_keeps_source() -> io::Result<()> {
        let source_root = tempdir()?;
        let dest_root = tempdir()?;
        fs::create_dir_all(source_root.path().join("2021"))?;
        let source = source_root.path().join("2021").join("IMG_0001.jpg");
        let content = jpeg_with_capture_time("2021:05:01 10:20:30");
        fs::write(&source, &content)?;

        let renamer = PhotoRenamer::new(
            source_root.path().to_path_buf(),
            dest_root.path().to_path_buf(),
            PhotoAction::CopyAndRename,
        );
        renamer.process("2021/IMG_0001.jpg", &mut |_| {}).unwrap();

        let destination = dest_root.path().join("2021-05-01 10-20-30.jpg");
        assert!(source.exists(), "Copy must keep the source file.");
        assert_eq!(fs::read(&destination)?, content);
        assert_eq!(
            fs::metadata(&destination)?.modified()?,
            fs::metadata(&source)?.modified()?
        );
        Ok(())
    }

    #[test]
    fn test_move_and_rename_removes_source() -> io::Result<()> {
        let source_root = tempdir()?;
        let dest_root = tempdir()?;
        let source = source_root.path().join("IMG_0002.JPG");
        fs::write(&source, jpeg_with_capture_time("2021:05:01 10:20:30"))?;

        let renamer = PhotoRenamer::new(
            source_root.path().to_path_buf(),
            dest_root.path().to_path_buf(),
            PhotoAction::MoveAndRename,
        );
        renamer.process("IMG_0002.JPG", &mut |_| {}).unwrap();

        assert!(!source.exists(), "Move must remove the source file.");
        assert!(dest_root.path().join("2021-05-01 10-20-30.JPG").exists());
        Ok(())
    }

    #[test]
    fn test_same_second_photos_overwrite_each_other() -> io::Result<()> {
        let source_root = tempdir()?;
        let dest_root = tempdir()?;
        let mut first = jpeg_with_capture_time("2021:05:01 10:20:30");
        first.extend_from_slice(b"first");
        let mut second = jpeg_with_capture_time("2021:05:01 10:20:30");
        second.extend_from_slice(b"second");
        fs::write(source_root.path().join("a.jpg"), &first)?;
        fs::write(source_root.path().join("b.jpg"), &second)?;

        let renamer = PhotoRenamer::new(
            source_root.path().to_path_buf(),
            dest_root.path().to_path_buf(),
            PhotoAction::CopyAndRename,
        );
        renamer.process("a.jpg", &mut |_| {}).unwrap();
        renamer.process("b.jpg", &mut |_| {}).unwrap();

        let entries: Vec<_> = fs::read_dir(dest_root.path())?.collect();
        assert_eq!(entries.len(), 1);
        assert_eq!(
            fs::read(dest_root.path().join("2021-05-01 10-20-30.jpg"))?,
            second
        );
        Ok(())
    }

    #[test]
    fn test_already_renamed_photo_in_its_own_folder_is_left_intact() -> io::Result<()> {
        let root = tempdir()?;
        let photo = root.path().join("2021-05-01 10-20-30.jpg");
        let content = jpeg_with_capture_time("2021:05:01 10:20:30");
        fs::write(&photo, &content)?;

        for action in [PhotoAction::CopyAndRename, PhotoAction::MoveAndRename] {
            let renamer =
                PhotoRenamer::new(root.path().to_path_buf(), root.path().to_path_buf(), action);
            renamer
                .process("2021-05-01 10-20-30.jpg", &mut |_| {})
                .unwrap();
            assert_eq!(fs::read(&photo)?, content);
        }
        assert_eq!(fs::read_dir(root.path())?.count(), 1);
        Ok(())
    }

    #[test]
    fn test_photo_without_exif_is_unreadable_and_untouched() -> io::Result<()> {
        let source_root = tempdir()?;
        let dest_root = tempdir()?;
        let source = source_root.path().join("scan.png");
        fs::write(&source, b"\x89PNG\r\n\x1a\nnot really a png")?;

        let renamer = PhotoRenamer::new(
            source_root.path().to_path_buf(),
            dest_root.path().to_path_buf(),
            PhotoAction::MoveAndRename,
        );
        let result = renamer.process("scan.png", &mut |_| {});

        assert!(matches!(result, Err(ItemError::MetadataUnreadable { .. })));
        assert!(source.exists());
        assert_eq!(fs::read_dir(dest_root.path())?.count(), 0);
        Ok(())
    }

    #[test]
    fn test_missing_source_is_io_failure() {
        let source_root = tempdir().unwrap();
        let renamer = PhotoRenamer::new(
            source_root.path().to_path_buf(),
            source_root.path().to_path_buf(),
            PhotoAction::CopyAndRename,
        );
        let result = renamer.process("gone.jpg", &mut |_| {});
        assert!(matches!(result, Err(ItemError::IoFailure { .. })));
    }
}
