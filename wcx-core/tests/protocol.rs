//! Host-style call sequences against real archives and a recording backend.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf, MAIN_SEPARATOR};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;

use bsarc::testing::{Ba2Builder, BsaBuilder};
use bsarc::{ArchiveEntry, ArchiveReader, FormatKind};
use wcx_core::wcxhead::{self, HEADER_DATA, HEADER_DATA_EX, HEADER_DATA_EX_W};
use wcx_core::{ArchiveManager, ArchiveOpener, OpenMode, Operation, WcxError};

fn write_archive(dir: &Path, name: &str, bytes: Vec<u8>) -> PathBuf {
    let path = dir.join(name);
    fs::File::create(&path).unwrap().write_all(&bytes).unwrap();
    path
}

#[test]
fn list_then_extract_a_general_ba2() {
    let dir = tempfile::tempdir().unwrap();
    let payload = b"nif nif nif nif ".repeat(32);
    let archive = write_archive(
        dir.path(),
        "Fallout4 - Meshes.ba2",
        Ba2Builder::general()
            .file("meshes\\a.nif", payload.clone(), true)
            .file("meshes\\b.nif", b"stored".to_vec(), false)
            .build(),
    );
    let manager = ArchiveManager::new();

    // Listing pass: N records, then EndOfArchive, repeatably.
    let handle = manager.open(&archive, OpenMode::List).unwrap();
    let first = manager.read_header(handle).unwrap();
    assert_eq!(first.full_path, "meshes\\a.nif");
    assert_eq!(first.unpacked_size, payload.len() as u64);
    assert!(first.packed_size < first.unpacked_size);
    assert_eq!(manager.read_header(handle).unwrap().full_path, "meshes\\b.nif");
    assert!(matches!(manager.read_header(handle), Err(WcxError::EndOfArchive)));
    assert!(matches!(manager.read_header(handle), Err(WcxError::EndOfArchive)));
    manager.close(handle).unwrap();

    // Extraction pass: skip the first entry, extract the second.
    let out = dir.path().join("out");
    let out_str = out.to_str().unwrap();
    let handle = manager.open(&archive, OpenMode::Extract).unwrap();
    manager.read_header(handle).unwrap();
    manager.process_file(handle, Operation::Skip, None, None).unwrap();
    manager.read_header(handle).unwrap();
    manager
        .process_file(handle, Operation::Extract, Some(out_str), Some("b.nif"))
        .unwrap();
    manager.close(handle).unwrap();

    assert_eq!(fs::read(out.join("b.nif")).unwrap(), b"stored");
    assert!(!out.join("a.nif").exists());
}

#[test]
fn extract_overwrites_and_handles_full_name_without_path() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(
        dir.path(),
        "Skyrim - Interface.bsa",
        BsaBuilder::new(105)
            .compressed(true)
            .file("interface\\menu.swf", b"menu bytes menu bytes".to_vec())
            .build(),
    );
    let target = dir.path().join("nested").join("menu.swf");
    fs::create_dir_all(target.parent().unwrap()).unwrap();
    fs::write(&target, b"old contents that are longer than the new ones").unwrap();

    let manager = ArchiveManager::new();
    let handle = manager.open(&archive, OpenMode::Extract).unwrap();
    let record = manager.read_header(handle).unwrap();
    assert_eq!(record.full_path, "interface\\menu.swf");
    manager
        .process_file(handle, Operation::Extract, Some(""), Some(target.to_str().unwrap()))
        .unwrap();
    manager.close(handle).unwrap();

    assert_eq!(fs::read(&target).unwrap(), b"menu bytes menu bytes");
}

#[test]
fn unknown_extension_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let zip = write_archive(dir.path(), "unknown.zip", b"PK\x03\x04".to_vec());

    let manager = ArchiveManager::new();
    let err = manager.open(&zip, OpenMode::List).unwrap_err();
    assert!(matches!(err, WcxError::Unsupported(_)));
    assert_eq!(err.code(), wcxhead::E_NOT_SUPPORTED);
    assert_eq!(manager.open_sessions(), 0);
}

#[test]
fn corrupt_archive_is_bad_data() {
    let dir = tempfile::tempdir().unwrap();
    let broken = write_archive(dir.path(), "broken.ba2", b"BTDX\x01\x00\x00\x00GNRL".to_vec());

    let err = ArchiveManager::new().open(&broken, OpenMode::List).unwrap_err();
    assert!(matches!(err, WcxError::BadData(_)));
    assert_eq!(err.code(), wcxhead::E_BAD_DATA);
}

#[test]
fn truncated_headers_with_huge_counts_are_bad_data() {
    let dir = tempfile::tempdir().unwrap();

    let mut ba2 = b"BTDX\x01\x00\x00\x00GNRL".to_vec();
    ba2.extend_from_slice(&u32::MAX.to_le_bytes());
    ba2.extend_from_slice(&0u64.to_le_bytes());
    let ba2 = write_archive(dir.path(), "truncated.ba2", ba2);

    let mut bsa = b"BSA\0".to_vec();
    for word in [104u32, 36, 0x3, 1, u32::MAX, 0, 0, 0] {
        bsa.extend_from_slice(&word.to_le_bytes());
    }
    let bsa = write_archive(dir.path(), "truncated.bsa", bsa);

    let manager = ArchiveManager::new();
    for archive in [ba2, bsa] {
        let err = manager.open(&archive, OpenMode::List).unwrap_err();
        assert_eq!(err.code(), wcxhead::E_BAD_DATA, "{}", archive.display());
    }
    assert_eq!(manager.open_sessions(), 0);
}

#[test]
fn handle_reuse_after_close_fails() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(
        dir.path(),
        "a.ba2",
        Ba2Builder::general().file("x", b"y".to_vec(), false).build(),
    );

    let manager = ArchiveManager::new();
    let handle = manager.open(&archive, OpenMode::List).unwrap();
    manager.close(handle).unwrap();

    for err in [
        manager.read_header(handle).unwrap_err(),
        manager.process_file(handle, Operation::Skip, None, None).unwrap_err(),
        manager.close(handle).unwrap_err(),
    ] {
        assert!(matches!(err, WcxError::InvalidHandle(h) if h == handle));
        assert_eq!(err.code(), wcxhead::E_BAD_DATA);
    }
}

#[test]
fn records_marshal_into_every_header_flavor() {
    let dir = tempfile::tempdir().unwrap();
    let archive = write_archive(
        dir.path(),
        "t.ba2",
        Ba2Builder::general().file("textures/a.dds", vec![1u8; 100], false).build(),
    );
    let manager = ArchiveManager::new();
    let handle = manager.open(&archive, OpenMode::List).unwrap();
    let record = manager.read_header(handle).unwrap();
    manager.close(handle).unwrap();

    let expected = format!("textures{}a.dds", MAIN_SEPARATOR);
    for layout in [HEADER_DATA, HEADER_DATA_EX] {
        let mut buf = vec![0xAAu8; layout.size];
        layout.write(&mut buf, &record);
        let name = &buf[layout.file_name..layout.file_name + expected.len() + 1];
        assert_eq!(&name[..expected.len()], expected.as_bytes());
        assert_eq!(name[expected.len()], 0);
        assert_eq!(wcxhead::read_i32(&buf, layout.unp_size), 100);
        assert_eq!(wcxhead::read_i32(&buf, layout.file_time) as u32, record.packed_time());
    }

    let mut buf = vec![0xAAu8; HEADER_DATA_EX_W.size];
    HEADER_DATA_EX_W.write(&mut buf, &record);
    let units: Vec<u16> = buf[HEADER_DATA_EX_W.file_name..]
        .chunks_exact(2)
        .map(|c| u16::from_ne_bytes([c[0], c[1]]))
        .take_while(|&u| u != 0)
        .collect();
    assert_eq!(String::from_utf16(&units).unwrap(), expected);
}

/// Backend that records where it was asked to extract instead of writing.
#[derive(Clone, Default)]
struct RecordingOpener {
    calls: Arc<Mutex<Vec<(usize, PathBuf, String)>>>,
}

struct RecordingReader {
    entries: Vec<ArchiveEntry>,
    calls: Arc<Mutex<Vec<(usize, PathBuf, String)>>>,
}

impl ArchiveReader for RecordingReader {
    fn path(&self) -> &Path {
        Path::new("archive.ba2")
    }

    fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    fn last_write_time(&self) -> SystemTime {
        SystemTime::now()
    }

    fn extract_to(&mut self, _index: usize, _writer: &mut dyn Write) -> bsarc::Result<u64> {
        Ok(0)
    }

    fn extract(&mut self, index: usize, dir: &Path, file_name: &str) -> bsarc::Result<PathBuf> {
        self.calls
            .lock()
            .unwrap()
            .push((index, dir.to_path_buf(), file_name.to_string()));
        Ok(dir.join(file_name))
    }

    fn close(&mut self) {}
}

impl ArchiveOpener for RecordingOpener {
    fn probe(&self, path: &Path) -> Option<FormatKind> {
        bsarc::probe(path)
    }

    fn open(&self, _kind: FormatKind, _path: &Path) -> bsarc::Result<Box<dyn ArchiveReader>> {
        Ok(Box::new(RecordingReader {
            entries: vec![ArchiveEntry {
                full_path: "textures/a.dds".to_string(),
                unpacked_size: 100,
                packed_size: 40,
            }],
            calls: Arc::clone(&self.calls),
        }))
    }
}

#[test]
fn extract_splits_destination_for_the_backend() {
    let opener = RecordingOpener::default();
    let manager = ArchiveManager::with_opener(opener.clone());

    let handle = manager.open(Path::new("archive.ba2"), OpenMode::Extract).unwrap();
    let record = manager.read_header(handle).unwrap();
    assert_eq!(record.full_path, "textures/a.dds");
    assert_eq!((record.unpacked_size, record.packed_size), (100, 40));

    manager
        .process_file(handle, Operation::Extract, Some("C:\\out"), Some("a.dds"))
        .unwrap();
    manager.close(handle).unwrap();

    assert_eq!(
        *opener.calls.lock().unwrap(),
        [(0, PathBuf::from("C:\\out"), "a.dds".to_string())]
    );
}

#[test]
fn test_operation_and_missing_name_are_unsupported() {
    let opener = RecordingOpener::default();
    let manager = ArchiveManager::with_opener(opener.clone());
    let handle = manager.open(Path::new("archive.ba2"), OpenMode::Extract).unwrap();
    manager.read_header(handle).unwrap();

    let err = manager
        .process_file(handle, Operation::Test, Some("C:\\out"), Some("a.dds"))
        .unwrap_err();
    assert_eq!(err.code(), wcxhead::E_NOT_SUPPORTED);

    let err = manager
        .process_file(handle, Operation::Extract, Some("C:\\out"), None)
        .unwrap_err();
    assert_eq!(err.code(), wcxhead::E_NOT_SUPPORTED);

    assert!(opener.calls.lock().unwrap().is_empty());
    manager.close(handle).unwrap();
}
