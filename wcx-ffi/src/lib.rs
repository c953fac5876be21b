//! Exported packer plugin entry points.
//!
//! Each function decodes its raw arguments, calls the shared
//! [`ArchiveManager`] and turns the outcome into a host error code. Nothing
//! but an integer ever crosses back to the host; panics included.

#![allow(non_snake_case, clippy::missing_safety_doc)]

use std::ffi::c_void;
use std::os::raw::{c_char, c_int};
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use std::slice;
use std::sync::LazyLock;

use log::{error, info, log};
use wcx_core::codec::{decode_text, TextVariant};
use wcx_core::wcxhead::{
    HeaderLayout, DEFAULT_PARAMS, E_BAD_DATA, E_NOT_SUPPORTED, HEADER_DATA, HEADER_DATA_EX, HEADER_DATA_EX_W,
    OPEN_ARCHIVE_DATA, PK_CAPS_MULTIPLE,
};
use wcx_core::{ArchiveManager, OpenMode, Operation, WcxError};

static MANAGER: LazyLock<ArchiveManager> = LazyLock::new(ArchiveManager::new);

/// `HANDLE` as the host sees it. Zero means failure.
pub type ArchiveHandle = usize;

pub type ChangeVolProc = Option<unsafe extern "system" fn(arc_name: *mut c_char, mode: c_int) -> c_int>;
pub type ChangeVolProcW = Option<unsafe extern "system" fn(arc_name: *mut u16, mode: c_int) -> c_int>;
pub type ProcessDataProc = Option<unsafe extern "system" fn(file_name: *mut c_char, size: c_int) -> c_int>;
pub type ProcessDataProcW = Option<unsafe extern "system" fn(file_name: *mut u16, size: c_int) -> c_int>;

/// Run `body`, logging failures and converting them (and panics) to host codes.
fn guarded<T>(entry: &str, body: impl FnOnce() -> wcx_core::Result<T>) -> Result<T, c_int> {
    match panic::catch_unwind(AssertUnwindSafe(body)) {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(e)) => {
            log!(e.severity(), "{}: {}", entry, e);
            Err(e.code())
        }
        Err(_) => {
            error!("{}: panicked", entry);
            Err(E_BAD_DATA)
        }
    }
}

fn status(result: Result<(), c_int>) -> c_int {
    result.err().unwrap_or(0)
}

unsafe fn open_archive(data: *mut c_void, variant: TextVariant, entry: &str) -> ArchiveHandle {
    if data.is_null() {
        error!("{}: null open data", entry);
        return 0;
    }
    let buf = slice::from_raw_parts_mut(data.cast::<u8>(), OPEN_ARCHIVE_DATA.size);

    let result = guarded(entry, || {
        let name = OPEN_ARCHIVE_DATA.arc_name_ptr(buf) as *const c_void;
        let path = decode_text(name, variant).ok_or_else(|| WcxError::BadData("null archive name".to_string()))?;
        let mode = OpenMode::from_raw(OPEN_ARCHIVE_DATA.open_mode(buf));
        MANAGER.open(Path::new(&path), mode)
    });

    match result {
        Ok(handle) => {
            OPEN_ARCHIVE_DATA.set_open_result(buf, 0);
            handle
        }
        Err(code) => {
            OPEN_ARCHIVE_DATA.set_open_result(buf, code);
            0
        }
    }
}

unsafe fn read_header(handle: ArchiveHandle, data: *mut c_void, layout: HeaderLayout, entry: &str) -> c_int {
    status(guarded(entry, || {
        if data.is_null() {
            return Err(WcxError::BadData("null header buffer".to_string()));
        }
        let record = MANAGER.read_header(handle)?;
        layout.write(slice::from_raw_parts_mut(data.cast::<u8>(), layout.size), &record);
        Ok(())
    }))
}

unsafe fn process_file(
    handle: ArchiveHandle,
    operation: c_int,
    dest_path: *const c_void,
    dest_name: *const c_void,
    variant: TextVariant,
    entry: &str,
) -> c_int {
    status(guarded(entry, || {
        let dest_path = decode_text(dest_path, variant);
        let dest_name = decode_text(dest_name, variant);
        MANAGER.process_file(
            handle,
            Operation::from(operation),
            dest_path.as_deref(),
            dest_name.as_deref(),
        )
    }))
}

#[export_name = "OpenArchive"]
pub unsafe extern "system" fn OpenArchive(archive_data: *mut c_void) -> ArchiveHandle {
    open_archive(archive_data, TextVariant::Ansi, "OpenArchive")
}

#[export_name = "OpenArchiveW"]
pub unsafe extern "system" fn OpenArchiveW(archive_data: *mut c_void) -> ArchiveHandle {
    open_archive(archive_data, TextVariant::Wide, "OpenArchiveW")
}

#[export_name = "ReadHeader"]
pub unsafe extern "system" fn ReadHeader(handle: ArchiveHandle, header_data: *mut c_void) -> c_int {
    read_header(handle, header_data, HEADER_DATA, "ReadHeader")
}

#[export_name = "ReadHeaderEx"]
pub unsafe extern "system" fn ReadHeaderEx(handle: ArchiveHandle, header_data: *mut c_void) -> c_int {
    read_header(handle, header_data, HEADER_DATA_EX, "ReadHeaderEx")
}

#[export_name = "ReadHeaderExW"]
pub unsafe extern "system" fn ReadHeaderExW(handle: ArchiveHandle, header_data: *mut c_void) -> c_int {
    read_header(handle, header_data, HEADER_DATA_EX_W, "ReadHeaderExW")
}

#[export_name = "ProcessFile"]
pub unsafe extern "system" fn ProcessFile(
    handle: ArchiveHandle,
    operation: c_int,
    dest_path: *const c_char,
    dest_name: *const c_char,
) -> c_int {
    process_file(
        handle,
        operation,
        dest_path.cast(),
        dest_name.cast(),
        TextVariant::Ansi,
        "ProcessFile",
    )
}

#[export_name = "ProcessFileW"]
pub unsafe extern "system" fn ProcessFileW(
    handle: ArchiveHandle,
    operation: c_int,
    dest_path: *const u16,
    dest_name: *const u16,
) -> c_int {
    process_file(
        handle,
        operation,
        dest_path.cast(),
        dest_name.cast(),
        TextVariant::Wide,
        "ProcessFileW",
    )
}

#[export_name = "CloseArchive"]
pub unsafe extern "system" fn CloseArchive(handle: ArchiveHandle) -> c_int {
    status(guarded("CloseArchive", || MANAGER.close(handle)))
}

#[export_name = "SetChangeVolProc"]
pub unsafe extern "system" fn SetChangeVolProc(_handle: ArchiveHandle, _proc: ChangeVolProc) -> c_int {
    E_NOT_SUPPORTED
}

#[export_name = "SetChangeVolProcW"]
pub unsafe extern "system" fn SetChangeVolProcW(_handle: ArchiveHandle, _proc: ChangeVolProcW) -> c_int {
    E_NOT_SUPPORTED
}

#[export_name = "SetProcessDataProc"]
pub unsafe extern "system" fn SetProcessDataProc(_handle: ArchiveHandle, _proc: ProcessDataProc) -> c_int {
    E_NOT_SUPPORTED
}

#[export_name = "SetProcessDataProcW"]
pub unsafe extern "system" fn SetProcessDataProcW(_handle: ArchiveHandle, _proc: ProcessDataProcW) -> c_int {
    E_NOT_SUPPORTED
}

/// Read-only, many files per archive.
#[export_name = "GetPackerCaps"]
pub extern "system" fn GetPackerCaps() -> c_int {
    PK_CAPS_MULTIPLE
}

unsafe fn can_handle(file_name: *const c_void, variant: TextVariant) -> c_int {
    guarded("CanYouHandleThisFile", || {
        Ok(decode_text(file_name, variant).is_some_and(|name| MANAGER.probe(Path::new(&name)).is_some()))
    })
    .map_or(0, c_int::from)
}

#[export_name = "CanYouHandleThisFile"]
pub unsafe extern "system" fn CanYouHandleThisFile(file_name: *const c_char) -> c_int {
    can_handle(file_name.cast(), TextVariant::Ansi)
}

#[export_name = "CanYouHandleThisFileW"]
pub unsafe extern "system" fn CanYouHandleThisFileW(file_name: *const u16) -> c_int {
    can_handle(file_name.cast(), TextVariant::Wide)
}

/// Called once by the host after loading; sets up configuration and logging.
#[export_name = "PackSetDefaultParams"]
pub unsafe extern "system" fn PackSetDefaultParams(params: *mut c_void) {
    let _ = panic::catch_unwind(AssertUnwindSafe(|| {
        if params.is_null() {
            wcx_core::initialize(None);
            return;
        }
        let buf = slice::from_raw_parts(params.cast::<u8>().cast_const(), DEFAULT_PARAMS.size);
        let ini = DEFAULT_PARAMS.ini_name(buf);
        wcx_core::initialize(ini.as_deref().map(Path::new));

        let (major, minor) = DEFAULT_PARAMS.interface_version(buf);
        info!("Host plugin interface {}.{}, ini {:?}", major, minor, ini);
    }));
}
