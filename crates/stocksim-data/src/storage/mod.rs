//! 스냅샷 파일 저장소.

pub mod format;
pub mod json_file;
