//! Backend route table. All paths are relative to the service base URL.

use uuid::Uuid;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

pub const TOKEN: &str = "connect/token";

// ---------------------------------------------------------------------------
// File management
// ---------------------------------------------------------------------------

pub const FILES: &str = "api/file-management/file-descriptor";
pub const FILE_PRE_UPLOAD: &str = "api/file-management/file-descriptor/creative-pre-upload-info";
pub const FILE_UPLOAD: &str = "api/file-management/file-descriptor/upload";

// ---------------------------------------------------------------------------
// Playlist management
// ---------------------------------------------------------------------------

pub const PLAYLISTS: &str = "api/playlist-management/playlist";
pub const PLAYLIST_FILES: &str = "api/playlist-management/playlist-file";
pub const PLAYLIST_SCREENS: &str = "api/playlist-management/playlist-screen";
pub const PLAYLIST_URLS: &str = "api/playlist-management/playlist-url";

pub fn playlist(id: Uuid) -> String {
    format!("{PLAYLISTS}/{id}")
}

pub fn playlist_calendar(id: Uuid) -> String {
    format!("{PLAYLISTS}/{id}/update-calendar")
}

pub fn playlist_publish(id: Uuid) -> String {
    format!("{PLAYLISTS}/{id}/publish")
}

// ---------------------------------------------------------------------------
// Inventory / reporting
// ---------------------------------------------------------------------------

pub const SCREENS: &str = "api/inventory-management/screen";
pub const POP_OVERVIEW: &str = "api/PopManagement/pop/get-overview-by-screen-id";
