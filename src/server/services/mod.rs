pub mod app_services;
pub mod fetch_services;
pub mod playlist_services;

pub use app_services::AppServices;
pub use fetch_services::DynPlaylistFetcher;
pub use playlist_services::PlaylistService;
