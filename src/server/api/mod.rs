pub mod health_controller;
pub mod playlist_controller;

pub use health_controller::health_endpoint;
pub use playlist_controller::PlaylistController;
