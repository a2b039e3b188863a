#[derive(clap::ValueEnum, Clone, Debug, Copy)]
pub enum CargoEnv {
    Development,
    Production,
}

#[derive(clap::Parser, Debug, Clone)]
pub struct AppConfig {
    // production or development
    #[clap(long, env, value_enum)]
    pub cargo_env: CargoEnv,

    // port that the app will bind to
    #[clap(long, env, default_value = "5000")]
    pub port: u16,

    // this should be either * for allowing everything, or a comma seperated list of domains like
    // example.com,something.com
    #[clap(long, env, default_value = "*")]
    pub cors_origin: String,

    // sent upstream when downloading the source playlists, some providers 403 anything that
    // doesn't look like a browser
    #[clap(
        long,
        env,
        default_value = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
    )]
    pub user_agent: String,

    // global proxy password, appended to every rewritten entry when the request doesn't carry
    // its own
    #[clap(long, env)]
    pub api_password: Option<String>,

    // public base url of the proxy (https://proxy.example.com), leave empty to build it from
    // the incoming request
    #[clap(long, env)]
    pub base_url: Option<String>,

    // wall clock budget for downloading one source playlist
    #[clap(long, env, default_value = "30")]
    pub fetch_timeout_seconds: u64,

    #[clap(long, env, default_value = "10")]
    pub connect_timeout_seconds: u64,

    // anything bigger than this gets dropped, 50MiB is already a ridiculous playlist
    #[clap(long, env, default_value = "52428800")]
    pub max_playlist_bytes: u64,

    // optional sentry integration
    #[clap(long, env)]
    pub sentry_dsn: Option<String>,
}

impl Default for AppConfig {
    // defaults aren't really needed here but it's here as a bad fallback
    fn default() -> Self {
        Self {
            cargo_env: CargoEnv::Development,
            port: 5000,
            cors_origin: "*".to_string(),
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36".to_string(),
            api_password: None,
            base_url: None,
            fetch_timeout_seconds: 30,
            connect_timeout_seconds: 10,
            max_playlist_bytes: 50 * 1024 * 1024,
            sentry_dsn: None,
        }
    }
}
