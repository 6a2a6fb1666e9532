use std::path::PathBuf;

pub const DEFAULT_DEMO_SOURCE: &str =
    "https://utfs.io/f/bb4bbd6d-5291-4f77-8dcf-04606f680c0f-3ke0cr.dem";

#[derive(Debug, Clone, clap::Parser)]
#[command(name = "backend", about = "Serves the events of a CS demo as JSON")]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:3000")]
    pub listen: std::net::SocketAddr,

    /// Demo to parse when a request does not name one, either a http(s) URL
    /// or a path relative to the demo folder
    #[arg(long, env = "DEMO_SOURCE", default_value = DEFAULT_DEMO_SOURCE)]
    pub demo_source: String,

    #[arg(long, env = "DEMO_FOLDER", default_value = ".")]
    pub demo_folder: PathBuf,

    /// Also store every rendered document as `<demo>.json` in this folder
    #[arg(long, env = "OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    #[arg(long, env = "UPLOAD_LIMIT_MB", default_value_t = 500)]
    pub upload_limit_mb: usize,
}

impl Config {
    pub fn upload_limit(&self) -> usize {
        self.upload_limit_mb * 1024 * 1024
    }
}
