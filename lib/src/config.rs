use std::net::SocketAddr;
use std::path::PathBuf;

use serde::de::DeserializeOwned;

use crate::Result;

pub static CONFIG_FILE: &'static str = "snapcode.toml";

/// Prefix for environment variable overrides, e.g.
/// `SNAPCODE__ADMIN__PASSWORD`.
pub static ENV_PREFIX: &'static str = "SNAPCODE";

/// Application configuration. Constructed once at startup and shared by
/// reference with every component.
///
/// # Sensible defaults
///
/// `Config::default()` gives a working local setup: images are accepted in
/// the common raster formats and codes are six alphanumeric characters long.
/// Using the *struct update syntax* one can initialize a new `Config`, making
/// a few changes right in the definition.
///
/// ```ignore
/// let cfg = Config {
///     storage: Storage {
///         backend: Backend::Memory,
///         ..Default::default()
///     },
///     ..Default::default()
/// }
/// ```
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub name: String,
    pub version: String,

    /// Address on which to serve the application. Defaults to
    /// `127.0.0.1:8080`.
    pub address: SocketAddr,
    /// Path prepended to public links, e.g. `https://i.example.com`. Links
    /// take the form `<app_path>/<shortcode>.png`.
    pub app_path: String,

    pub upload: Upload,
    pub shortcode: Shortcode,
    pub storage: Storage,
    pub registry: Registry,
    pub admin: Admin,
    pub tracing: Tracing,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            app_path: "".to_string(),
            upload: Upload::default(),
            shortcode: Shortcode::default(),
            storage: Storage::default(),
            registry: Registry::default(),
            admin: Admin::default(),
            tracing: Tracing::default(),
        }
    }
}

/// Loads application config from toml file at standard path using provided
/// name.
///
/// For example for `name` == `snapcode.toml` we will load both
/// `snapcode.toml` and `secret.snapcode.toml` from the working directory.
/// Environment variables take precedence over both files.
pub fn load_from<T: DeserializeOwned>(name: impl AsRef<str>) -> Result<T> {
    let config = config::Config::builder()
        .add_source(config::File::with_name(name.as_ref()))
        .add_source(config::File::with_name(&format!("secret.{}", name.as_ref())).required(false))
        .add_source(environment())
        .build()?;

    let config: T = config.try_deserialize()?;

    Ok(config)
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("upload.allowed_extensions")
        .try_parsing(true)
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Upload {
    /// Accepted file extensions, lowercase and without the leading dot.
    pub allowed_extensions: Vec<String>,
    /// Directory holding uploads until they reach the object store.
    pub staging_dir: PathBuf,
    /// Maximum accepted request body size in bytes.
    pub max_size: usize,
}

impl Default for Upload {
    fn default() -> Self {
        Self {
            allowed_extensions: ["png", "jpg", "jpeg", "gif", "bmp", "webp"]
                .iter()
                .map(|e| e.to_string())
                .collect(),
            staging_dir: PathBuf::from("uploads"),
            max_size: 10 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Shortcode {
    /// Default length of generated codes.
    pub length: usize,
    /// Characters codes are drawn from.
    pub alphabet: String,
    /// Number of consecutive taken candidates after which generation starts
    /// warning about the code space running out.
    pub warn_after: usize,
    /// How many times a commit is retried with a fresh code when its
    /// shortcode got taken in the meantime.
    pub commit_retries: usize,
}

impl Default for Shortcode {
    fn default() -> Self {
        Self {
            length: 6,
            alphabet: "abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789".to_string(),
            warn_after: 8,
            commit_retries: 8,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Backend {
    /// S3-compatible http endpoint.
    #[default]
    Http,
    /// Objects kept in a local directory.
    Filesystem,
    /// Objects kept in process memory. Meant for development and tests.
    Memory,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Storage {
    pub backend: Backend,

    /// Base url of the object store api, e.g. `http://s3.amazonaws.com`.
    pub endpoint: String,
    /// Base url used when building public links to stored objects. Falls
    /// back to `endpoint` when empty.
    pub public_endpoint: String,
    pub bucket: String,
    /// Path under which objects are stored within the bucket.
    pub path_prefix: String,
    /// Optional bearer token sent with every object store request.
    pub token: String,
    /// Request timeout for the http backend.
    pub timeout_secs: u64,

    /// Root directory for the filesystem backend.
    pub root: PathBuf,
}

impl Storage {
    pub fn public_endpoint(&self) -> &str {
        if self.public_endpoint.is_empty() {
            &self.endpoint
        } else {
            &self.public_endpoint
        }
    }

    /// Full object path within the bucket for the given object key.
    pub fn object_path(&self, key: &str) -> String {
        let prefix = self.path_prefix.trim_matches('/');
        if prefix.is_empty() {
            key.to_string()
        } else {
            format!("{}/{}", prefix, key)
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            endpoint: "http://s3.amazonaws.com".to_string(),
            public_endpoint: "".to_string(),
            bucket: "images".to_string(),
            path_prefix: "img".to_string(),
            token: "".to_string(),
            timeout_secs: 30,
            root: PathBuf::from("objects"),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Registry {
    /// Location of the database directory.
    pub path: PathBuf,
    /// Opens a throwaway database removed on drop.
    pub temporary: bool,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            path: PathBuf::from("db"),
            temporary: false,
        }
    }
}

/// The single operator allowed to delete images.
#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Admin {
    pub username: String,
    /// Either plain text or an argon2 hash in PHC string format. An empty
    /// password disables deletion over http altogether.
    pub password: String,
}

impl Default for Admin {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "".to_string(),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct Tracing {
    pub enabled: bool,

    pub mode: crate::tracing::Mode,
    pub level: crate::tracing::Level,

    pub loki_address: String,
}

impl Default for Tracing {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: crate::tracing::Mode::default(),
            level: crate::tracing::Level::default(),
            loki_address: "".to_string(),
        }
    }
}
