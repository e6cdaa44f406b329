//! Cache configuration and environment resolution

/// Namespace prefix used when none has been configured
pub const DEFAULT_PREFIX: &str = "rcktcache";

/// Default TTL applied by `set` when no explicit TTL is given (15 minutes)
pub const DEFAULT_TTL_SECONDS: u64 = 900;

const DEFAULT_HOST: &str = "localhost";
const DEFAULT_PORT: u16 = 6379;

/// Configuration for the cache client
///
/// Resolved once at client construction: environment variables fill the
/// defaults, explicit builder calls win over the environment. The client
/// never mutates its configuration afterwards.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Store host
    pub host: String,
    /// Store port
    pub port: u16,
    /// Optional password
    pub password: Option<String>,
    /// Full connection URL; overrides host/port/password when set
    pub url: Option<String>,
    /// Key prefix for namespacing
    pub prefix: String,
    /// Whether values are JSON-encoded on write and decoded on read
    pub structured: bool,
    /// TTL applied by `set` when no explicit TTL is given
    pub default_ttl_seconds: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            password: None,
            url: None,
            prefix: DEFAULT_PREFIX.to_string(),
            structured: true,
            default_ttl_seconds: DEFAULT_TTL_SECONDS,
        }
    }
}

impl CacheConfig {
    /// Creates a configuration from environment variables
    ///
    /// Reads `STORE_HOST`, `STORE_PORT`, `STORE_PASSWORD`, `STORE_URL`,
    /// `STORE_PREFIX` and `STORE_USE_JSON`, falling back to the defaults for
    /// anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::resolve(|name| std::env::var(name).ok())
    }

    fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("STORE_HOST").unwrap_or(defaults.host),
            port: lookup("STORE_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.port),
            password: lookup("STORE_PASSWORD"),
            url: lookup("STORE_URL"),
            prefix: lookup("STORE_PREFIX").unwrap_or(defaults.prefix),
            structured: lookup("STORE_USE_JSON")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.structured),
            default_ttl_seconds: defaults.default_ttl_seconds,
        }
    }

    /// Sets the store host
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the store port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the store password
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets a full connection URL, overriding host/port/password
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the namespace prefix
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Toggles structured (JSON) serialization
    pub fn with_structured(mut self, structured: bool) -> Self {
        self.structured = structured;
        self
    }

    /// Sets the default TTL in seconds
    pub fn with_default_ttl(mut self, seconds: u64) -> Self {
        self.default_ttl_seconds = seconds;
        self
    }

    /// Returns the connection URL for the backing store
    pub fn connection_url(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }

        match &self.password {
            Some(password) => format!("redis://:{}@{}:{}", password, self.host, self.port),
            None => format!("redis://{}:{}", self.host, self.port),
        }
    }
}
