//! Configuration for tagwire
//!
//! Centralized client configuration with sensible defaults.

use crate::transform::SessionKey;

/// Default zstd compression level
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Main configuration for a protocol client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    // -------------------------------------------------------------------------
    // Correlation
    // -------------------------------------------------------------------------
    /// Attach a correlation token to outgoing request/response commands
    pub use_tokens: bool,

    /// Look for a correlation token at the start of inbound frames
    pub expect_tokens: bool,

    // -------------------------------------------------------------------------
    // Handler Binding
    // -------------------------------------------------------------------------
    /// Build the handler registry when the client is constructed
    pub scan_handlers: bool,

    /// Bind unannotated handler members by matching their name to a response tag
    pub map_by_name: bool,

    /// Silently keep the first binding when a tag is bound twice
    /// (otherwise construction fails with `BindingExists`)
    pub skip_duplicate_bindings: bool,

    // -------------------------------------------------------------------------
    // Transforms
    // -------------------------------------------------------------------------
    /// Compress frame bytes before they hit the wire
    pub compression: bool,

    /// Zstd level used when compression is on
    pub compression_level: i32,

    /// Encrypt (already compressed) frame bytes; requires a session key
    pub encryption: bool,

    /// Key installed in the encryption stage at startup
    pub session_key: Option<SessionKey>,

    // -------------------------------------------------------------------------
    // Lifecycle
    // -------------------------------------------------------------------------
    /// Release blocked senders when the dispatch loop loses or closes the connection
    pub abort_on_disconnect: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            use_tokens: true,
            expect_tokens: true,
            scan_handlers: true,
            map_by_name: true,
            skip_duplicate_bindings: true,
            compression: false,
            compression_level: DEFAULT_COMPRESSION_LEVEL,
            encryption: false,
            session_key: None,
            abort_on_disconnect: true,
        }
    }
}

impl ClientConfig {
    /// Create a new config builder
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

/// Builder for ClientConfig
#[derive(Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Enable or disable outbound correlation tokens
    pub fn use_tokens(mut self, enabled: bool) -> Self {
        self.config.use_tokens = enabled;
        self
    }

    /// Enable or disable inbound token detection
    pub fn expect_tokens(mut self, enabled: bool) -> Self {
        self.config.expect_tokens = enabled;
        self
    }

    /// Enable or disable handler registry construction
    pub fn scan_handlers(mut self, enabled: bool) -> Self {
        self.config.scan_handlers = enabled;
        self
    }

    /// Enable or disable name-based handler binding
    pub fn map_by_name(mut self, enabled: bool) -> Self {
        self.config.map_by_name = enabled;
        self
    }

    /// Choose between skipping and rejecting duplicate bindings
    pub fn skip_duplicate_bindings(mut self, skip: bool) -> Self {
        self.config.skip_duplicate_bindings = skip;
        self
    }

    /// Enable or disable compression
    pub fn compression(mut self, enabled: bool) -> Self {
        self.config.compression = enabled;
        self
    }

    /// Set the zstd compression level
    pub fn compression_level(mut self, level: i32) -> Self {
        self.config.compression_level = level;
        self
    }

    /// Enable or disable encryption
    pub fn encryption(mut self, enabled: bool) -> Self {
        self.config.encryption = enabled;
        self
    }

    /// Install a session key at startup
    pub fn session_key(mut self, key: SessionKey) -> Self {
        self.config.session_key = Some(key);
        self
    }

    /// Release blocked senders on connection loss or close
    pub fn abort_on_disconnect(mut self, enabled: bool) -> Self {
        self.config.abort_on_disconnect = enabled;
        self
    }

    pub fn build(self) -> ClientConfig {
        self.config
    }
}
