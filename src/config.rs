//! Router configuration: per-provider settings, cache, fallback and breaker blocks.
//!
//! Loading configuration from a file is out of scope; constructing a
//! `RouterConfig` programmatically, including pulling API keys from the
//! environment, is.

mod private
{
  use std::time::Duration;

  use crate::codec::ProviderKind;
  use crate::secret::Secret;

  /// Per-provider settings: endpoint, model defaults and reliability knobs.
  #[ derive( Debug, Clone ) ]
  pub struct ProviderSettings
  {
    /// Whether this provider participates in the fallback chain at all.
    pub enabled : bool,
    /// Base URL, e.g. `https://api.example.com`.
    pub base_url : String,
    /// Default model identifier sent on every request.
    pub model : String,
    /// Default `max_tokens`.
    pub max_tokens : u32,
    /// Optional default temperature; validated against the provider's range.
    pub temperature : Option< f64 >,
    /// Optional nucleus sampling parameter (Provider C only).
    pub top_p : Option< f64 >,
    /// Optional frequency penalty (Provider C only).
    pub frequency_penalty : Option< f64 >,
    /// Optional presence penalty (Provider C only).
    pub presence_penalty : Option< f64 >,
    /// Per-attempt HTTP timeout.
    pub timeout : Duration,
    /// Maximum retry attempts on a transient error, same provider only.
    pub max_retries : u32,
    /// Base linear backoff delay: attempt N sleeps `retry_delay * N`.
    pub retry_delay : Duration,
    /// Requests-per-minute / tokens-per-minute / requests-per-day, read-only
    /// bookkeeping surfaced via `health_check()` and metrics; never enforced.
    pub rate_limit : ( u32, u32, u32 ),
  }

  impl Default for ProviderSettings
  {
    #[ inline ]
    fn default() -> Self
    {
      Self
      {
        enabled : true,
        base_url : String::new(),
        model : String::new(),
        max_tokens : 1024,
        temperature : None,
        top_p : None,
        frequency_penalty : None,
        presence_penalty : None,
        timeout : Duration::from_secs( 30 ),
        max_retries : 3,
        retry_delay : Duration::from_secs( 1 ),
        rate_limit : ( 0, 0, 0 ),
      }
    }
  }

  impl ProviderSettings
  {
    /// Builder-style setter for `base_url`.
    #[ inline ]
    #[ must_use ]
    pub fn with_base_url( mut self, base_url : impl Into< String > ) -> Self
    {
      self.base_url = base_url.into();
      self
    }

    /// Builder-style setter for `model`.
    #[ inline ]
    #[ must_use ]
    pub fn with_model( mut self, model : impl Into< String > ) -> Self
    {
      self.model = model.into();
      self
    }

    /// Builder-style setter for `max_tokens`.
    #[ inline ]
    #[ must_use ]
    pub fn with_max_tokens( mut self, max_tokens : u32 ) -> Self
    {
      self.max_tokens = max_tokens;
      self
    }

    /// Builder-style setter for `temperature`.
    #[ inline ]
    #[ must_use ]
    pub fn with_temperature( mut self, temperature : f64 ) -> Self
    {
      self.temperature = Some( temperature );
      self
    }

    /// Builder-style setter for `timeout`.
    #[ inline ]
    #[ must_use ]
    pub fn with_timeout( mut self, timeout : Duration ) -> Self
    {
      self.timeout = timeout;
      self
    }

    /// Builder-style setter for `max_retries`.
    #[ inline ]
    #[ must_use ]
    pub fn with_max_retries( mut self, max_retries : u32 ) -> Self
    {
      self.max_retries = max_retries;
      self
    }

    /// Builder-style setter for `retry_delay`.
    #[ inline ]
    #[ must_use ]
    pub fn with_retry_delay( mut self, retry_delay : Duration ) -> Self
    {
      self.retry_delay = retry_delay;
      self
    }
  }

  /// Cache configuration block.
  #[ derive( Debug, Clone ) ]
  pub struct CacheSettings
  {
    /// Whether the response cache is consulted at all.
    pub enabled : bool,
    /// Time-to-live for a freshly-written entry.
    pub ttl : Duration,
    /// Maximum number of entries retained; LRU-evicted past this bound.
    pub max_size : usize,
    /// Interval between background sweeper passes.
    pub cleanup_interval : Duration,
  }

  impl Default for CacheSettings
  {
    #[ inline ]
    fn default() -> Self
    {
      Self
      {
        enabled : true,
        ttl : Duration::from_secs( 15 * 60 ),
        max_size : 1000,
        cleanup_interval : Duration::from_secs( 5 * 60 ),
      }
    }
  }

  impl CacheSettings
  {
    /// Builder-style setter for `ttl`.
    #[ inline ]
    #[ must_use ]
    pub fn with_ttl( mut self, ttl : Duration ) -> Self
    {
      self.ttl = ttl;
      self
    }

    /// Builder-style setter for `max_size`.
    #[ inline ]
    #[ must_use ]
    pub fn with_max_size( mut self, max_size : usize ) -> Self
    {
      self.max_size = max_size;
      self
    }

    /// Builder-style setter for `cleanup_interval`.
    #[ inline ]
    #[ must_use ]
    pub fn with_cleanup_interval( mut self, cleanup_interval : Duration ) -> Self
    {
      self.cleanup_interval = cleanup_interval;
      self
    }
  }

  /// Provider ordering strategy for the fallback router.
  #[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
  pub enum FallbackStrategy
  {
    /// A, then B, then C.
    AFirst,
    /// B, then A, then C.
    BFirst,
    /// Order by historical average latency. No latency metric is wired in
    /// yet, so this is currently equivalent to `AFirst`.
    FastestFirst,
  }

  /// Fallback router configuration block.
  #[ derive( Debug, Clone ) ]
  pub struct FallbackSettings
  {
    /// Chain ordering strategy.
    pub strategy : FallbackStrategy,
    /// Per-attempt deadline, bounded further by the caller's remaining deadline.
    pub per_attempt_timeout : Duration,
  }

  impl Default for FallbackSettings
  {
    #[ inline ]
    fn default() -> Self
    {
      Self { strategy : FallbackStrategy::AFirst, per_attempt_timeout : Duration::from_secs( 30 ) }
    }
  }

  impl FallbackSettings
  {
    /// Builder-style setter for `strategy`.
    #[ inline ]
    #[ must_use ]
    pub fn with_strategy( mut self, strategy : FallbackStrategy ) -> Self
    {
      self.strategy = strategy;
      self
    }

    /// Builder-style setter for `per_attempt_timeout`.
    #[ inline ]
    #[ must_use ]
    pub fn with_per_attempt_timeout( mut self, per_attempt_timeout : Duration ) -> Self
    {
      self.per_attempt_timeout = per_attempt_timeout;
      self
    }
  }

  /// Circuit breaker configuration block.
  #[ derive( Debug, Clone, Copy ) ]
  pub struct BreakerSettings
  {
    /// Consecutive failures before the circuit opens.
    pub max_failures : u32,
    /// How long the circuit stays open before admitting a half-open probe.
    pub reset_timeout : Duration,
  }

  impl Default for BreakerSettings
  {
    #[ inline ]
    fn default() -> Self
    {
      Self { max_failures : 3, reset_timeout : Duration::from_secs( 60 ) }
    }
  }

  impl BreakerSettings
  {
    /// Builder-style setter for `max_failures`.
    #[ inline ]
    #[ must_use ]
    pub fn with_max_failures( mut self, max_failures : u32 ) -> Self
    {
      self.max_failures = max_failures;
      self
    }

    /// Builder-style setter for `reset_timeout`.
    #[ inline ]
    #[ must_use ]
    pub fn with_reset_timeout( mut self, reset_timeout : Duration ) -> Self
    {
      self.reset_timeout = reset_timeout;
      self
    }
  }

  /// Aggregate router configuration.
  #[ derive( Debug, Clone ) ]
  pub struct RouterConfig
  {
    /// Settings for Provider A.
    pub provider_a : ProviderSettings,
    /// Settings for Provider B.
    pub provider_b : ProviderSettings,
    /// Settings for Provider C.
    pub provider_c : ProviderSettings,
    /// The configured primary (used when a request does not name a provider).
    pub primary : String,
    /// Cache block.
    pub cache : CacheSettings,
    /// Fallback block.
    pub fallback : FallbackSettings,
    /// Breaker block.
    pub breaker : BreakerSettings,
    /// Truncation length applied to logged content previews.
    pub max_log_content_length : usize,
  }

  impl Default for RouterConfig
  {
    #[ inline ]
    fn default() -> Self
    {
      Self
      {
        provider_a : ProviderSettings::default(),
        provider_b : ProviderSettings::default(),
        provider_c : ProviderSettings::default(),
        primary : "a".to_string(),
        cache : CacheSettings::default(),
        fallback : FallbackSettings::default(),
        breaker : BreakerSettings::default(),
        max_log_content_length : 200,
      }
    }
  }

  impl RouterConfig
  {
    /// Look up the settings block for a provider tag.
    #[ inline ]
    #[ must_use ]
    pub fn settings_for( &self, tag : &str ) -> Option< &ProviderSettings >
    {
      match tag
      {
        "a" => Some( &self.provider_a ),
        "b" => Some( &self.provider_b ),
        "c" => Some( &self.provider_c ),
        _ => None,
      }
    }

    /// Resolve a provider tag to its wire family.
    #[ inline ]
    #[ must_use ]
    pub fn kind_for( tag : &str ) -> Option< ProviderKind >
    {
      match tag
      {
        "a" => Some( ProviderKind::A ),
        "b" => Some( ProviderKind::B ),
        "c" => Some( ProviderKind::C ),
        _ => None,
      }
    }

    /// Read API keys from `PROVIDER_A_API_KEY`, `PROVIDER_B_API_KEY`,
    /// `PROVIDER_C_API_KEY` for every *enabled* provider. Disabled providers
    /// are skipped entirely — their environment variable need not be set.
    ///
    /// # Errors
    ///
    /// Returns an error if an enabled provider's environment variable is unset.
    #[ inline ]
    pub fn secrets_from_env( &self ) -> crate::error::Result< Vec< ( &'static str, Secret ) > >
    {
      let mut secrets = Vec::new();
      for ( tag, var, settings ) in
        [ ( "a", "PROVIDER_A_API_KEY", &self.provider_a ), ( "b", "PROVIDER_B_API_KEY", &self.provider_b ), ( "c", "PROVIDER_C_API_KEY", &self.provider_c ) ]
      {
        if !settings.enabled
        {
          continue;
        }
        secrets.push( ( tag, Secret::from_env( var )? ) );
      }
      Ok( secrets )
    }
  }
}

crate::mod_interface!
{
  exposed use private::ProviderSettings;
  exposed use private::CacheSettings;
  exposed use private::FallbackStrategy;
  exposed use private::FallbackSettings;
  exposed use private::BreakerSettings;
  exposed use private::RouterConfig;
}
