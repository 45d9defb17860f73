//! Canonical error taxonomy shared by every component.

mod private
{
  use error_tools::dependency::thiserror;
  use serde::{ Deserialize, Serialize };

  /// The seven error kinds the router ever surfaces. This is a taxonomy, not a type
  /// hierarchy: every component maps its own failures onto one of these.
  #[ derive( Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize ) ]
  #[ serde( rename_all = "snake_case" ) ]
  pub enum ErrorKind
  {
    /// Missing/invalid fields, bad temperature or `max_tokens`.
    Validation,
    /// 401/403, or a missing api key.
    Auth,
    /// 429.
    RateLimited,
    /// Deadline exceeded, or backoff cancelled.
    Timeout,
    /// I/O error, DNS failure.
    Network,
    /// 5xx.
    ServerError,
    /// Anything else.
    Other,
  }

  impl ErrorKind
  {
    /// Whether the provider client should retry an attempt that produced this kind.
    #[ inline ]
    #[ must_use ]
    pub fn is_retryable( self ) -> bool
    {
      matches!( self, Self::RateLimited | Self::Timeout | Self::Network | Self::ServerError )
    }

    /// Whether the circuit breaker should count this kind as a failure.
    ///
    /// Only transport/server errors count; `validation` and `auth` are the caller's
    /// fault and must not be able to trip a healthy provider offline.
    #[ inline ]
    #[ must_use ]
    pub fn counts_toward_breaker( self ) -> bool
    {
      matches!( self, Self::RateLimited | Self::Timeout | Self::Network | Self::ServerError )
    }
  }

  /// The canonical router error. Carries enough context for callers and for the
  /// breaker/fallback layers to make decisions without inspecting strings.
  #[ derive( Debug, Clone, thiserror::Error, Serialize, Deserialize ) ]
  #[ error( "{kind:?} ({provider}): {message}" ) ]
  pub struct RouterError
  {
    /// Taxonomy kind.
    pub kind : ErrorKind,
    /// Provider tag, or empty if the error occurred before dispatch (e.g. validation).
    pub provider : String,
    /// HTTP status code, where applicable.
    pub http_status : Option< u16 >,
    /// Whether a retry of the same provider is worth attempting.
    pub retryable : bool,
    /// Opaque, caller-safe message. Never includes message content bodies.
    pub message : String,
  }

  impl RouterError
  {
    /// Build an error of the given kind, deriving `retryable` from the kind.
    #[ inline ]
    #[ must_use ]
    pub fn new( kind : ErrorKind, provider : impl Into< String >, message : impl Into< String > ) -> Self
    {
      Self
      {
        retryable : kind.is_retryable(),
        kind,
        provider : provider.into(),
        http_status : None,
        message : message.into(),
      }
    }

    /// Attach an HTTP status code.
    #[ inline ]
    #[ must_use ]
    pub fn with_status( mut self, status : u16 ) -> Self
    {
      self.http_status = Some( status );
      self
    }

    /// `validation` convenience constructor, used for pre-dispatch checks.
    #[ inline ]
    #[ must_use ]
    pub fn validation( message : impl Into< String > ) -> Self
    {
      Self::new( ErrorKind::Validation, String::new(), message )
    }

    /// `timeout` convenience constructor.
    #[ inline ]
    #[ must_use ]
    pub fn timeout( provider : impl Into< String >, message : impl Into< String > ) -> Self
    {
      Self::new( ErrorKind::Timeout, provider, message )
    }

    /// Classify an HTTP status code plus provider tag into a `RouterError`.
    ///
    /// Used after a non-2xx response has already been read into a body; `message`
    /// should be the provider's own error text (already extracted by the codec).
    #[ inline ]
    #[ must_use ]
    pub fn from_status( provider : &str, status : u16, message : impl Into< String > ) -> Self
    {
      let kind = match status
      {
        401 | 403 => ErrorKind::Auth,
        429 => ErrorKind::RateLimited,
        500..=599 => ErrorKind::ServerError,
        400..=499 => ErrorKind::Validation,
        _ => ErrorKind::Other,
      };
      Self::new( kind, provider.to_string(), message ).with_status( status )
    }
  }

  #[ cfg( feature = "enabled" ) ]
  impl From< reqwest::Error > for RouterError
  {
    #[ inline ]
    fn from( err : reqwest::Error ) -> Self
    {
      let provider = String::new();
      if err.is_timeout()
      {
        Self::new( ErrorKind::Timeout, provider, format!( "request timeout: {err}" ) )
      }
      else if err.is_connect()
      {
        Self::new( ErrorKind::Network, provider, format!( "connection error: {err}" ) )
      }
      else if let Some( status ) = err.status()
      {
        Self::from_status( "", status.as_u16(), err.to_string() )
      }
      else
      {
        Self::new( ErrorKind::Network, provider, err.to_string() )
      }
    }
  }

  impl From< serde_json::Error > for RouterError
  {
    #[ inline ]
    fn from( err : serde_json::Error ) -> Self
    {
      Self::new( ErrorKind::Other, String::new(), format!( "decode error: {err}" ) )
    }
  }

  /// Convenience alias used throughout the crate.
  pub type Result< T > = core::result::Result< T, RouterError >;
}

crate::mod_interface!
{
  exposed use private::ErrorKind;
  exposed use private::RouterError;
  exposed use private::Result;
}
