//! Canonical, provider-agnostic request/response shapes.

mod private
{
  use serde::{ Deserialize, Serialize };
  use std::collections::BTreeMap;
  use std::time::{ SystemTime, UNIX_EPOCH };

  /// A message role in a canonical conversation.
  #[ derive( Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize ) ]
  #[ serde( rename_all = "snake_case" ) ]
  pub enum Role
  {
    /// System-level instruction.
    System,
    /// End-user message.
    User,
    /// Model-authored message.
    Assistant,
  }

  impl Role
  {
    /// Wire string for this role, stable across providers.
    #[ inline ]
    #[ must_use ]
    pub fn as_str( &self ) -> &'static str
    {
      match self
      {
        Self::System => "system",
        Self::User => "user",
        Self::Assistant => "assistant",
      }
    }
  }

  /// One message in a canonical conversation.
  #[ derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize ) ]
  pub struct Message
  {
    /// Role of the message author.
    pub role : Role,
    /// Message text.
    pub text : String,
  }

  impl Message
  {
    /// Build a message in one call.
    #[ inline ]
    #[ must_use ]
    pub fn new( role : Role, text : impl Into< String > ) -> Self
    {
      Self { role, text : text.into() }
    }
  }

  /// Caller-attached bookkeeping that never affects the cache key.
  #[ derive( Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize ) ]
  pub struct RequestMetadata
  {
    /// Originating repository, if known.
    pub repository : Option< String >,
    /// Session identifier for log correlation.
    pub session_id : Option< String >,
    /// Caller identifier for log correlation.
    pub user_id : Option< String >,
    /// Free-form tags for logging/filtering.
    pub tags : Vec< String >,
    /// Unix timestamp (seconds) the request was stamped by the facade.
    pub created_at : Option< u64 >,
  }

  impl RequestMetadata
  {
    /// Stamp `created_at` with the current wall-clock time.
    #[ inline ]
    pub fn stamp_now( &mut self )
    {
      let now = SystemTime::now()
        .duration_since( UNIX_EPOCH )
        .map( | d | d.as_secs() )
        .unwrap_or( 0 );
      self.created_at = Some( now );
    }
  }

  /// Canonical, provider-agnostic chat request.
  #[ derive( Debug, Clone, PartialEq, Eq, Serialize, Deserialize ) ]
  pub struct Request
  {
    /// Stable identifier for the lifetime of this request; feeds logging, not the cache key.
    pub id : String,
    /// Preferred provider tag. Empty means "use the configured primary".
    pub provider : String,
    /// Ordered conversation turns. Must be non-empty.
    pub messages : Vec< Message >,
    /// Arbitrary string context, folded into the cache key in sorted order.
    pub context : BTreeMap< String, String >,
    /// Logging-only bookkeeping.
    pub metadata : RequestMetadata,
  }

  impl Request
  {
    /// Build a request with an empty context and default metadata.
    #[ inline ]
    #[ must_use ]
    pub fn new( id : impl Into< String >, provider : impl Into< String >, messages : Vec< Message > ) -> Self
    {
      Self
      {
        id : id.into(),
        provider : provider.into(),
        messages,
        context : BTreeMap::new(),
        metadata : RequestMetadata::default(),
      }
    }

    /// Shallow copy of `self` with `provider` overridden, as used by the fallback router
    /// when walking the provider chain. Never mutates `self`.
    #[ inline ]
    #[ must_use ]
    pub fn with_provider( &self, provider : &str ) -> Self
    {
      let mut clone = self.clone();
      clone.provider = provider.to_string();
      clone
    }
  }

  /// Token accounting reported by a provider.
  #[ derive( Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize ) ]
  pub struct Usage
  {
    /// Input (prompt) tokens.
    pub input_tokens : u64,
    /// Output (completion) tokens.
    pub output_tokens : u64,
  }

  impl Usage
  {
    /// `input_tokens + output_tokens`.
    #[ inline ]
    #[ must_use ]
    pub fn total_tokens( &self ) -> u64
    {
      self.input_tokens + self.output_tokens
    }
  }

  /// Optional quality scoring, passed through from the provider response when present.
  #[ derive( Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize ) ]
  pub struct Quality
  {
    /// Confidence score in [0,1].
    pub confidence : f64,
    /// Relevance score in [0,1].
    pub relevance : f64,
    /// Clarity score in [0,1].
    pub clarity : f64,
    /// Completeness score in [0,1].
    pub completeness : f64,
  }

  impl Quality
  {
    /// Unweighted mean of the four component scores.
    #[ inline ]
    #[ must_use ]
    pub fn composite( &self ) -> f64
    {
      ( self.confidence + self.relevance + self.clarity + self.completeness ) / 4.0
    }
  }

  /// Canonical, provider-agnostic chat response.
  #[ derive( Debug, Clone, PartialEq, Serialize, Deserialize ) ]
  pub struct Response
  {
    /// Echoes `Request::id`.
    pub id : String,
    /// Provider tag that actually produced this response.
    pub provider : String,
    /// Response text.
    pub content : String,
    /// Token usage reported by the provider.
    pub usage : Usage,
    /// Wall-clock latency of the successful attempt, in milliseconds.
    pub latency_ms : u64,
    /// True iff this response was served from the cache.
    pub cache_hit : bool,
    /// True iff a non-preferred provider answered.
    pub fallback_used : bool,
    /// Optional pass-through quality record.
    pub quality : Option< Quality >,
    /// Unix timestamp (seconds) the response was finalized.
    pub processed_at : u64,
    /// Server/version tag, opaque to the router.
    pub server_tag : String,
  }

  impl Response
  {
    /// Current time as a Unix timestamp in seconds, used for `processed_at`.
    #[ inline ]
    #[ must_use ]
    pub fn now_unix() -> u64
    {
      SystemTime::now()
        .duration_since( UNIX_EPOCH )
        .map( | d | d.as_secs() )
        .unwrap_or( 0 )
    }
  }
}

crate::mod_interface!
{
  exposed use private::Role;
  exposed use private::Message;
  exposed use private::RequestMetadata;
  exposed use private::Request;
  exposed use private::Usage;
  exposed use private::Quality;
  exposed use private::Response;
}
