//! Wire codecs: pure functions translating the canonical request/response shape
//! to and from each provider's JSON wire format.
//!
//! Per-provider polymorphism is modeled as a capability bundle of function
//! pointers rather than a trait object or inheritance hierarchy — the codecs
//! hold no state and perform no I/O.

pub mod provider_a;
pub mod provider_b;
pub mod provider_c;

mod private
{
  use crate::config::ProviderSettings;
  use crate::error::Result;
  use crate::types::{ Request, Response };

  /// `encode-request(canonical, config) -> provider-body`.
  pub type EncodeFn = fn( &Request, &ProviderSettings ) -> Result< Vec< u8 > >;

  /// `decode-response(bytes, latency_ms) -> canonical Response`.
  pub type DecodeFn = fn( &[ u8 ], &str, u64 ) -> Result< Response >;

  /// Maps a non-2xx body plus status to the canonical error taxonomy.
  pub type DecodeErrorFn = fn( &[ u8 ], &str, u16 ) -> crate::error::RouterError;

  /// The three remote provider families the router speaks to.
  #[ derive( Debug, Clone, Copy, PartialEq, Eq, Hash ) ]
  pub enum ProviderKind
  {
    /// Messages endpoint, `x-api-key` auth (Anthropic-style).
    A,
    /// Chat-completions endpoint, Bearer auth (OpenAI-style).
    B,
    /// Chat-completions-compatible, Bearer auth, extra sampling params.
    C,
  }

  /// A provider's codec, bundled as three pure function pointers.
  #[ derive( Debug, Clone, Copy ) ]
  pub struct Codec
  {
    /// Provider family this codec speaks.
    pub kind : ProviderKind,
    /// Canonical request to provider JSON body.
    pub encode : EncodeFn,
    /// Provider JSON body (2xx) to canonical response.
    pub decode : DecodeFn,
    /// Provider JSON body (non-2xx) to canonical error.
    pub decode_error : DecodeErrorFn,
  }

  impl ProviderKind
  {
    /// Resolve this family's codec bundle.
    #[ inline ]
    #[ must_use ]
    pub fn codec( self ) -> Codec
    {
      match self
      {
        Self::A => Codec
        {
          kind : self,
          encode : super::provider_a::encode_request,
          decode : super::provider_a::decode_response,
          decode_error : super::provider_a::decode_error,
        },
        Self::B => Codec
        {
          kind : self,
          encode : super::provider_b::encode_request,
          decode : super::provider_b::decode_response,
          decode_error : super::provider_b::decode_error,
        },
        Self::C => Codec
        {
          kind : self,
          encode : super::provider_c::encode_request,
          decode : super::provider_c::decode_response,
          decode_error : super::provider_c::decode_error,
        },
      }
    }

    /// Accepted temperature range for this provider family.
    #[ inline ]
    #[ must_use ]
    pub fn temperature_range( self ) -> ( f64, f64 )
    {
      match self
      {
        Self::A => ( 0.0, 1.0 ),
        Self::B | Self::C => ( 0.0, 2.0 ),
      }
    }

    /// HTTP path appended to the provider's base URL.
    #[ inline ]
    #[ must_use ]
    pub fn endpoint_path( self ) -> &'static str
    {
      match self
      {
        Self::A => "/messages",
        Self::B | Self::C => "/chat/completions",
      }
    }
  }
}

crate::mod_interface!
{
  exposed use private::EncodeFn;
  exposed use private::DecodeFn;
  exposed use private::DecodeErrorFn;
  exposed use private::ProviderKind;
  exposed use private::Codec;
}
