//! Codec for Provider C: chat-completions-compatible, Bearer auth, with extra
//! optional sampling parameters not present on Provider B.

use serde_json::{ json, Value };

use crate::config::ProviderSettings;
use crate::error::{ ErrorKind, Result, RouterError };
use crate::types::Response;

/// Encode a canonical request into Provider C's body. Same shape as Provider B
/// with optional `top_p`, `frequency_penalty`, `presence_penalty`.
pub fn encode_request( request : &crate::types::Request, settings : &ProviderSettings ) -> Result< Vec< u8 > >
{
  let mut body = serde_json::from_slice::< Value >(
    &super::provider_b::encode_request( request, settings )?
  ).map_err( RouterError::from )?;

  if let Some( top_p ) = settings.top_p
  {
    body[ "top_p" ] = json!( top_p );
  }
  if let Some( frequency_penalty ) = settings.frequency_penalty
  {
    body[ "frequency_penalty" ] = json!( frequency_penalty );
  }
  if let Some( presence_penalty ) = settings.presence_penalty
  {
    body[ "presence_penalty" ] = json!( presence_penalty );
  }

  serde_json::to_vec( &body ).map_err( RouterError::from )
}

/// Decode is identical in shape to Provider B's.
pub fn decode_response( bytes : &[ u8 ], provider : &str, latency_ms : u64 ) -> Result< Response >
{
  super::provider_b::decode_response( bytes, provider, latency_ms )
}

/// Error mapping is identical in shape to Provider B's, re-tagged for messages.
pub fn decode_error( bytes : &[ u8 ], provider : &str, status : u16 ) -> RouterError
{
  let message = serde_json::from_slice::< Value >( bytes )
    .ok()
    .and_then( | body | body[ "error" ][ "message" ].as_str().map( str::to_string ) )
    .unwrap_or_else( || format!( "provider C returned status {status}" ) );

  let kind = match status
  {
    401 | 403 => ErrorKind::Auth,
    429 => ErrorKind::RateLimited,
    500..=599 => ErrorKind::ServerError,
    _ => ErrorKind::Other,
  };

  RouterError::new( kind, provider.to_string(), message ).with_status( status )
}

#[ cfg( test ) ]
mod tests
{
  use super::*;
  use crate::types::{ Message, Request, Role };

  #[ test ]
  fn encode_adds_extra_sampling_params()
  {
    let request = Request::new( "r1", "c", vec![ Message::new( Role::User, "hi" ) ] );
    let settings = ProviderSettings
    {
      model : "compat-test".to_string(),
      max_tokens : 64,
      top_p : Some( 0.9 ),
      frequency_penalty : Some( 0.1 ),
      presence_penalty : Some( 0.2 ),
      ..ProviderSettings::default()
    };

    let encoded = encode_request( &request, &settings ).unwrap();
    let body : Value = serde_json::from_slice( &encoded ).unwrap();

    assert_eq!( body[ "top_p" ], 0.9 );
    assert_eq!( body[ "frequency_penalty" ], 0.1 );
    assert_eq!( body[ "presence_penalty" ], 0.2 );
  }
}
