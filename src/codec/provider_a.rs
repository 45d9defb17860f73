//! Codec for Provider A: messages endpoint, `x-api-key` auth (Anthropic-style).

use serde_json::{ json, Value };

use crate::config::ProviderSettings;
use crate::error::{ ErrorKind, Result, RouterError };
use crate::types::{ Response, Role, Usage };

/// Encode a canonical request into Provider A's `/messages` body.
///
/// Any message with role `system` is extracted into the top-level `system`
/// field rather than the `messages` array, matching the wire format.
pub fn encode_request( request : &crate::types::Request, settings : &ProviderSettings ) -> Result< Vec< u8 > >
{
  let mut system_parts = Vec::new();
  let mut messages = Vec::new();

  for message in &request.messages
  {
    if message.role == Role::System
    {
      system_parts.push( message.text.clone() );
    }
    else
    {
      messages.push( json!( {
        "role" : message.role.as_str(),
        "content" : message.text,
      } ) );
    }
  }

  let mut body = json!( {
    "model" : settings.model,
    "max_tokens" : settings.max_tokens,
    "messages" : messages,
  } );

  if let Some( temperature ) = settings.temperature
  {
    body[ "temperature" ] = json!( temperature );
  }
  if !system_parts.is_empty()
  {
    body[ "system" ] = json!( system_parts.join( "\n" ) );
  }

  serde_json::to_vec( &body ).map_err( RouterError::from )
}

/// Decode a 2xx `/messages` response body into a canonical response.
pub fn decode_response( bytes : &[ u8 ], provider : &str, latency_ms : u64 ) -> Result< Response >
{
  let body : Value = serde_json::from_slice( bytes ).map_err( RouterError::from )?;

  let content = body[ "content" ]
    .as_array()
    .into_iter()
    .flatten()
    .filter( | block | block.get( "type" ).and_then( Value::as_str ) == Some( "text" ) )
    .filter_map( | block | block.get( "text" ).and_then( Value::as_str ) )
    .collect::< Vec< _ > >()
    .join( "" );

  let usage = Usage
  {
    input_tokens : body[ "usage" ][ "input_tokens" ].as_u64().unwrap_or( 0 ),
    output_tokens : body[ "usage" ][ "output_tokens" ].as_u64().unwrap_or( 0 ),
  };

  Ok( Response
  {
    id : String::new(),
    provider : provider.to_string(),
    content,
    usage,
    latency_ms,
    cache_hit : false,
    fallback_used : false,
    quality : None,
    processed_at : Response::now_unix(),
    server_tag : body[ "model" ].as_str().unwrap_or_default().to_string(),
  } )
}

/// Map a non-2xx `/messages` error body plus status to the canonical taxonomy.
pub fn decode_error( bytes : &[ u8 ], provider : &str, status : u16 ) -> RouterError
{
  let message = serde_json::from_slice::< Value >( bytes )
    .ok()
    .and_then( | body | body[ "error" ][ "message" ].as_str().map( str::to_string ) )
    .unwrap_or_else( || format!( "provider A returned status {status}" ) );

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
  use crate::types::{ Message, Request };

  fn settings() -> ProviderSettings
  {
    ProviderSettings
    {
      model : "claude-test".to_string(),
      max_tokens : 256,
      temperature : Some( 0.5 ),
      ..ProviderSettings::default()
    }
  }

  #[ test ]
  fn encode_extracts_system_message()
  {
    let request = Request::new( "r1", "a", vec!
    [
      Message::new( Role::System, "be terse" ),
      Message::new( Role::User, "hi" ),
    ] );

    let encoded = encode_request( &request, &settings() ).unwrap();
    let body : Value = serde_json::from_slice( &encoded ).unwrap();

    assert_eq!( body[ "system" ], "be terse" );
    assert_eq!( body[ "messages" ].as_array().unwrap().len(), 1 );
    assert_eq!( body[ "messages" ][ 0 ][ "role" ], "user" );
  }

  #[ test ]
  fn decode_concatenates_text_blocks()
  {
    let raw = json!( {
      "model" : "claude-test",
      "content" : [
        { "type" : "text", "text" : "4" },
        { "type" : "tool_use", "text" : "ignored" },
        { "type" : "text", "text" : "!" },
      ],
      "usage" : { "input_tokens" : 3, "output_tokens" : 1 },
    } );

    let response = decode_response( &serde_json::to_vec( &raw ).unwrap(), "a", 12 ).unwrap();
    assert_eq!( response.content, "4!" );
    assert_eq!( response.usage.total_tokens(), 4 );
  }

  #[ test ]
  fn decode_error_maps_status()
  {
    let err = decode_error( b"{}", "a", 429 );
    assert_eq!( err.kind, ErrorKind::RateLimited );
    assert!( err.retryable );
  }
}
