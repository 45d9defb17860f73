//! Codec for Provider B: chat-completions endpoint, Bearer auth (OpenAI-style).

use serde_json::{ json, Value };

use crate::config::ProviderSettings;
use crate::error::{ ErrorKind, Result, RouterError };
use crate::types::{ Response, Usage };

/// Encode a canonical request into Provider B's `/chat/completions` body.
pub fn encode_request( request : &crate::types::Request, settings : &ProviderSettings ) -> Result< Vec< u8 > >
{
  let messages : Vec< Value > = request.messages.iter().map( | message | json!( {
    "role" : message.role.as_str(),
    "content" : message.text,
  } ) ).collect();

  let mut body = json!( {
    "model" : settings.model,
    "max_tokens" : settings.max_tokens,
    "messages" : messages,
    "stream" : false,
  } );

  if let Some( temperature ) = settings.temperature
  {
    body[ "temperature" ] = json!( temperature );
  }

  serde_json::to_vec( &body ).map_err( RouterError::from )
}

/// Decode a 2xx `/chat/completions` response body into a canonical response.
pub fn decode_response( bytes : &[ u8 ], provider : &str, latency_ms : u64 ) -> Result< Response >
{
  let body : Value = serde_json::from_slice( bytes ).map_err( RouterError::from )?;

  let content = body[ "choices" ][ 0 ][ "message" ][ "content" ]
    .as_str()
    .unwrap_or_default()
    .to_string();

  let usage = Usage
  {
    input_tokens : body[ "usage" ][ "prompt_tokens" ].as_u64().unwrap_or( 0 ),
    output_tokens : body[ "usage" ][ "completion_tokens" ].as_u64().unwrap_or( 0 ),
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

/// Map a non-2xx `/chat/completions` error body plus status to the canonical taxonomy.
pub fn decode_error( bytes : &[ u8 ], provider : &str, status : u16 ) -> RouterError
{
  let message = serde_json::from_slice::< Value >( bytes )
    .ok()
    .and_then( | body | body[ "error" ][ "message" ].as_str().map( str::to_string ) )
    .unwrap_or_else( || format!( "provider B returned status {status}" ) );

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
  fn encode_includes_model_and_stream_false()
  {
    let request = Request::new( "r1", "b", vec![ Message::new( Role::User, "hi" ) ] );
    let settings = ProviderSettings { model : "gpt-test".to_string(), max_tokens : 64, ..ProviderSettings::default() };

    let encoded = encode_request( &request, &settings ).unwrap();
    let body : Value = serde_json::from_slice( &encoded ).unwrap();

    assert_eq!( body[ "model" ], "gpt-test" );
    assert_eq!( body[ "stream" ], false );
  }

  #[ test ]
  fn decode_reads_first_choice()
  {
    let raw = json!( {
      "model" : "gpt-test",
      "choices" : [ { "message" : { "content" : "four" } } ],
      "usage" : { "prompt_tokens" : 5, "completion_tokens" : 2, "total_tokens" : 7 },
    } );

    let response = decode_response( &serde_json::to_vec( &raw ).unwrap(), "b", 9 ).unwrap();
    assert_eq!( response.content, "four" );
    assert_eq!( response.usage.total_tokens(), 7 );
  }
}
