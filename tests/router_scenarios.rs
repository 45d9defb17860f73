//! End-to-end scenarios for `Router::process` against local mock servers.
//!
//! ## Implementation Notes
//!
//! - Uses `wiremock` for deterministic, local-only HTTP stubs — no network
//!   dependency, fast, and safe to run in CI.
//! - Each scenario below corresponds to a literal input/output pair: cache
//!   miss then hit, fallback on a 500, validation rejection, circuit breaker
//!   trip, TTL expiry, LRU eviction.

use std::collections::HashMap;
use std::time::Duration;

use ai_router::{
  BreakerSettings, CacheSettings, Deadline, FallbackSettings, FallbackStrategy,
  Message, ProviderSettings, Request, ErrorKind, Role, Router, RouterConfig, Secret,
};
use wiremock::matchers::method;
use wiremock::{ Mock, MockServer, ResponseTemplate };

fn provider_settings( base_url : String ) -> ProviderSettings
{
  ProviderSettings
  {
    base_url,
    model : "test-model".to_string(),
    max_retries : 3,
    retry_delay : Duration::from_millis( 10 ),
    ..ProviderSettings::default()
  }
}

fn secrets() -> HashMap< String, Secret >
{
  [ "a", "b", "c" ].into_iter().map( | tag | ( tag.to_string(), Secret::new( "test-key" ) ) ).collect()
}

fn request( provider : &str ) -> Request
{
  Request::new( "r1", provider, vec![ Message::new( Role::User, "2+2?" ) ] )
}

#[ tokio::test ]
async fn cache_miss_then_hit()
{
  let server = MockServer::start().await;
  Mock::given( method( "POST" ) )
    .respond_with( ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( {
      "model" : "test-model",
      "content" : [ { "type" : "text", "text" : "4" } ],
      "usage" : { "input_tokens" : 3, "output_tokens" : 1 },
    } ) ) )
    .expect( 1 )
    .mount( &server )
    .await;

  let mut config = RouterConfig::default();
  config.provider_a = provider_settings( server.uri() );
  config.provider_b.enabled = false;
  config.provider_c.enabled = false;

  let router = Router::new( config, secrets() ).unwrap();

  let first = router.process( &request( "a" ) ).await.unwrap();
  assert_eq!( first.content, "4" );
  assert!( !first.cache_hit );

  let second = router.process( &request( "a" ) ).await.unwrap();
  assert_eq!( second.content, "4" );
  assert!( second.cache_hit );
}

#[ tokio::test ]
async fn fallback_on_server_error()
{
  let server_a = MockServer::start().await;
  Mock::given( method( "POST" ) ).respond_with( ResponseTemplate::new( 500 ).set_body_json( serde_json::json!( {
    "error" : { "message" : "internal" },
  } ) ) ).mount( &server_a ).await;

  let server_b = MockServer::start().await;
  Mock::given( method( "POST" ) ).respond_with( ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( {
    "choices" : [ { "message" : { "content" : "four" } } ],
    "usage" : { "prompt_tokens" : 3, "completion_tokens" : 1, "total_tokens" : 4 },
  } ) ) ).mount( &server_b ).await;

  let mut config = RouterConfig::default();
  config.provider_a = ProviderSettings { max_retries : 1, ..provider_settings( server_a.uri() ) };
  config.provider_b = provider_settings( server_b.uri() );
  config.provider_c.enabled = false;
  config.fallback = FallbackSettings::default().with_strategy( FallbackStrategy::AFirst );

  let router = Router::new( config, secrets() ).unwrap();

  let response = router.process( &request( "a" ) ).await.unwrap();
  assert_eq!( response.content, "four" );
  assert_eq!( response.provider, "b" );
  assert!( response.fallback_used );
}

#[ tokio::test ]
async fn validation_rejection_makes_no_http_calls()
{
  let server = MockServer::start().await;
  Mock::given( method( "POST" ) ).respond_with( ResponseTemplate::new( 200 ) ).expect( 0 ).mount( &server ).await;

  let mut config = RouterConfig::default();
  config.provider_a = provider_settings( server.uri() );
  config.provider_b.enabled = false;
  config.provider_c.enabled = false;

  let router = Router::new( config, secrets() ).unwrap();

  let empty = Request::new( "r1", "a", vec![] );
  let error = router.process( &empty ).await.unwrap_err();
  assert_eq!( error.kind, ErrorKind::Validation );
}

#[ tokio::test ]
async fn breaker_trips_then_skips_provider()
{
  let server_a = MockServer::start().await;
  Mock::given( method( "POST" ) ).respond_with( ResponseTemplate::new( 500 ) ).mount( &server_a ).await;

  let server_b = MockServer::start().await;
  Mock::given( method( "POST" ) ).respond_with( ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( {
    "choices" : [ { "message" : { "content" : "fallback answer" } } ],
    "usage" : { "prompt_tokens" : 1, "completion_tokens" : 1, "total_tokens" : 2 },
  } ) ) ).mount( &server_b ).await;

  let mut config = RouterConfig::default();
  config.provider_a = ProviderSettings { max_retries : 1, ..provider_settings( server_a.uri() ) };
  config.provider_b = provider_settings( server_b.uri() );
  config.provider_c.enabled = false;
  config.breaker = BreakerSettings::default().with_max_failures( 3 ).with_reset_timeout( Duration::from_secs( 60 ) );
  config.cache = CacheSettings { enabled : false, ..CacheSettings::default() };

  let router = Router::new( config, secrets() ).unwrap();

  for _ in 0..3
  {
    let response = router.process( &request( "a" ) ).await.unwrap();
    assert_eq!( response.provider, "b" );
  }

  let requests_to_a_before = server_a.received_requests().await.unwrap().len();
  let response = router.process( &request( "a" ) ).await.unwrap();
  assert_eq!( response.provider, "b" );
  let requests_to_a_after = server_a.received_requests().await.unwrap().len();
  assert_eq!( requests_to_a_before, requests_to_a_after, "breaker should skip A once open" );
}

#[ tokio::test ]
async fn ttl_expiry_yields_miss()
{
  let server = MockServer::start().await;
  Mock::given( method( "POST" ) ).respond_with( ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( {
    "model" : "test-model",
    "content" : [ { "type" : "text", "text" : "4" } ],
    "usage" : { "input_tokens" : 1, "output_tokens" : 1 },
  } ) ) ).expect( 2 ).mount( &server ).await;

  let mut config = RouterConfig::default();
  config.provider_a = provider_settings( server.uri() );
  config.provider_b.enabled = false;
  config.provider_c.enabled = false;
  config.cache = CacheSettings::default().with_ttl( Duration::from_millis( 100 ) );

  let router = Router::new( config, secrets() ).unwrap();

  let first = router.process( &request( "a" ) ).await.unwrap();
  assert!( !first.cache_hit );

  tokio::time::sleep( Duration::from_millis( 150 ) ).await;

  let second = router.process( &request( "a" ) ).await.unwrap();
  assert!( !second.cache_hit, "entry should have expired" );
}

#[ tokio::test ]
async fn retry_budget_exhausted_makes_max_retries_plus_one_calls()
{
  let server = MockServer::start().await;
  Mock::given( method( "POST" ) ).respond_with( ResponseTemplate::new( 429 ).set_body_json( serde_json::json!( {
    "error" : { "message" : "rate limited" },
  } ) ) ).expect( 4 ).mount( &server ).await;

  let mut config = RouterConfig::default();
  config.provider_a = provider_settings( server.uri() );
  config.provider_b.enabled = false;
  config.provider_c.enabled = false;
  config.breaker = BreakerSettings::default().with_max_failures( 100 );

  let router = Router::new( config, secrets() ).unwrap();

  let error = router.process( &request( "a" ) ).await.unwrap_err();
  assert_eq!( error.kind, ErrorKind::RateLimited );
}

#[ tokio::test ]
async fn retry_succeeds_after_two_rate_limits()
{
  let server = MockServer::start().await;
  Mock::given( method( "POST" ) )
    .respond_with( ResponseTemplate::new( 429 ).set_body_json( serde_json::json!( {
      "error" : { "message" : "rate limited" },
    } ) ) )
    .up_to_n_times( 2 )
    .expect( 2 )
    .mount( &server )
    .await;
  Mock::given( method( "POST" ) )
    .respond_with( ResponseTemplate::new( 200 ).set_body_json( serde_json::json!( {
      "model" : "test-model",
      "content" : [ { "type" : "text", "text" : "4" } ],
      "usage" : { "input_tokens" : 1, "output_tokens" : 1 },
    } ) ) )
    .expect( 1 )
    .mount( &server )
    .await;

  let mut config = RouterConfig::default();
  config.provider_a = provider_settings( server.uri() );
  config.provider_b.enabled = false;
  config.provider_c.enabled = false;

  let router = Router::new( config, secrets() ).unwrap();

  let response = router.process( &request( "a" ) ).await.unwrap();
  assert_eq!( response.content, "4" );
}

#[ tokio::test ]
async fn cancelling_mid_backoff_yields_timeout_with_no_further_calls()
{
  let server = MockServer::start().await;
  Mock::given( method( "POST" ) ).respond_with( ResponseTemplate::new( 500 ).set_body_json( serde_json::json!( {
    "error" : { "message" : "internal" },
  } ) ) ).mount( &server ).await;

  let mut config = RouterConfig::default();
  config.provider_a = ProviderSettings
  {
    max_retries : 5,
    retry_delay : Duration::from_millis( 500 ),
    ..provider_settings( server.uri() )
  };
  config.provider_b.enabled = false;
  config.provider_c.enabled = false;

  let router = Router::new( config, secrets() ).unwrap();

  let ( deadline, cancel ) = Deadline::cancellable( Duration::from_secs( 5 ) );
  let call = tokio::spawn( async move { router.process_with_deadline( &request( "a" ), &deadline ).await } );

  // Let the first attempt fail and enter its retry-backoff sleep, then cancel.
  tokio::time::sleep( Duration::from_millis( 50 ) ).await;
  cancel.send( true ).unwrap();

  let error = call.await.unwrap().unwrap_err();
  assert_eq!( error.kind, ErrorKind::Timeout );

  let requests = server.received_requests().await.unwrap().len();
  assert_eq!( requests, 1, "cancellation during backoff must not trigger a further HTTP call" );
}
