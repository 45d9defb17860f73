#![ doc( html_root_url = "https://docs.rs/ai_router/latest/ai_router/" ) ]

//! # AI Request Router
//!
//! A multi-provider AI request router in front of a set of remote LLM HTTP
//! APIs, exposing one canonical request/response contract to callers.
//!
//! ## Governing Principle: cache → fallback → cache fill → metrics
//!
//! [`Router::process`] is the only entry point most callers need. Internally
//! it consults the response cache, walks an ordered provider chain through
//! the fallback router (each hop gated by that provider's circuit breaker and
//! retried locally on transient errors by its own provider client), fills the
//! cache on success, and records metrics — always in that order.
//!
//! ## Reliability Features
//!
//! - **Linear-backoff retry**: bounded by `max_retries`, local to one provider.
//! - **Circuit breaker**: closed/open/half-open per provider, counting only
//!   transport/server failures.
//! - **Fallback chain**: tries the next provider on a terminal error, never
//!   retrying one that already failed.
//! - **Response cache**: content-addressed, TTL + LRU + bounded size, with a
//!   background sweeper task.
//!
//! ## State Management Policy
//!
//! All router state — cache entries, breaker state, metrics — is
//! runtime-stateful and process-stateless: it lives entirely in memory and
//! does not survive a process restart.

#[ cfg( feature = "enabled" ) ]
use mod_interface::mod_interface;

mod private {}

#[ cfg( feature = "enabled" ) ]
crate::mod_interface!
{
  layer types;
  layer error;
  layer secret;
  layer config;
  layer codec;
  layer auth;
  layer retry;
  layer client;
  layer cache;
  layer circuit_breaker;
  layer fallback;
  layer metrics;
  layer router;
}
