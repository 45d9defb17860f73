//! Service Facade: the router's single public entry point.

mod private
{
  use std::collections::HashMap;
  use std::sync::Arc;

  use crate::cache::{ spawn_sweeper, ResponseCache };
  use crate::client::{ Deadline, ProviderClient };
  use crate::config::RouterConfig;
  use crate::error::Result;
  use crate::fallback::FallbackRouter;
  use crate::metrics::Metrics;
  use crate::secret::Secret;
  use crate::types::{ Request, Response };

  #[ cfg( feature = "logging" ) ]
  use tracing::instrument;

  /// The router's public entry point: cache check, fallback attempt, cache
  /// fill, metrics — in that order, on every call.
  #[ derive( Debug ) ]
  pub struct Router
  {
    config : RouterConfig,
    cache : Arc< ResponseCache >,
    fallback : FallbackRouter,
    metrics : Metrics,
    sweeper : Option< tokio::task::JoinHandle< () > >,
  }

  impl Router
  {
    /// Build a router, reading the three provider API keys from the
    /// environment (`PROVIDER_A_API_KEY`, `PROVIDER_B_API_KEY`, `PROVIDER_C_API_KEY`).
    /// Disabled providers do not need their environment variable set.
    ///
    /// # Errors
    ///
    /// Returns an error if an enabled provider's API key is missing, or if a
    /// provider's HTTP client fails to build.
    pub fn from_env( config : RouterConfig ) -> Result< Self >
    {
      let secrets = config.secrets_from_env()?;
      Self::new( config, secrets.into_iter().map( | ( tag, secret ) | ( tag.to_string(), secret ) ).collect() )
    }

    /// Build a router from explicit secrets, one per enabled provider tag.
    ///
    /// # Errors
    ///
    /// Returns an error if an enabled provider's HTTP client fails to build.
    pub fn new( config : RouterConfig, secrets : HashMap< String, Secret > ) -> Result< Self >
    {
      let mut clients = Vec::new();
      for ( tag, settings ) in
        [ ( "a", &config.provider_a ), ( "b", &config.provider_b ), ( "c", &config.provider_c ) ]
      {
        if !settings.enabled
        {
          continue;
        }
        let Some( kind ) = RouterConfig::kind_for( tag ) else { continue };
        let Some( secret ) = secrets.get( tag ) else { continue };
        clients.push( ProviderClient::new( tag, kind, settings.clone(), secret.clone(), config.max_log_content_length )? );
      }

      let cache = Arc::new( ResponseCache::new( config.cache.clone() ) );
      let sweeper = config.cache.enabled.then(
        || spawn_sweeper( cache.clone(), config.cache.cleanup_interval )
      );

      let fallback = FallbackRouter::new( clients, config.fallback.clone(), config.breaker );

      Ok( Self { config, cache, fallback, metrics : Metrics::new(), sweeper } )
    }

    /// Process one request end to end: cache check, fallback attempt, cache
    /// fill, metrics recording. Builds its own internal deadline, bounded by
    /// three times the configured per-attempt timeout; callers who need to
    /// cancel a call in flight should use [`Self::process_with_deadline`].
    #[ cfg_attr( feature = "logging", instrument( skip( self, request ) ) ) ]
    pub async fn process( &self, request : &Request ) -> Result< Response >
    {
      let deadline = Deadline::after( self.config.fallback.per_attempt_timeout * 3 );
      self.process_with_deadline( request, &deadline ).await
    }

    /// Process one request end to end against a caller-supplied, optionally
    /// cancellable `deadline` (see [`Deadline::cancellable`]). Cancelling the
    /// deadline mid-retry-backoff surfaces `timeout` without making a further
    /// HTTP call. The router never extends the caller's deadline.
    #[ cfg_attr( feature = "logging", instrument( skip( self, request, deadline ) ) ) ]
    pub async fn process_with_deadline( &self, request : &Request, deadline : &Deadline ) -> Result< Response >
    {
      let mut request = request.clone();
      if request.provider.is_empty()
      {
        request.provider.clone_from( &self.config.primary );
      }
      request.metadata.stamp_now();

      if let Some( mut cached ) = self.cache.get( &request )
      {
        cached.cache_hit = true;
        self.metrics.record_cache_hit( &request.provider );
        return Ok( cached );
      }
      self.metrics.record_cache_miss( &request.provider );

      match self.fallback.process_with_fallback( &request, deadline ).await
      {
        Ok( mut response ) =>
        {
          self.metrics.record_success( &response.provider, response.latency_ms );
          response.cache_hit = false;
          self.cache.set( &request, &response );
          Ok( response )
        },
        Err( error ) =>
        {
          self.metrics.record_error( &request.provider, error.kind );
          Err( error )
        },
      }
    }

    /// Probe every registered provider; returns each provider's outcome.
    pub async fn health_check( &self ) -> HashMap< String, Result< () > >
    {
      self.fallback.health_check().await
    }

    /// Read-only metadata consulted by callers: each enabled provider's
    /// configured rate-limit triplet. Never enforced by the router itself.
    #[ must_use ]
    pub fn rate_limits( &self ) -> HashMap< String, ( u32, u32, u32 ) >
    {
      self.fallback
        .registered_providers()
        .into_iter()
        .filter_map( | tag | self.config.settings_for( &tag ).map( | settings | ( tag, settings.rate_limit ) ) )
        .collect()
    }

    /// Snapshot current metrics for every provider.
    #[ must_use ]
    pub fn metrics( &self ) -> &Metrics
    {
      &self.metrics
    }

    /// Stop the background cache sweeper and release owned resources.
    ///
    /// # Errors
    ///
    /// This implementation never fails; the `Result` return mirrors the
    /// caller-facing `close() -> Error` contract exactly.
    pub async fn close( &mut self ) -> Result< () >
    {
      if let Some( sweeper ) = self.sweeper.take()
      {
        sweeper.abort();
      }
      Ok( () )
    }
  }
}

crate::mod_interface!
{
  exposed use private::Router;
}
