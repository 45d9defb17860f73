//! Fallback Router: ordered attempt chain across providers, with a timeout
//! per attempt and per-provider circuit breaking.

mod private
{
  use std::collections::HashMap;

  use crate::circuit_breaker::{ Admission, BreakerRegistry };
  use crate::client::{ Deadline, ProviderClient };
  use crate::config::{ BreakerSettings, FallbackSettings, FallbackStrategy };
  use crate::error::{ ErrorKind, Result, RouterError };
  use crate::types::{ Request, Response };

  #[ cfg( feature = "logging" ) ]
  use tracing::debug;

  /// Holds the provider-tag-to-client map and the strategy selecting chain order.
  #[ derive( Debug ) ]
  pub struct FallbackRouter
  {
    clients : HashMap< String, ProviderClient >,
    breakers : BreakerRegistry,
    breaker_settings : BreakerSettings,
    settings : FallbackSettings,
  }

  impl FallbackRouter
  {
    /// Build a router from its registered clients.
    #[ inline ]
    #[ must_use ]
    pub fn new( clients : Vec< ProviderClient >, settings : FallbackSettings, breaker_settings : BreakerSettings ) -> Self
    {
      let clients = clients.into_iter().map( | client | ( client.tag().to_string(), client ) ).collect();
      Self { clients, breakers : BreakerRegistry::new(), breaker_settings, settings }
    }

    fn base_chain( &self ) -> Vec< &str >
    {
      let order : [ &str ; 3 ] = match self.settings.strategy
      {
        FallbackStrategy::AFirst | FallbackStrategy::FastestFirst => [ "a", "b", "c" ],
        FallbackStrategy::BFirst => [ "b", "a", "c" ],
      };
      order.into_iter().filter( | tag | self.clients.contains_key( *tag ) ).collect()
    }

    /// Build the chain for one request: base strategy order, rotated so the
    /// request's preferred provider (if set and registered) goes first.
    fn chain_for( &self, request : &Request ) -> Vec< String >
    {
      let base = self.base_chain();
      if request.provider.is_empty() || !self.clients.contains_key( request.provider.as_str() )
      {
        return base.into_iter().map( String::from ).collect();
      }

      let mut rotated = vec![ request.provider.clone() ];
      rotated.extend( base.into_iter().filter( | tag | *tag != request.provider ).map( String::from ) );
      rotated
    }

    /// Walk the chain for this request, trying one provider at a time.
    /// Never retries a provider — that is the Provider Client's job — and
    /// never consults the cache.
    pub async fn process_with_fallback( &self, request : &Request, deadline : &Deadline ) -> Result< Response >
    {
      let chain = self.chain_for( request );
      if chain.is_empty()
      {
        return Err( RouterError::new( ErrorKind::Other, String::new(), "no providers available" ) );
      }

      let mut last_error : Option< RouterError > = None;
      let mut attempted_any = false;

      for ( position, tag ) in chain.iter().enumerate()
      {
        let breaker = self.breakers.get_or_create( tag, self.breaker_settings );
        if breaker.admit() == Admission::Skip
        {
          #[ cfg( feature = "logging" ) ]
          debug!( provider = %tag, "skipping provider: circuit open" );
          continue;
        }

        let Some( client ) = self.clients.get( tag.as_str() ) else { continue };
        attempted_any = true;

        let per_attempt = deadline.bounded( self.settings.per_attempt_timeout );
        let attempt_request = request.with_provider( tag );

        match client.process( &attempt_request, &per_attempt ).await
        {
          Ok( mut response ) =>
          {
            breaker.record_success();
            response.fallback_used = position != 0;
            return Ok( response );
          },
          Err( error ) =>
          {
            breaker.record_failure( error.kind );
            last_error = Some( error );
          },
        }
      }

      match last_error
      {
        Some( error ) => Err( error ),
        None if !attempted_any => Err( RouterError::new( ErrorKind::Other, String::new(), "no-providers-available" ) ),
        None => Err( RouterError::new( ErrorKind::Other, String::new(), "no-providers-available" ) ),
      }
    }

    /// Health-check every registered provider with a minimal validation-only
    /// call, returning each provider's outcome.
    pub async fn health_check( &self ) -> HashMap< String, Result< () > >
    {
      let mut results = HashMap::new();
      for ( tag, client ) in &self.clients
      {
        let probe = Request::new( "health-check", tag.clone(), vec!
        [
          crate::types::Message::new( crate::types::Role::User, "ping" )
        ] );
        let deadline = Deadline::after( std::time::Duration::from_secs( 5 ) );
        let outcome = client.process( &probe, &deadline ).await.map( | _ | () );
        results.insert( tag.clone(), outcome );
      }
      results
    }

    /// Registered provider tags, in strategy order.
    #[ must_use ]
    pub fn registered_providers( &self ) -> Vec< String >
    {
      self.base_chain().into_iter().map( String::from ).collect()
    }

    /// Shared breaker state, exposed for metrics reporting.
    #[ must_use ]
    pub fn breakers( &self ) -> &BreakerRegistry
    {
      &self.breakers
    }
  }
}

crate::mod_interface!
{
  exposed use private::FallbackRouter;
}

#[ cfg( test ) ]
mod tests
{
  use super::private::FallbackRouter;
  use crate::client::{ Deadline, ProviderClient };
  use crate::codec::ProviderKind;
  use crate::config::{ BreakerSettings, FallbackSettings, FallbackStrategy, ProviderSettings };
  use crate::secret::Secret;
  use crate::types::{ Message, Request, Role };
  use std::time::Duration;

  fn client_for( tag : &str, kind : ProviderKind, base_url : String ) -> ProviderClient
  {
    let settings = ProviderSettings
    {
      base_url,
      model : "m".to_string(),
      max_retries : 1,
      retry_delay : Duration::from_millis( 10 ),
      ..ProviderSettings::default()
    };
    ProviderClient::new( tag, kind, settings, Secret::new( "k" ), 200 ).expect( "client build" )
  }

  #[ tokio::test ]
  async fn chain_rotates_to_preferred_provider()
  {
    let router = FallbackRouter::new(
      vec!
      [
        client_for( "a", ProviderKind::A, "http://127.0.0.1:1".to_string() ),
        client_for( "b", ProviderKind::B, "http://127.0.0.1:1".to_string() ),
      ],
      FallbackSettings { strategy : FallbackStrategy::AFirst, per_attempt_timeout : Duration::from_millis( 50 ) },
      BreakerSettings::default(),
    );

    let request = Request::new( "r1", "b", vec![ Message::new( Role::User, "hi" ) ] );
    let deadline = Deadline::after( Duration::from_millis( 200 ) );
    let result = router.process_with_fallback( &request, &deadline ).await;
    assert!( result.is_err() );
  }
}
