//! Circuit Breaker: per-provider closed/open/half-open failure accounting.

mod private
{
  use std::collections::HashMap;
  use std::sync::{ Arc, Mutex };
  use std::time::Instant;

  use crate::config::BreakerSettings;
  use crate::error::ErrorKind;

  #[ cfg( feature = "logging" ) ]
  use tracing::{ info, warn };

  /// The three states a single provider's circuit can be in.
  #[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
  pub enum CircuitState
  {
    /// Attempts pass through normally.
    Closed,
    /// Attempts fail fast; a timer is armed to admit a probe.
    Open,
    /// A single probe attempt is allowed through.
    HalfOpen,
  }

  #[ derive( Debug ) ]
  struct Inner
  {
    state : CircuitState,
    consecutive_failures : u32,
    opened_at : Option< Instant >,
    probe_in_flight : bool,
  }

  /// A single provider's breaker. State transitions are serialized; admission
  /// of a half-open probe is exclusive (at most one probe in flight).
  #[ derive( Debug ) ]
  pub struct CircuitBreaker
  {
    settings : BreakerSettings,
    inner : Mutex< Inner >,
  }

  /// What the breaker decided about an attempt before it was made.
  #[ derive( Debug, Clone, Copy, PartialEq, Eq ) ]
  pub enum Admission
  {
    /// The attempt may proceed.
    Allowed,
    /// The circuit is open; skip this provider.
    Skip,
  }

  impl CircuitBreaker
  {
    /// Build a new, closed breaker.
    #[ inline ]
    #[ must_use ]
    pub fn new( settings : BreakerSettings ) -> Self
    {
      Self
      {
        settings,
        inner : Mutex::new( Inner { state : CircuitState::Closed, consecutive_failures : 0, opened_at : None, probe_in_flight : false } ),
      }
    }

    /// Current state, without mutating anything (a stale `Open` whose timer
    /// has elapsed is reported as-is; `admit` is what performs the transition).
    #[ inline ]
    #[ must_use ]
    pub fn state( &self ) -> CircuitState
    {
      self.inner.lock().unwrap_or_else( std::sync::PoisonError::into_inner ).state
    }

    /// Decide whether an attempt may proceed, transitioning open to
    /// half-open if the reset timer has elapsed.
    pub fn admit( &self ) -> Admission
    {
      let mut inner = self.inner.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      match inner.state
      {
        CircuitState::Closed => Admission::Allowed,
        CircuitState::HalfOpen =>
        {
          if inner.probe_in_flight
          {
            Admission::Skip
          }
          else
          {
            inner.probe_in_flight = true;
            Admission::Allowed
          }
        },
        CircuitState::Open =>
        {
          let elapsed = inner.opened_at.is_some_and( | at | at.elapsed() >= self.settings.reset_timeout );
          if elapsed
          {
            inner.state = CircuitState::HalfOpen;
            inner.probe_in_flight = true;

            #[ cfg( feature = "logging" ) ]
            info!( "circuit breaker admitting half-open probe" );

            Admission::Allowed
          }
          else
          {
            Admission::Skip
          }
        },
      }
    }

    /// Record a successful attempt.
    pub fn record_success( &self )
    {
      let mut inner = self.inner.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      inner.consecutive_failures = 0;
      inner.probe_in_flight = false;
      if inner.state != CircuitState::Closed
      {
        inner.state = CircuitState::Closed;
        inner.opened_at = None;

        #[ cfg( feature = "logging" ) ]
        info!( "circuit breaker closed after successful probe" );
      }
    }

    /// Record a failed attempt of the given kind. Only transport/server
    /// errors count; `validation`/`auth` are the caller's fault and must
    /// never be able to trip a healthy provider offline.
    pub fn record_failure( &self, kind : ErrorKind )
    {
      if !kind.counts_toward_breaker()
      {
        return;
      }

      let mut inner = self.inner.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      inner.probe_in_flight = false;

      match inner.state
      {
        CircuitState::HalfOpen =>
        {
          inner.state = CircuitState::Open;
          inner.opened_at = Some( Instant::now() );

          #[ cfg( feature = "logging" ) ]
          warn!( "circuit breaker re-opened after failed probe" );
        },
        CircuitState::Closed =>
        {
          inner.consecutive_failures += 1;
          if inner.consecutive_failures >= self.settings.max_failures
          {
            inner.state = CircuitState::Open;
            inner.opened_at = Some( Instant::now() );

            #[ cfg( feature = "logging" ) ]
            warn!( failures = inner.consecutive_failures, "circuit breaker opened" );
          }
        },
        CircuitState::Open => {},
      }
    }
  }

  /// Per-provider breaker registry, owned by the fallback router.
  #[ derive( Debug, Default ) ]
  pub struct BreakerRegistry
  {
    breakers : Mutex< HashMap< String, Arc< CircuitBreaker > > >,
  }

  impl BreakerRegistry
  {
    /// Build an empty registry.
    #[ inline ]
    #[ must_use ]
    pub fn new() -> Self
    {
      Self { breakers : Mutex::new( HashMap::new() ) }
    }

    /// Fetch or lazily create the breaker for a provider tag.
    #[ must_use ]
    pub fn get_or_create( &self, tag : &str, settings : BreakerSettings ) -> Arc< CircuitBreaker >
    {
      let mut breakers = self.breakers.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      breakers.entry( tag.to_string() ).or_insert_with( || Arc::new( CircuitBreaker::new( settings ) ) ).clone()
    }
  }
}

crate::mod_interface!
{
  exposed use private::CircuitState;
  exposed use private::Admission;
  exposed use private::CircuitBreaker;
  exposed use private::BreakerRegistry;
}

#[ cfg( test ) ]
mod tests
{
  use super::private::*;
  use crate::config::BreakerSettings;
  use crate::error::ErrorKind;
  use std::time::Duration;

  fn settings() -> BreakerSettings
  {
    BreakerSettings { max_failures : 3, reset_timeout : Duration::from_millis( 50 ) }
  }

  #[ test ]
  fn opens_after_consecutive_failures()
  {
    let breaker = CircuitBreaker::new( settings() );
    for _ in 0..3
    {
      assert_eq!( breaker.admit(), Admission::Allowed );
      breaker.record_failure( ErrorKind::ServerError );
    }
    assert_eq!( breaker.state(), CircuitState::Open );
    assert_eq!( breaker.admit(), Admission::Skip );
  }

  #[ test ]
  fn validation_and_auth_never_count()
  {
    let breaker = CircuitBreaker::new( settings() );
    for _ in 0..10
    {
      breaker.record_failure( ErrorKind::Validation );
      breaker.record_failure( ErrorKind::Auth );
    }
    assert_eq!( breaker.state(), CircuitState::Closed );
  }

  #[ test ]
  fn half_open_probe_then_close()
  {
    let breaker = CircuitBreaker::new( settings() );
    for _ in 0..3
    {
      breaker.record_failure( ErrorKind::ServerError );
    }
    assert_eq!( breaker.state(), CircuitState::Open );

    std::thread::sleep( Duration::from_millis( 80 ) );
    assert_eq!( breaker.admit(), Admission::Allowed );
    assert_eq!( breaker.state(), CircuitState::HalfOpen );
    assert_eq!( breaker.admit(), Admission::Skip );

    breaker.record_success();
    assert_eq!( breaker.state(), CircuitState::Closed );
  }

  #[ test ]
  fn half_open_probe_failure_reopens()
  {
    let breaker = CircuitBreaker::new( settings() );
    for _ in 0..3
    {
      breaker.record_failure( ErrorKind::ServerError );
    }
    std::thread::sleep( Duration::from_millis( 80 ) );
    assert_eq!( breaker.admit(), Admission::Allowed );
    breaker.record_failure( ErrorKind::ServerError );
    assert_eq!( breaker.state(), CircuitState::Open );
  }
}
