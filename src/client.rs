//! Provider Client: owns one provider's HTTP transport — build request, send,
//! retry on transient error, decode.

mod private
{
  use std::sync::Arc;
  use std::time::{ Duration, Instant };

  use crate::auth;
  use crate::codec::{ Codec, ProviderKind };
  use crate::config::ProviderSettings;
  use crate::error::{ Result, RouterError };
  use crate::retry::linear_delay;
  use crate::secret::Secret;
  use crate::types::{ Request, Response };

  #[ cfg( feature = "logging" ) ]
  use tracing::{ debug, instrument, warn };

  /// A caller-supplied deadline, optionally cancellable out of band.
  ///
  /// Cancellation propagates into any in-flight retry-backoff sleep via a
  /// `select` between the sleep timer and the cancel signal; it never
  /// extends the caller's own deadline.
  #[ derive( Debug, Clone ) ]
  pub struct Deadline
  {
    at : Instant,
    cancel : tokio::sync::watch::Receiver< bool >,
    // Keeps the paired `Sender` alive for the `after()` case, where there is no
    // external canceller: a dropped sender would close the channel and make
    // `changed()` resolve immediately, firing spurious cancellation on every sleep.
    _keepalive : Option< Arc< tokio::sync::watch::Sender< bool > > >,
  }

  impl Deadline
  {
    /// A deadline `timeout` from now with no external cancellation source.
    #[ inline ]
    #[ must_use ]
    pub fn after( timeout : Duration ) -> Self
    {
      let ( tx, rx ) = tokio::sync::watch::channel( false );
      Self { at : Instant::now() + timeout, cancel : rx, _keepalive : Some( Arc::new( tx ) ) }
    }

    /// A deadline `timeout` from now, cancellable via the returned handle.
    #[ inline ]
    #[ must_use ]
    pub fn cancellable( timeout : Duration ) -> ( Self, tokio::sync::watch::Sender< bool > )
    {
      let ( tx, rx ) = tokio::sync::watch::channel( false );
      ( Self { at : Instant::now() + timeout, cancel : rx, _keepalive : None }, tx )
    }

    /// Time remaining, zero if already expired.
    #[ inline ]
    #[ must_use ]
    pub fn remaining( &self ) -> Duration
    {
      self.at.saturating_duration_since( Instant::now() )
    }

    /// Whether the deadline has already passed.
    #[ inline ]
    #[ must_use ]
    pub fn is_expired( &self ) -> bool
    {
      Instant::now() >= self.at
    }

    /// Derive a sub-deadline bounded by both `self` and `cap`.
    #[ inline ]
    #[ must_use ]
    pub fn bounded( &self, cap : Duration ) -> Self
    {
      let remaining = self.remaining();
      Self { at : Instant::now() + remaining.min( cap ), cancel : self.cancel.clone(), _keepalive : self._keepalive.clone() }
    }

    /// Sleep `delay`, waking early (and reporting cancellation) if either the
    /// cancel signal fires or the deadline itself expires first.
    async fn cancellable_sleep( &self, delay : Duration ) -> core::result::Result< (), () >
    {
      let capped = delay.min( self.remaining() );
      let mut cancel = self.cancel.clone();
      tokio::select!
      {
        () = tokio::time::sleep( capped ) => Ok( () ),
        _ = cancel.changed() => Err( () ),
      }
    }
  }

  /// Owns one provider's codec, auth, HTTP transport and retry budget.
  #[ derive( Debug, Clone ) ]
  pub struct ProviderClient
  {
    tag : String,
    kind : ProviderKind,
    settings : ProviderSettings,
    secret : Secret,
    http : reqwest::Client,
    max_log_content_length : usize,
  }

  impl ProviderClient
  {
    /// Build a new client for one provider, truncating any logged content
    /// preview to `max_log_content_length` bytes.
    ///
    /// # Errors
    ///
    /// Returns a `RouterError` of kind `network` if the underlying
    /// `reqwest::Client` cannot be constructed.
    #[ inline ]
    pub fn new( tag : impl Into< String >, kind : ProviderKind, settings : ProviderSettings, secret : Secret, max_log_content_length : usize ) -> Result< Self >
    {
      let tag = tag.into();
      let http = reqwest::Client::builder()
        .timeout( settings.timeout )
        .build()
        .map_err( | e | RouterError::new( crate::error::ErrorKind::Network, tag.clone(), format!( "failed to build HTTP client: {e}" ) ) )?;

      Ok( Self { tag, kind, settings, secret, http, max_log_content_length } )
    }

    /// This client's provider tag.
    #[ inline ]
    #[ must_use ]
    pub fn tag( &self ) -> &str
    {
      &self.tag
    }

    /// Truncate `content` to `max_log_content_length` bytes (on a char
    /// boundary) for logging. Never logs a full message body.
    #[ cfg( feature = "logging" ) ]
    fn truncated_preview< 'a >( &self, content : &'a str ) -> std::borrow::Cow< 'a, str >
    {
      if content.len() <= self.max_log_content_length
      {
        return std::borrow::Cow::Borrowed( content );
      }
      let mut end = self.max_log_content_length;
      while end > 0 && !content.is_char_boundary( end )
      {
        end -= 1;
      }
      std::borrow::Cow::Owned( format!( "{}…", &content[ ..end ] ) )
    }

    fn validate( &self, request : &Request ) -> Result< () >
    {
      if request.messages.is_empty()
      {
        return Err( RouterError::validation( "messages must not be empty" ) );
      }
      if self.settings.model.is_empty()
      {
        return Err( RouterError::validation( "model must not be empty" ) );
      }
      if let Some( temperature ) = self.settings.temperature
      {
        let ( low, high ) = self.kind.temperature_range();
        if temperature < low || temperature > high
        {
          return Err( RouterError::validation( format!(
            "temperature {temperature} outside accepted range [{low},{high}]"
          ) ) );
        }
      }
      Ok( () )
    }

    /// Process one request against this provider, with linear-backoff retry
    /// on transient errors, honoring `deadline` cancellation.
    #[ cfg_attr( feature = "logging", instrument( skip( self, request ), fields( provider = %self.tag ) ) ) ]
    pub async fn process( &self, request : &Request, deadline : &Deadline ) -> Result< Response >
    {
      self.validate( request )?;

      let codec : Codec = self.kind.codec();
      let body = ( codec.encode )( request, &self.settings )?;
      let url = format!( "{}{}", self.settings.base_url, self.kind.endpoint_path() );

      let mut attempt : u32 = 1;
      loop
      {
        if deadline.is_expired()
        {
          return Err( RouterError::timeout( self.tag.clone(), "deadline expired before attempt" ) );
        }

        let start = Instant::now();
        let builder = self.http.post( &url ).header( "Content-Type", "application/json" ).body( body.clone() );
        let builder = auth::inject( builder, self.kind, &self.secret );

        let outcome = builder.send().await;
        let latency_ms = u64::try_from( start.elapsed().as_millis() ).unwrap_or( u64::MAX );

        let result = match outcome
        {
          Ok( response ) =>
          {
            let status = response.status();
            let bytes = response.bytes().await.map_err( RouterError::from )?;
            if status.is_success()
            {
              let mut decoded = ( codec.decode )( &bytes, &self.tag, latency_ms )?;
              decoded.id.clone_from( &request.id );

              #[ cfg( feature = "logging" ) ]
              debug!( content_preview = %self.truncated_preview( &decoded.content ), "decoded provider response" );

              Ok( decoded )
            }
            else
            {
              Err( ( codec.decode_error )( &bytes, &self.tag, status.as_u16() ) )
            }
          },
          Err( transport_err ) =>
          {
            let mut router_err : RouterError = transport_err.into();
            router_err.provider = self.tag.clone();
            Err( router_err )
          },
        };

        match result
        {
          Ok( response ) => return Ok( response ),
          Err( error ) =>
          {
            #[ cfg( feature = "logging" ) ]
            debug!( attempt, kind = ?error.kind, "provider attempt failed" );

            if !error.kind.is_retryable() || attempt > self.settings.max_retries
            {
              return Err( error );
            }

            let delay = linear_delay( attempt, self.settings.retry_delay );
            if deadline.cancellable_sleep( delay ).await.is_err()
            {
              #[ cfg( feature = "logging" ) ]
              warn!( "retry backoff cancelled or deadline exceeded" );
              return Err( RouterError::timeout( self.tag.clone(), "cancelled during retry backoff" ) );
            }

            attempt += 1;
          },
        }
      }
    }
  }

  #[ cfg( test ) ]
  mod tests
  {
    use super::Deadline;
    use std::time::{ Duration, Instant };

    #[ tokio::test ]
    async fn after_sleep_runs_the_full_delay_uncancelled()
    {
      let deadline = Deadline::after( Duration::from_secs( 5 ) );
      let start = Instant::now();
      let outcome = deadline.cancellable_sleep( Duration::from_millis( 50 ) ).await;
      assert!( outcome.is_ok() );
      assert!( start.elapsed() >= Duration::from_millis( 45 ), "sleep should not be spuriously cancelled" );
    }

    #[ tokio::test ]
    async fn explicit_cancel_interrupts_the_sleep_early()
    {
      let ( deadline, cancel ) = Deadline::cancellable( Duration::from_secs( 5 ) );
      let sleeper = tokio::spawn( async move { deadline.cancellable_sleep( Duration::from_secs( 5 ) ).await } );
      tokio::time::sleep( Duration::from_millis( 20 ) ).await;
      cancel.send( true ).unwrap();
      let outcome = sleeper.await.unwrap();
      assert!( outcome.is_err() );
    }
  }
}

crate::mod_interface!
{
  exposed use private::Deadline;
  exposed use private::ProviderClient;
}
