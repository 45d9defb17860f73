//! Response Cache: content-addressed, LRU with TTL and a background sweeper.
//!
//! Eviction uses the `lru` crate for true O(1) average-case LRU bookkeeping —
//! the ancestor HTTP caches this is grounded on (`RequestCache` in the provider
//! SDKs this workspace used to ship) instead linear-scanned `last_accessed`
//! timestamps to find the eviction candidate; that scan is O(n) and is not
//! carried forward here.

mod private
{
  use std::collections::hash_map::DefaultHasher;
  use std::collections::BTreeMap;
  use std::hash::{ Hash, Hasher };
  use std::num::NonZeroUsize;
  use std::sync::atomic::{ AtomicU64, Ordering };
  use std::sync::Mutex;
  use std::time::{ Duration, Instant };

  use lru::LruCache;

  use crate::config::CacheSettings;
  use crate::types::{ Request, Response };

  #[ cfg( feature = "logging" ) ]
  use tracing::debug;

  /// Well-known context keys projected into the request's context map before
  /// key derivation by the context-aware cache variants.
  #[ derive( Debug, Clone, Default ) ]
  pub struct CacheContext
  {
    /// Tenant/user identifier.
    pub user_id : Option< String >,
    /// Session identifier.
    pub session_id : Option< String >,
    /// Originating repository.
    pub repository : Option< String >,
  }

  impl CacheContext
  {
    fn project_onto( &self, context : &mut BTreeMap< String, String > )
    {
      if let Some( user_id ) = &self.user_id
      {
        context.insert( "__user_id".to_string(), user_id.clone() );
      }
      if let Some( session_id ) = &self.session_id
      {
        context.insert( "__session_id".to_string(), session_id.clone() );
      }
      if let Some( repository ) = &self.repository
      {
        context.insert( "__repository".to_string(), repository.clone() );
      }
    }
  }

  /// Compute the canonical cache key for a request: a fixed-width hex digest
  /// over the provider tag, each message's role and text in order, and the
  /// sorted context pairs. Metadata (session id, user id, tags) never feeds
  /// the key — those are logging-only (see `Request::metadata`).
  #[ inline ]
  #[ must_use ]
  pub fn cache_key( request : &Request ) -> String
  {
    let mut hasher = DefaultHasher::new();
    request.provider.hash( &mut hasher );
    for message in &request.messages
    {
      message.role.as_str().hash( &mut hasher );
      message.text.hash( &mut hasher );
    }
    for ( key, value ) in &request.context
    {
      key.hash( &mut hasher );
      value.hash( &mut hasher );
    }
    format!( "{:016x}", hasher.finish() )
  }

  struct Entry
  {
    response : Response,
    expires_at : Instant,
    access_count : u64,
  }

  /// Running cache counters. Readable without taking the entry-table lock.
  #[ derive( Debug, Default ) ]
  pub struct CacheMetrics
  {
    /// Number of `get` calls that found a live entry.
    pub hits : AtomicU64,
    /// Number of `get` calls that found nothing or an expired entry.
    pub misses : AtomicU64,
    /// Number of entries evicted to satisfy the size bound.
    pub evictions : AtomicU64,
    /// Number of entries removed for having expired (on `get` or by the sweeper).
    pub expirations : AtomicU64,
  }

  impl CacheMetrics
  {
    /// Snapshot of the counters as plain integers.
    #[ inline ]
    #[ must_use ]
    pub fn snapshot( &self ) -> ( u64, u64, u64, u64 )
    {
      (
        self.hits.load( Ordering::Relaxed ),
        self.misses.load( Ordering::Relaxed ),
        self.evictions.load( Ordering::Relaxed ),
        self.expirations.load( Ordering::Relaxed ),
      )
    }

    /// Hit rate in [0,1], computed at read time so rounding never accumulates.
    #[ inline ]
    #[ must_use ]
    pub fn hit_rate( &self ) -> f64
    {
      let hits = self.hits.load( Ordering::Relaxed );
      let misses = self.misses.load( Ordering::Relaxed );
      let total = hits + misses;
      if total == 0 { 0.0 } else { hits as f64 / total as f64 }
    }
  }

  /// Content-addressed response cache with TTL, LRU and bounded size.
  #[ derive( Debug ) ]
  pub struct ResponseCache
  {
    settings : CacheSettings,
    entries : Mutex< LruCache< String, Entry > >,
    metrics : CacheMetrics,
  }

  impl std::fmt::Debug for Entry
  {
    #[ inline ]
    fn fmt( &self, f : &mut std::fmt::Formatter< '_ > ) -> std::fmt::Result
    {
      f.debug_struct( "Entry" ).field( "access_count", &self.access_count ).finish()
    }
  }

  impl ResponseCache
  {
    /// Build a new cache from its configuration block.
    ///
    /// # Panics
    ///
    /// Panics if `settings.max_size` is zero.
    #[ inline ]
    #[ must_use ]
    pub fn new( settings : CacheSettings ) -> Self
    {
      let capacity = NonZeroUsize::new( settings.max_size ).expect( "cache max_size must be nonzero" );
      Self { settings, entries : Mutex::new( LruCache::new( capacity ) ), metrics : CacheMetrics::default() }
    }

    /// Look up a request's cached response. Returns a **copy**: mutating it
    /// can never corrupt a later hit on the same key.
    #[ must_use ]
    pub fn get( &self, request : &Request ) -> Option< Response >
    {
      let key = cache_key( request );
      self.get_by_key( &key )
    }

    fn get_by_key( &self, key : &str ) -> Option< Response >
    {
      let mut entries = self.entries.lock().unwrap_or_else( std::sync::PoisonError::into_inner );

      let expired = entries.peek( key ).is_some_and( | entry | Instant::now() > entry.expires_at );
      if expired
      {
        entries.pop( key );
        self.metrics.misses.fetch_add( 1, Ordering::Relaxed );
        self.metrics.expirations.fetch_add( 1, Ordering::Relaxed );
        return None;
      }

      match entries.get_mut( key )
      {
        Some( entry ) =>
        {
          entry.access_count += 1;
          self.metrics.hits.fetch_add( 1, Ordering::Relaxed );
          Some( entry.response.clone() )
        },
        None =>
        {
          self.metrics.misses.fetch_add( 1, Ordering::Relaxed );
          None
        },
      }
    }

    /// Look up with well-known context projected into the key.
    #[ must_use ]
    pub fn get_with_context( &self, request : &Request, context : &CacheContext ) -> Option< Response >
    {
      let mut request = request.clone();
      context.project_onto( &mut request.context );
      self.get( &request )
    }

    /// Store (or refresh) a response under its canonical key.
    pub fn set( &self, request : &Request, response : &Response )
    {
      let key = cache_key( request );
      self.set_by_key( key, response.clone() );
    }

    fn set_by_key( &self, key : String, response : Response )
    {
      let now = Instant::now();
      let entry = Entry { response, expires_at : now + self.settings.ttl, access_count : 0 };

      let mut entries = self.entries.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      let was_full = entries.len() >= entries.cap().get() && !entries.contains( &key );
      if let Some( ( _, _evicted ) ) = entries.push( key, entry )
      {
        if was_full
        {
          self.metrics.evictions.fetch_add( 1, Ordering::Relaxed );
        }
      }
    }

    /// Store with well-known context projected into the key.
    pub fn set_with_context( &self, request : &Request, response : &Response, context : &CacheContext )
    {
      let mut request = request.clone();
      context.project_onto( &mut request.context );
      self.set( &request, response );
    }

    /// Evict every entry whose TTL has elapsed. Returns the count removed.
    /// Never holds the entry-table lock for longer than one pass.
    pub fn sweep( &self ) -> usize
    {
      let now = Instant::now();
      let mut entries = self.entries.lock().unwrap_or_else( std::sync::PoisonError::into_inner );

      let expired_keys : Vec< String > = entries
        .iter()
        .filter( | ( _, entry ) | now > entry.expires_at )
        .map( | ( key, _ ) | key.clone() )
        .collect();

      for key in &expired_keys
      {
        entries.pop( key );
      }

      let count = expired_keys.len();
      if count > 0
      {
        self.metrics.expirations.fetch_add( count as u64, Ordering::Relaxed );
        #[ cfg( feature = "logging" ) ]
        debug!( count, "cache sweep evicted expired entries" );
      }
      count
    }

    /// Drop every entry.
    pub fn clear( &self )
    {
      let mut entries = self.entries.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      entries.clear();
    }

    /// Current entry count.
    #[ must_use ]
    pub fn len( &self ) -> usize
    {
      self.entries.lock().unwrap_or_else( std::sync::PoisonError::into_inner ).len()
    }

    /// Whether the cache currently holds no entries.
    #[ must_use ]
    pub fn is_empty( &self ) -> bool
    {
      self.len() == 0
    }

    /// Read the running counters.
    #[ must_use ]
    pub fn metrics( &self ) -> &CacheMetrics
    {
      &self.metrics
    }
  }

  /// Spawn the background sweeper task on a ticker. Returns its `JoinHandle`
  /// so callers can abort it on shutdown (see `Router::close`).
  #[ cfg( feature = "enabled" ) ]
  pub fn spawn_sweeper( cache : std::sync::Arc< ResponseCache >, interval : Duration ) -> tokio::task::JoinHandle< () >
  {
    tokio::spawn( async move
    {
      let mut ticker = tokio::time::interval( interval );
      loop
      {
        ticker.tick().await;
        cache.sweep();
      }
    } )
  }
}

crate::mod_interface!
{
  exposed use private::CacheContext;
  exposed use private::CacheMetrics;
  exposed use private::ResponseCache;
  exposed use private::cache_key;
  #[ cfg( feature = "enabled" ) ]
  exposed use private::spawn_sweeper;
}

#[ cfg( test ) ]
mod tests
{
  use super::private::*;
  use crate::config::CacheSettings;
  use crate::types::{ Message, Request, Response, Role, Usage };
  use std::time::Duration;

  fn response( provider : &str, content : &str ) -> Response
  {
    Response
    {
      id : "r1".to_string(),
      provider : provider.to_string(),
      content : content.to_string(),
      usage : Usage { input_tokens : 1, output_tokens : 1 },
      latency_ms : 5,
      cache_hit : false,
      fallback_used : false,
      quality : None,
      processed_at : 0,
      server_tag : String::new(),
    }
  }

  fn request( provider : &str ) -> Request
  {
    Request::new( "r1", provider, vec![ Message::new( Role::User, "2+2?" ) ] )
  }

  #[ test ]
  fn miss_then_hit()
  {
    let cache = ResponseCache::new( CacheSettings::default() );
    assert!( cache.get( &request( "a" ) ).is_none() );
    cache.set( &request( "a" ), &response( "a", "4" ) );
    let hit = cache.get( &request( "a" ) ).unwrap();
    assert_eq!( hit.content, "4" );
    let ( hits, misses, .. ) = cache.metrics().snapshot();
    assert_eq!( hits, 1 );
    assert_eq!( misses, 1 );
  }

  #[ test ]
  fn hits_do_not_alias_the_stored_entry()
  {
    let cache = ResponseCache::new( CacheSettings::default() );
    cache.set( &request( "a" ), &response( "a", "4" ) );

    let mut first = cache.get( &request( "a" ) ).unwrap();
    first.content = "mutated".to_string();

    let second = cache.get( &request( "a" ) ).unwrap();
    assert_eq!( second.content, "4" );
  }

  #[ test ]
  fn key_ignores_metadata_fields()
  {
    let mut r1 = request( "a" );
    let mut r2 = request( "a" );
    r1.metadata.user_id = Some( "alice".to_string() );
    r2.metadata.user_id = Some( "bob".to_string() );
    r2.metadata.session_id = Some( "sess-2".to_string() );

    assert_eq!( cache_key( &r1 ), cache_key( &r2 ) );
  }

  #[ test ]
  fn lru_bound_evicts_least_recently_used()
  {
    let settings = CacheSettings { max_size : 2, ..CacheSettings::default() };
    let cache = ResponseCache::new( settings );

    cache.set( &request( "a" ), &response( "a", "1" ) );
    cache.set( &request( "b" ), &response( "b", "2" ) );
    cache.set( &request( "c" ), &response( "c", "3" ) );

    assert!( cache.get( &request( "a" ) ).is_none() );
    assert!( cache.get( &request( "b" ) ).is_some() );
    assert!( cache.get( &request( "c" ) ).is_some() );
    assert_eq!( cache.len(), 2 );
  }

  #[ test ]
  fn ttl_expiry_yields_miss()
  {
    let settings = CacheSettings { ttl : Duration::from_millis( 50 ), ..CacheSettings::default() };
    let cache = ResponseCache::new( settings );

    cache.set( &request( "a" ), &response( "a", "4" ) );
    std::thread::sleep( Duration::from_millis( 100 ) );

    assert!( cache.get( &request( "a" ) ).is_none() );
  }

  #[ test ]
  fn sweep_removes_only_expired_entries()
  {
    let settings = CacheSettings { ttl : Duration::from_millis( 50 ), max_size : 10, ..CacheSettings::default() };
    let cache = ResponseCache::new( settings );

    cache.set( &request( "a" ), &response( "a", "1" ) );
    std::thread::sleep( Duration::from_millis( 100 ) );
    cache.set( &request( "b" ), &response( "b", "2" ) );

    let swept = cache.sweep();
    assert_eq!( swept, 1 );
    assert_eq!( cache.len(), 1 );
  }

  #[ test ]
  fn clear_drops_everything()
  {
    let cache = ResponseCache::new( CacheSettings::default() );
    cache.set( &request( "a" ), &response( "a", "1" ) );
    cache.clear();
    assert!( cache.is_empty() );
  }
}
