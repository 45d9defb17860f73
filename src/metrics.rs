//! Metrics: append-only counters and running aggregates, never blocking a
//! request. Readers receive a snapshot taken under a short read lock;
//! derived rates are computed at read time so no rounding accumulates.

mod private
{
  use std::collections::HashMap;
  use std::sync::atomic::{ AtomicU64, Ordering };
  use std::sync::Mutex;

  use crate::error::ErrorKind;

  /// Write-mostly counters for one provider.
  #[ derive( Debug, Default ) ]
  struct Shard
  {
    total_requests : AtomicU64,
    total_successes : AtomicU64,
    errors_by_kind : Mutex< HashMap< ErrorKind, u64 > >,
    accumulated_latency_ms : AtomicU64,
    min_latency_ms : AtomicU64,
    max_latency_ms : AtomicU64,
    cache_hits : AtomicU64,
    cache_misses : AtomicU64,
    last_request_at : AtomicU64,
  }

  /// A read-only copy of one provider's counters, safe to hand to callers.
  #[ derive( Debug, Clone, Default ) ]
  pub struct ShardSnapshot
  {
    /// Total attempts recorded for this provider (hits + misses + errors).
    pub total_requests : u64,
    /// Attempts that produced a successful response.
    pub total_successes : u64,
    /// Count of terminal errors, by taxonomy kind.
    pub errors_by_kind : HashMap< ErrorKind, u64 >,
    /// Sum of latency across successful attempts, in milliseconds.
    pub accumulated_latency_ms : u64,
    /// Minimum observed latency, in milliseconds.
    pub min_latency_ms : u64,
    /// Maximum observed latency, in milliseconds.
    pub max_latency_ms : u64,
    /// Cache hits attributed to this provider's key space.
    pub cache_hits : u64,
    /// Cache misses attributed to this provider's key space.
    pub cache_misses : u64,
    /// Unix timestamp (seconds) of the last recorded request.
    pub last_request_at : u64,
  }

  impl ShardSnapshot
  {
    /// Success rate in [0,1] over all recorded requests.
    #[ inline ]
    #[ must_use ]
    pub fn success_rate( &self ) -> f64
    {
      if self.total_requests == 0 { 0.0 } else { self.total_successes as f64 / self.total_requests as f64 }
    }

    /// Average latency across successful attempts, in milliseconds.
    #[ inline ]
    #[ must_use ]
    pub fn average_latency_ms( &self ) -> f64
    {
      if self.total_successes == 0 { 0.0 } else { self.accumulated_latency_ms as f64 / self.total_successes as f64 }
    }

    /// Cache-hit rate in [0,1] for this provider's key space.
    #[ inline ]
    #[ must_use ]
    pub fn cache_hit_rate( &self ) -> f64
    {
      let total = self.cache_hits + self.cache_misses;
      if total == 0 { 0.0 } else { self.cache_hits as f64 / total as f64 }
    }
  }

  /// Process-lifetime metrics registry, one shard per provider.
  #[ derive( Debug, Default ) ]
  pub struct Metrics
  {
    shards : Mutex< HashMap< String, std::sync::Arc< Shard > > >,
  }

  impl Metrics
  {
    /// Build an empty registry.
    #[ inline ]
    #[ must_use ]
    pub fn new() -> Self
    {
      Self::default()
    }

    fn shard( &self, provider : &str ) -> std::sync::Arc< Shard >
    {
      let mut shards = self.shards.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      shards.entry( provider.to_string() ).or_insert_with( | | std::sync::Arc::new( Shard::default() ) ).clone()
    }

    /// Record a cache hit for `provider`. Exactly one of
    /// {`record_cache_hit`, `record_cache_miss`} is ever called per `process`.
    pub fn record_cache_hit( &self, provider : &str )
    {
      let shard = self.shard( provider );
      shard.cache_hits.fetch_add( 1, Ordering::Relaxed );
      shard.total_requests.fetch_add( 1, Ordering::Relaxed );
      shard.total_successes.fetch_add( 1, Ordering::Relaxed );
      Self::stamp_now( &shard );
    }

    /// Record a cache miss for `provider`, prior to a fallback attempt.
    pub fn record_cache_miss( &self, provider : &str )
    {
      let shard = self.shard( provider );
      shard.cache_misses.fetch_add( 1, Ordering::Relaxed );
    }

    /// Record a successful provider attempt's latency and token usage.
    pub fn record_success( &self, provider : &str, latency_ms : u64 )
    {
      let shard = self.shard( provider );
      shard.total_requests.fetch_add( 1, Ordering::Relaxed );
      shard.total_successes.fetch_add( 1, Ordering::Relaxed );
      shard.accumulated_latency_ms.fetch_add( latency_ms, Ordering::Relaxed );

      shard.min_latency_ms.fetch_update( Ordering::Relaxed, Ordering::Relaxed,
        | current | Some( if current == 0 { latency_ms } else { current.min( latency_ms ) } ) ).ok();
      shard.max_latency_ms.fetch_max( latency_ms, Ordering::Relaxed );
      Self::stamp_now( &shard );
    }

    /// Record a terminal error of `kind` for `provider`.
    pub fn record_error( &self, provider : &str, kind : ErrorKind )
    {
      let shard = self.shard( provider );
      shard.total_requests.fetch_add( 1, Ordering::Relaxed );
      let mut errors = shard.errors_by_kind.lock().unwrap_or_else( std::sync::PoisonError::into_inner );
      *errors.entry( kind ).or_insert( 0 ) += 1;
      drop( errors );
      Self::stamp_now( &shard );
    }

    fn stamp_now( shard : &Shard )
    {
      let now = crate::types::Response::now_unix();
      shard.last_request_at.store( now, Ordering::Relaxed );
    }

    /// Take a consistent snapshot of one provider's counters.
    #[ must_use ]
    pub fn snapshot( &self, provider : &str ) -> ShardSnapshot
    {
      let shard = self.shard( provider );
      let errors_by_kind = shard.errors_by_kind.lock().unwrap_or_else( std::sync::PoisonError::into_inner ).clone();
      ShardSnapshot
      {
        total_requests : shard.total_requests.load( Ordering::Relaxed ),
        total_successes : shard.total_successes.load( Ordering::Relaxed ),
        errors_by_kind,
        accumulated_latency_ms : shard.accumulated_latency_ms.load( Ordering::Relaxed ),
        min_latency_ms : shard.min_latency_ms.load( Ordering::Relaxed ),
        max_latency_ms : shard.max_latency_ms.load( Ordering::Relaxed ),
        cache_hits : shard.cache_hits.load( Ordering::Relaxed ),
        cache_misses : shard.cache_misses.load( Ordering::Relaxed ),
        last_request_at : shard.last_request_at.load( Ordering::Relaxed ),
      }
    }

    /// Snapshot every provider currently tracked.
    #[ must_use ]
    pub fn snapshot_all( &self ) -> HashMap< String, ShardSnapshot >
    {
      let tags : Vec< String > = self.shards.lock().unwrap_or_else( std::sync::PoisonError::into_inner ).keys().cloned().collect();
      tags.into_iter().map( | tag | { let snap = self.snapshot( &tag ); ( tag, snap ) } ).collect()
    }

    /// Render every shard as a flat list of Prometheus-style exposition lines.
    #[ must_use ]
    pub fn export_prometheus_format( &self ) -> String
    {
      let mut out = String::new();
      for ( provider, snapshot ) in self.snapshot_all()
      {
        out.push_str( &format!( "ai_router_requests_total{{provider=\"{provider}\"}} {}\n", snapshot.total_requests ) );
        out.push_str( &format!( "ai_router_successes_total{{provider=\"{provider}\"}} {}\n", snapshot.total_successes ) );
        out.push_str( &format!( "ai_router_cache_hit_rate{{provider=\"{provider}\"}} {}\n", snapshot.cache_hit_rate() ) );
        out.push_str( &format!( "ai_router_average_latency_ms{{provider=\"{provider}\"}} {}\n", snapshot.average_latency_ms() ) );
      }
      out
    }

    /// Render every shard's snapshot as a JSON object, keyed by provider tag.
    ///
    /// # Panics
    ///
    /// Panics if snapshot serialization fails, which would indicate a bug in
    /// the shard types rather than caller-supplied data.
    #[ must_use ]
    pub fn to_json( &self ) -> serde_json::Value
    {
      let shards : HashMap< String, serde_json::Value > = self.snapshot_all().into_iter().map( | ( tag, snapshot ) |
      {
        let value = serde_json::json!( {
          "total_requests" : snapshot.total_requests,
          "total_successes" : snapshot.total_successes,
          "success_rate" : snapshot.success_rate(),
          "average_latency_ms" : snapshot.average_latency_ms(),
          "cache_hit_rate" : snapshot.cache_hit_rate(),
          "last_request_at" : snapshot.last_request_at,
        } );
        ( tag, value )
      } ).collect();
      serde_json::json!( shards )
    }
  }
}

crate::mod_interface!
{
  exposed use private::ShardSnapshot;
  exposed use private::Metrics;
}
