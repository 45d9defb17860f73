//! Linear backoff used between retry attempts within a single Provider Client.
//!
//! Kept on a disjoint layer from the fallback router: this module only ever
//! retries the same provider. Crossing layers causes retry-storm amplification.

mod private
{
  use std::time::Duration;

  /// `retry_delay * attempt_number`, the linear backoff spec'd for the
  /// provider client (as opposed to the exponential backoff used elsewhere
  /// in this codebase's ancestry).
  #[ inline ]
  #[ must_use ]
  pub fn linear_delay( attempt : u32, retry_delay : Duration ) -> Duration
  {
    retry_delay.saturating_mul( attempt )
  }
}

crate::mod_interface!
{
  exposed use private::linear_delay;
}

#[ cfg( test ) ]
mod tests
{
  use super::private::linear_delay;
  use std::time::Duration;

  #[ test ]
  fn delay_scales_linearly_with_attempt()
  {
    let base = Duration::from_millis( 100 );
    assert_eq!( linear_delay( 1, base ), Duration::from_millis( 100 ) );
    assert_eq!( linear_delay( 2, base ), Duration::from_millis( 200 ) );
    assert_eq!( linear_delay( 3, base ), Duration::from_millis( 300 ) );
  }
}
