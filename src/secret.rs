//! API key handling for the three providers.

mod private
{
  use secrecy::{ ExposeSecret, SecretString };

  /// An API key that never prints itself in `Debug` output.
  #[ derive( Clone ) ]
  pub struct Secret( SecretString );

  impl std::fmt::Debug for Secret
  {
    #[ inline ]
    fn fmt( &self, f : &mut std::fmt::Formatter< '_ > ) -> std::fmt::Result
    {
      f.debug_tuple( "Secret" ).field( &"<REDACTED>" ).finish()
    }
  }

  impl Secret
  {
    /// Wrap a raw key.
    #[ inline ]
    #[ must_use ]
    pub fn new( key : impl Into< String > ) -> Self
    {
      Self( SecretString::from( key.into() ) )
    }

    /// Read the raw key, e.g. to set an HTTP header.
    #[ inline ]
    #[ must_use ]
    pub fn expose( &self ) -> &str
    {
      self.0.expose_secret()
    }

    /// Load from an environment variable.
    ///
    /// # Errors
    ///
    /// Returns `crate::error::RouterError` (kind `auth`) if the variable is unset.
    #[ inline ]
    pub fn from_env( var : &str ) -> crate::error::Result< Self >
    {
      std::env::var( var )
        .map( Self::new )
        .map_err( | _ | crate::error::RouterError::new(
          crate::error::ErrorKind::Auth,
          String::new(),
          format!( "missing environment variable '{var}'" ),
        ) )
    }
  }
}

crate::mod_interface!
{
  exposed use private::Secret;
}
