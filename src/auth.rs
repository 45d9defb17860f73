//! Auth Injector: attaches per-provider credentials to an outbound request.

mod private
{
  use crate::codec::ProviderKind;
  use crate::secret::Secret;

  /// Attach the given provider's credentials to a request builder.
  ///
  /// Provider A uses `x-api-key` plus a pinned `anthropic-version` header;
  /// Providers B and C use a Bearer `Authorization` header.
  #[ inline ]
  #[ must_use ]
  #[ cfg( feature = "enabled" ) ]
  pub fn inject( builder : reqwest::RequestBuilder, kind : ProviderKind, secret : &Secret ) -> reqwest::RequestBuilder
  {
    match kind
    {
      ProviderKind::A => builder
        .header( "x-api-key", secret.expose() )
        .header( "anthropic-version", "2023-06-01" ),
      ProviderKind::B | ProviderKind::C => builder
        .header( "Authorization", format!( "Bearer {}", secret.expose() ) ),
    }
  }
}

crate::mod_interface!
{
  #[ cfg( feature = "enabled" ) ]
  exposed use private::inject;
}
