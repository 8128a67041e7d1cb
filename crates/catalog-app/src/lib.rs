pub mod error;
pub mod form;
pub mod rest_api;
pub mod service;
pub mod state;
pub mod validate;
pub mod view;

/// Services are cheap to build, so they are constructed from state for each request
#[macro_export]
macro_rules! service_from_request {
    ($service:ty) => {
        impl axum::extract::FromRequestParts<$crate::state::AppState> for $service {
            type Rejection = std::convert::Infallible;

            fn from_request_parts(
                _parts: &mut http::request::Parts,
                state: &$crate::state::AppState,
            ) -> impl std::future::Future<Output = std::result::Result<Self, Self::Rejection>>
                   + core::marker::Send {
                futures::future::ready(std::result::Result::Ok(<$service>::from(state)))
            }
        }
    };
}
