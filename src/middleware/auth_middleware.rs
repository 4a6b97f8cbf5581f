/// Auth Gate Middleware
///
/// Runs the [`AuthGate`] for every request to a protected resource and
/// stores the resolved `AccountView` in request extensions, where handlers
/// pick it up with `web::ReqData<AccountView>`.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::AUTHORIZATION,
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::{select_access_token, AuthGate, ACCESS_TOKEN_COOKIE};

/// Guard for routes that require a logged-in account
#[derive(Clone)]
pub struct RequireAuth {
    gate: AuthGate,
}

impl RequireAuth {
    pub fn new(gate: AuthGate) -> Self {
        Self { gate }
    }
}

impl<S, B> Transform<S, ServiceRequest> for RequireAuth
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = RequireAuthService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(RequireAuthService {
            service: Rc::new(service),
            gate: self.gate.clone(),
        }))
    }
}

pub struct RequireAuthService<S> {
    service: Rc<S>,
    gate: AuthGate,
}

impl<S, B> Service<ServiceRequest> for RequireAuthService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let cookie = req.cookie(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string());
        let authorization = req
            .headers()
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string);
        let token = select_access_token(cookie.as_deref(), authorization.as_deref())
            .map(str::to_string);

        let gate = self.gate.clone();
        let service = self.service.clone();

        Box::pin(async move {
            let account = gate.authenticate(token.as_deref()).await.map_err(|e| {
                tracing::debug!(path = %req.path(), error = %e, "Request rejected by auth gate");
                Error::from(e)
            })?;

            tracing::debug!(account_id = %account.id, "Access token validated");
            req.extensions_mut().insert(account);

            service.call(req).await
        })
    }
}
