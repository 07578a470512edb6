use {
    crate::{
        credential::{
            CredentialError,
            RegisterRes,
            VerifyRes,
        },
        interface::user::{
            CredentialsBody,
            UserSummary,
        },
        state::State,
    },
    http::{
        header::{
            ALLOW,
            CONTENT_TYPE,
        },
        Method,
        Response,
        StatusCode,
    },
    http_body_util::{
        BodyExt,
        LengthLimitError,
        Limited,
    },
    htwrap::{
        handler,
        htserve::{
            handler::{
                Handler,
                PathRouter,
            },
            responses::{
                body_empty,
                body_full,
                response_200_json,
                response_400,
                response_404,
                Body,
            },
        },
    },
    hyper::body::{
        Body as HttpBody,
        Bytes,
    },
    serde::Serialize,
    std::{
        collections::BTreeMap,
        sync::Arc,
    },
};

pub const PATH_USERS: &str = "/users";
pub const PATH_LOGIN: &str = "/users/login";
pub const MAX_BODY_BYTES: usize = 64 * 1024;

/// Same text for unknown users and wrong passwords, so the response doesn't
/// reveal which names are registered.
const TEXT_LOGIN_DENIED: &str = "Not allowed";
const TEXT_LOGIN_OK: &str = "Success";

fn response_text(status: StatusCode, text: &str) -> Response<Body> {
    return Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "text/plain; charset=utf-8")
        .body(body_full(text.as_bytes().to_vec()))
        .unwrap();
}

fn response_json(status: StatusCode, data: impl Serialize) -> Response<Body> {
    return Response::builder()
        .status(status)
        .header(CONTENT_TYPE, "application/json")
        .body(body_full(serde_json::to_vec(&data).unwrap()))
        .unwrap();
}

fn response_500() -> Response<Body> {
    return Response::builder().status(StatusCode::INTERNAL_SERVER_ERROR).body(body_empty()).unwrap();
}

fn response_405(allow: &str) -> Response<Body> {
    return Response::builder()
        .status(StatusCode::METHOD_NOT_ALLOWED)
        .header(ALLOW, allow)
        .body(body_empty())
        .unwrap();
}

/// Collect a request body of at most `MAX_BODY_BYTES`.
pub async fn read_body<B>(body: B) -> Result<Bytes, Response<Body>>
where
    B: HttpBody<Data = Bytes>,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>> {
    match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(b) => return Ok(b.to_bytes()),
        Err(e) => {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                return Err(response_text(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large"));
            }
            return Err(response_400("Unreadable request body"));
        },
    }
}

fn parse_credentials(body: &[u8]) -> Result<CredentialsBody, Response<Body>> {
    return serde_json::from_slice::<CredentialsBody>(
        body,
    ).map_err(|e| response_400(format_args!("Expected JSON body with string fields `name` and `password`: {}", e)));
}

/// `POST /users`
pub async fn handle_register(state: &State, body: &[u8]) -> Response<Body> {
    let req = match parse_credentials(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match state.credentials.register(&req.name, &req.password).await {
        Ok(RegisterRes::Registered(credential)) => {
            return response_json(StatusCode::CREATED, &credential);
        },
        Ok(RegisterRes::NameTaken) => {
            return response_text(StatusCode::CONFLICT, "Name taken");
        },
        Err(e @ (CredentialError::EmptyName | CredentialError::EmptyPassword)) => {
            return response_400(e);
        },
        Err(e) => {
            state.log.log_err(loga::WARN, e.into_loga().context("Error registering user"));
            return response_500();
        },
    }
}

/// `POST /users/login`
pub async fn handle_login(state: &State, body: &[u8]) -> Response<Body> {
    let req = match parse_credentials(body) {
        Ok(r) => r,
        Err(resp) => return resp,
    };
    match state.credentials.verify(&req.name, &req.password).await {
        Ok(VerifyRes::Match) => {
            return response_text(StatusCode::OK, TEXT_LOGIN_OK);
        },
        Ok(VerifyRes::Mismatch | VerifyRes::UserNotFound) => {
            return response_text(StatusCode::UNAUTHORIZED, TEXT_LOGIN_DENIED);
        },
        Err(e) => {
            state.log.log_err(loga::WARN, e.into_loga().context("Error verifying login"));
            return response_500();
        },
    }
}

/// `GET /users`
pub async fn handle_list(state: &State) -> Response<Body> {
    if !state.expose_user_list {
        return response_404();
    }
    match state.credentials.list().await {
        Ok(names) => {
            return response_200_json(names.into_iter().map(|name| UserSummary { name: name }).collect::<Vec<_>>());
        },
        Err(e) => {
            state.log.log_err(loga::WARN, e.into_loga().context("Error listing users"));
            return response_500();
        },
    }
}

pub fn endpoints(state: &Arc<State>) -> BTreeMap<String, Box<dyn Handler<Body>>> {
    return [
        //. .
        (PATH_USERS.to_string(), {
            Box::new(handler!((state: Arc < State >)(args -> Body) {
                if !args.subpath.is_empty() && args.subpath != "/" {
                    return response_404();
                }
                if args.head.method == Method::GET {
                    return handle_list(&state).await;
                }
                if args.head.method != Method::POST {
                    return response_405("GET, POST");
                }
                let body = match read_body(args.body).await {
                    Ok(b) => b,
                    Err(resp) => return resp,
                };
                return handle_register(&state, &body).await;
            })) as Box<dyn Handler<Body>>
        }),
        (PATH_LOGIN.to_string(), {
            Box::new(handler!((state: Arc < State >)(args -> Body) {
                if !args.subpath.is_empty() && args.subpath != "/" {
                    return response_404();
                }
                if args.head.method != Method::POST {
                    return response_405("POST");
                }
                let body = match read_body(args.body).await {
                    Ok(b) => b,
                    Err(resp) => return resp,
                };
                return handle_login(&state, &body).await;
            })) as Box<dyn Handler<Body>>
        }),
    ].into_iter().collect();
}

/// Routing table for all endpoints.
pub fn router(state: &Arc<State>) -> Result<Arc<PathRouter<Body>>, loga::Error> {
    return Ok(
        Arc::new(
            PathRouter::new(
                endpoints(state),
            ).map_err(|e| loga::agg_err("Invalid paths in router", e.into_iter().map(loga::err).collect()))?,
        ),
    );
}
