//! End-to-end routing and dispatch behavior.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use switchyard_http::{Method, Request, Response, StatusCode};
use switchyard_router::{
    Handler, MATCHED_ROUTE_PATH_KEY, Middleware, Params, RouteError, Router, RouterService,
};

fn text(tag: &'static str) -> impl Handler {
    move |_: &mut Request, _: &Params| Response::text(tag)
}

fn serve(service: &RouterService, method: Method, path: &str) -> Response {
    let mut req = Request::new(method, path);
    service.serve(&mut req)
}

fn body(resp: &Response) -> &str {
    std::str::from_utf8(&resp.body).unwrap()
}

#[test]
fn static_exact_match() {
    let mut router = Router::new();
    router.get("/a/b", text("ab"));

    let lookup = router.lookup(Method::Get, "/a/b");
    assert!(lookup.handler.is_some());
    assert!(lookup.params.is_empty());
    assert!(!lookup.tsr);

    let service = router.into_service();
    assert_eq!(body(&serve(&service, Method::Get, "/a/b")), "ab");
}

#[test]
fn parameter_capture_order() {
    let mut router = Router::new();
    router.get(
        "/blog/:category/:post",
        |_: &mut Request, params: &Params| {
            let pairs: Vec<String> = params
                .iter()
                .map(|p| format!("{}={}", p.key, p.value))
                .collect();
            Response::text(pairs.join(","))
        },
    );

    let service = router.into_service();
    let resp = serve(&service, Method::Get, "/blog/go/router-design");
    assert_eq!(body(&resp), "category=go,post=router-design");
}

#[test]
fn catch_all_captures_include_leading_slash() {
    let mut router = Router::new();
    router.get("/files/*filepath", |_: &mut Request, params: &Params| {
        Response::text(params.get("filepath").unwrap_or("").to_string())
    });

    let service = router.into_service();
    assert_eq!(body(&serve(&service, Method::Get, "/files/")), "/");
    assert_eq!(
        body(&serve(&service, Method::Get, "/files/LICENSE")),
        "/LICENSE"
    );
    assert_eq!(
        body(&serve(&service, Method::Get, "/files/a/b.txt")),
        "/a/b.txt"
    );
}

#[test]
fn trailing_slash_redirect_round_trip() {
    let mut router = Router::new();
    router.get("/users", text("users"));
    router.post("/users", text("users-post"));

    let lookup = router.lookup(Method::Get, "/users/");
    assert!(lookup.handler.is_none());
    assert!(lookup.tsr);

    let service = router.into_service();

    // GET and HEAD redirect with 301
    let resp = serve(&service, Method::Get, "/users/");
    assert_eq!(resp.status, StatusCode::MOVED_PERMANENTLY);
    assert_eq!(resp.headers.get("location"), Some("/users"));

    // other methods use 308
    let resp = serve(&service, Method::Post, "/users/");
    assert_eq!(resp.status, StatusCode::PERMANENT_REDIRECT);
    assert_eq!(resp.headers.get("location"), Some("/users"));

    // the recommended target resolves
    let target = resp.headers.get("location").unwrap().to_string();
    assert_eq!(body(&serve(&service, Method::Get, &target)), "users");
}

#[test]
fn trailing_slash_redirect_preserves_query() {
    let mut router = Router::new();
    router.get("/search", text("search"));

    let service = router.into_service();
    let mut req = Request::new(Method::Get, "/search/");
    req.set_query(Some("q=trie".to_string()));
    let resp = service.serve(&mut req);
    assert_eq!(resp.headers.get("location"), Some("/search?q=trie"));
}

#[test]
fn fixed_path_redirect_recovers_case_and_cleans() {
    let mut router = Router::new();
    router.get("/Foo", text("foo"));

    let service = router.into_service();

    for path in ["/foo", "/FOO", "/..//Foo", "/./Foo"] {
        let resp = serve(&service, Method::Get, path);
        assert_eq!(
            resp.status,
            StatusCode::MOVED_PERMANENTLY,
            "expected redirect for {path}"
        );
        assert_eq!(resp.headers.get("location"), Some("/Foo"));
    }

    // the corrected path needs no further correction
    assert_eq!(body(&serve(&service, Method::Get, "/Foo")), "foo");
}

#[test]
fn connect_and_root_are_never_redirected() {
    let mut router = Router::new();
    router.register(Method::Connect, "/tunnel", text("t")).unwrap();
    router.get("/idx/", text("idx"));

    let service = router.into_service();

    let resp = serve(&service, Method::Connect, "/tunnel/");
    assert_eq!(resp.status, StatusCode::NOT_FOUND);

    // "/" itself never redirects even when tsr fires
    let resp = serve(&service, Method::Get, "/");
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[test]
fn method_not_allowed_lists_allowed_methods() {
    let mut router = Router::new();
    router.get("/x", text("x"));

    let service = router.into_service();
    let resp = serve(&service, Method::Delete, "/x");
    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(resp.headers.get("allow"), Some("GET, OPTIONS"));
}

#[test]
fn method_not_allowed_disabled_falls_through_to_404() {
    let mut router = Router::new();
    router.get("/x", text("x"));
    router.handle_method_not_allowed(false);

    let service = router.into_service();
    let resp = serve(&service, Method::Delete, "/x");
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[test]
fn automatic_options() {
    let mut router = Router::new();
    router.get("/x", text("x"));
    router.post("/x", text("x"));

    let service = router.into_service();

    let resp = serve(&service, Method::Options, "/x");
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.headers.get("allow"), Some("GET, OPTIONS, POST"));

    // server-wide OPTIONS uses the cached set
    let resp = serve(&service, Method::Options, "*");
    assert_eq!(resp.status, StatusCode::OK);
    assert_eq!(resp.headers.get("allow"), Some("GET, OPTIONS, POST"));
}

#[test]
fn global_options_hook() {
    let mut router = Router::new();
    router.get("/x", text("x"));
    router.global_options(|_: &mut Request, _: &Params| {
        Response::new(StatusCode::NO_CONTENT)
    });

    let service = router.into_service();
    let resp = serve(&service, Method::Options, "/x");
    assert_eq!(resp.status, StatusCode::NO_CONTENT);
    assert_eq!(resp.headers.get("allow"), Some("GET, OPTIONS"));
}

#[test]
fn conflicting_registration_leaves_router_unchanged() {
    let mut router = Router::new();
    router.register(Method::Get, "/user/:id", text("id")).unwrap();

    let err = router
        .register(Method::Get, "/user/:name", text("name"))
        .unwrap_err();
    assert!(matches!(err, RouteError::WildcardConflict { .. }));

    // the failed attempt left no partial structure behind
    let service = router.into_service();
    assert_eq!(body(&serve(&service, Method::Get, "/user/7")), "id");
    let lookup = service.router().lookup(Method::Get, "/user/7");
    assert_eq!(lookup.params.get("id"), Some("7"));
    assert_eq!(lookup.params.get("name"), None);
}

#[test]
fn missing_leading_slash_is_rejected() {
    let mut router = Router::new();
    let err = router.register(Method::Get, "users", text("u")).unwrap_err();
    assert!(matches!(err, RouteError::MissingLeadingSlash { .. }));
}

#[test]
fn empty_param_segment_is_not_found() {
    let mut router = Router::new();
    router.get("/users/:id", text("u"));

    let service = router.into_service();
    let resp = serve(&service, Method::Get, "/users//");
    assert_ne!(resp.status, StatusCode::OK);
}

#[test]
fn panic_recovery_default_500() {
    let mut router = Router::new();
    router.get("/boom", |_: &mut Request, _: &Params| -> Response {
        panic!("exploded")
    });

    let service = router.into_service();
    let resp = serve(&service, Method::Get, "/boom");
    assert_eq!(resp.status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[test]
fn panic_recovery_hook_sees_payload() {
    let mut router = Router::new();
    router.get("/boom", |_: &mut Request, _: &Params| -> Response {
        panic!("exploded")
    });
    router.recovery(|_req, payload| {
        let msg = payload
            .downcast_ref::<&str>()
            .copied()
            .unwrap_or("unknown");
        Response::new(StatusCode::INTERNAL_SERVER_ERROR).with_body(format!("recovered: {msg}"))
    });

    let service = router.into_service();
    let resp = serve(&service, Method::Get, "/boom");
    assert_eq!(body(&resp), "recovered: exploded");
}

#[test]
fn custom_not_found_and_error_responder() {
    let mut router = Router::new();
    router.get("/x", text("x"));
    router.error_responder(|_req, status| {
        Response::new(status).with_body(format!("custom {}", status.as_u16()))
    });

    let service = router.into_service();

    // 404 and 405 both go through the responder
    assert_eq!(body(&serve(&service, Method::Get, "/missing")), "custom 404");
    assert_eq!(body(&serve(&service, Method::Post, "/x")), "custom 405");

    // an explicit not-found handler outranks it
    let mut router = Router::new();
    router.get("/x", text("x"));
    router.not_found(|_: &mut Request, _: &Params| {
        Response::new(StatusCode::NOT_FOUND).with_body("nothing here")
    });
    let service = router.into_service();
    assert_eq!(body(&serve(&service, Method::Get, "/missing")), "nothing here");
}

#[test]
fn fallback_serves_unmatched_paths() {
    let mut router = Router::new();
    router.get("/api", text("api"));
    router.fallback(|req: &mut Request, _: &Params| {
        if req.path() == "/static/app.css" {
            Response::text("body{}")
        } else {
            Response::status_text(StatusCode::NOT_FOUND)
        }
    });

    let service = router.into_service();
    assert_eq!(body(&serve(&service, Method::Get, "/static/app.css")), "body{}");
    let resp = serve(&service, Method::Get, "/static/missing.css");
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
}

#[test]
fn fallback_errors_go_through_custom_error_responder() {
    let mut router = Router::new();
    router.get("/api", text("api"));
    router.fallback(|_: &mut Request, _: &Params| Response::status_text(StatusCode::NOT_FOUND));
    router.error_responder(|_req, status| {
        Response::new(status).with_body(format!("pretty {}", status.as_u16()))
    });

    let service = router.into_service();
    let resp = serve(&service, Method::Get, "/static/missing.css");
    assert_eq!(body(&resp), "pretty 404");

    // successful fallback responses pass through untouched
    let mut router = Router::new();
    router.fallback(|_: &mut Request, _: &Params| Response::text("ok"));
    router.error_responder(|_req, status| Response::new(status).with_body("pretty"));
    let service = router.into_service();
    assert_eq!(body(&serve(&service, Method::Get, "/anything")), "ok");
}

#[test]
fn handler_mutates_request_while_params_are_held() {
    let mut router = Router::new();
    router.get("/in/:id", |req: &mut Request, params: &Params| {
        let id = params.get("id").unwrap_or("").to_string();
        req.set_path("/rewritten");
        Response::text(format!("{} {id}", req.path()))
    });

    let service = router.into_service();
    assert_eq!(body(&serve(&service, Method::Get, "/in/9")), "/rewritten 9");
}

#[test]
fn params_index_by_position() {
    let mut router = Router::new();
    router.get("/x/:a/:b", text("x"));

    let lookup = router.lookup(Method::Get, "/x/one/two");
    assert_eq!(lookup.params[0].key, "a");
    assert_eq!(lookup.params[0].value, "one");
    assert_eq!(lookup.params[1].value, "two");
}

#[test]
fn matched_route_path_is_recorded_when_enabled() {
    let mut router = Router::new();
    router.save_matched_route_path(true);
    router.get("/users/:id", |_: &mut Request, params: &Params| {
        Response::text(params.matched_route_path().unwrap_or("").to_string())
    });
    router.get("/plain", |_: &mut Request, params: &Params| {
        Response::text(params.get(MATCHED_ROUTE_PATH_KEY).unwrap_or("").to_string())
    });

    let service = router.into_service();
    assert_eq!(body(&serve(&service, Method::Get, "/users/7")), "/users/:id");
    assert_eq!(body(&serve(&service, Method::Get, "/plain")), "/plain");
}

fn tag_middleware(label: &'static str, log: Arc<parking_lot::Mutex<Vec<String>>>) -> impl Middleware {
    move |next: Arc<dyn Handler>| -> Arc<dyn Handler> {
        let log = Arc::clone(&log);
        Arc::new(move |req: &mut Request, params: &Params| {
            log.lock().push(format!("enter {label}"));
            let resp = next.call(req, params);
            log.lock().push(format!("leave {label}"));
            resp
        })
    }
}

#[test]
fn global_and_group_middleware_nesting() {
    let log = Arc::new(parking_lot::Mutex::new(Vec::new()));

    let mut router = Router::new();
    router.use_middleware(tag_middleware("global", Arc::clone(&log)));

    let mut api = router.group("/api");
    api.use_middleware(tag_middleware("group", Arc::clone(&log)));
    let log_handler = Arc::clone(&log);
    api.get("/ping", move |_: &mut Request, _: &Params| {
        log_handler.lock().push("handler".to_string());
        Response::text("pong")
    });

    let service = router.into_service();
    let resp = serve(&service, Method::Get, "/api/ping");
    assert_eq!(body(&resp), "pong");
    assert_eq!(
        *log.lock(),
        vec!["enter global", "enter group", "handler", "leave group", "leave global"]
    );

    // global middleware also wraps misses
    log.lock().clear();
    let resp = serve(&service, Method::Get, "/nope");
    assert_eq!(resp.status, StatusCode::NOT_FOUND);
    assert_eq!(*log.lock(), vec!["enter global", "leave global"]);
}

#[test]
fn nested_groups_join_prefixes() {
    let mut router = Router::new();
    {
        let mut api = router.group("/api/");
        let mut v1 = api.group("/v1");
        v1.get("/users/:id", |_: &mut Request, params: &Params| {
            Response::text(params.get("id").unwrap_or("").to_string())
        });
    }

    let service = router.into_service();
    assert_eq!(body(&serve(&service, Method::Get, "/api/v1/users/9")), "9");
}

#[test]
fn any_registers_common_methods() {
    let mut router = Router::new();
    router.any("/everything", text("all"));

    let service = router.into_service();
    for method in [
        Method::Get,
        Method::Head,
        Method::Post,
        Method::Put,
        Method::Patch,
        Method::Delete,
        Method::Options,
    ] {
        assert_eq!(
            body(&serve(&service, method, "/everything")),
            "all",
            "{method} should be registered"
        );
    }
    let resp = serve(&service, Method::Trace, "/everything");
    assert_eq!(resp.status, StatusCode::METHOD_NOT_ALLOWED);
}

#[test]
fn concurrent_lookups_match_sequential_results() {
    let mut router = Router::new();
    router.get("/users/:id", |_: &mut Request, params: &Params| {
        Response::text(params.get("id").unwrap_or("").to_string())
    });
    router.get("/files/*filepath", |_: &mut Request, params: &Params| {
        Response::text(params.get("filepath").unwrap_or("").to_string())
    });

    let service = router.into_service();

    let sequential: Vec<String> = (0..200)
        .map(|i| {
            let path = if i % 2 == 0 {
                format!("/users/{i}")
            } else {
                format!("/files/a/{i}.txt")
            };
            body(&serve(&service, Method::Get, &path)).to_string()
        })
        .collect();

    let counter = Arc::new(AtomicUsize::new(0));
    let mut handles = Vec::new();
    for _ in 0..8 {
        let service = service.clone();
        let counter = Arc::clone(&counter);
        let expected = sequential.clone();
        handles.push(std::thread::spawn(move || {
            loop {
                let i = counter.fetch_add(1, Ordering::Relaxed);
                if i >= expected.len() {
                    break;
                }
                let path = if i % 2 == 0 {
                    format!("/users/{i}")
                } else {
                    format!("/files/a/{i}.txt")
                };
                let resp = serve(&service, Method::Get, &path);
                assert_eq!(body(&resp), expected[i]);
            }
        }));
    }
    for handle in handles {
        handle.join().unwrap();
    }
}
