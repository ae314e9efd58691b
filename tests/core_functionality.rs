use routier::{
    Router, RouterError, WILDCARD_PARAM, add_controller, add_route, find_route, set_index_route,
};
use std::collections::HashMap;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

fn setup_tracing_for_tests() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::TRACE)
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::TRACE.into()))
        .with_test_writer()
        .finish();
    tracing::subscriber::set_global_default(subscriber).ok();
}

fn to_hashmap(params: ahash::AHashMap<String, String>) -> HashMap<String, String> {
    params.into_iter().collect()
}

#[test]
fn test_static_routes() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/home", "home_data", 0, None).unwrap();
    add_route(&router, "/about/team", "team_data", 0, None).unwrap();

    let matched_home = find_route(&router, "/home");
    assert!(matched_home.is_match);
    assert_eq!(matched_home.matched_route.unwrap().handler, "home_data");
    assert!(matched_home.params.is_empty());

    // Trailing and doubled slashes are insignificant.
    assert!(find_route(&router, "/about/team/").is_match);
    assert!(find_route(&router, "//about//team").is_match);

    // Static comparison is case-insensitive.
    assert!(find_route(&router, "/HOME").is_match);
    assert!(find_route(&router, "/About/TEAM").is_match);

    let miss = find_route(&router, "/nonexistent");
    assert!(!miss.is_match);
    assert!(miss.matched_route.is_none());
    assert!(miss.params.is_empty());
}

#[test]
fn test_int_constrained_parameter() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/test/{arg1:int}", "H1", 0, None).unwrap();

    let matched = find_route(&router, "/test/4");
    assert!(matched.is_match);
    assert_eq!(matched.matched_route.unwrap().handler, "H1");
    assert_eq!(
        to_hashmap(matched.params),
        HashMap::from([("arg1".to_string(), "4".to_string())])
    );

    assert!(!find_route(&router, "/test/abc").is_match);
}

#[test]
fn test_nested_dynamic_segments() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/products/{category:alpha}", "H2", 0, None).unwrap();
    add_route(&router, "/products/{category:alpha}/{id:int}", "H3", 0, None).unwrap();

    let matched = find_route(&router, "/products/electronics/123");
    assert!(matched.is_match);
    assert_eq!(matched.matched_route.unwrap().handler, "H3");
    assert_eq!(
        to_hashmap(matched.params),
        HashMap::from([
            ("category".to_string(), "electronics".to_string()),
            ("id".to_string(), "123".to_string()),
        ])
    );

    let shallow = find_route(&router, "/products/books");
    assert!(shallow.is_match);
    assert_eq!(shallow.matched_route.unwrap().handler, "H2");

    // Digits fail the alpha constraint on the first segment.
    assert!(!find_route(&router, "/products/123/456").is_match);
}

#[test]
fn test_guid_constrained_parameter() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/users/{userId:guid}", "H4", 0, None).unwrap();

    let matched = find_route(&router, "/users/550e8400-e29b-41d4-a716-446655440000");
    assert!(matched.is_match);
    assert_eq!(matched.matched_route.unwrap().handler, "H4");
    assert_eq!(
        matched.params.get("userid").unwrap(),
        "550e8400-e29b-41d4-a716-446655440000"
    );

    assert!(!find_route(&router, "/users/not-a-guid").is_match);
}

#[test]
fn test_static_beats_wildcard_in_any_insertion_order() {
    setup_tracing_for_tests();
    for static_first in [true, false] {
        let router = Router::new();
        if static_first {
            add_route(&router, "/docs/special", "H5", 0, None).unwrap();
            add_route(&router, "/docs/*", "H6", 0, None).unwrap();
        } else {
            add_route(&router, "/docs/*", "H6", 0, None).unwrap();
            add_route(&router, "/docs/special", "H5", 0, None).unwrap();
        }

        let special = find_route(&router, "/docs/special");
        assert!(special.is_match);
        assert_eq!(special.matched_route.unwrap().handler, "H5");

        let nested = find_route(&router, "/docs/other/nested");
        assert!(nested.is_match);
        assert_eq!(nested.matched_route.unwrap().handler, "H6");
        assert_eq!(
            to_hashmap(nested.params),
            HashMap::from([(WILDCARD_PARAM.to_string(), "/other/nested/".to_string())])
        );
    }
}

#[test]
fn test_wildcard_matches_empty_remainder() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/docs/*", "H6", 0, None).unwrap();

    let matched = find_route(&router, "/docs");
    assert!(matched.is_match);
    assert_eq!(matched.params.get(WILDCARD_PARAM).unwrap(), "/");

    let single = find_route(&router, "/docs/one");
    assert_eq!(single.params.get(WILDCARD_PARAM).unwrap(), "/one/");
}

#[test]
fn test_priority_overrides_and_equal_priority_last_writer_wins() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/data/{id:int}", "HA", 0, None).unwrap();
    add_route(&router, "/data/{id:int}", "HB", 10, None).unwrap();
    add_route(&router, "/data/{id:int}", "HC", 5, None).unwrap();

    let matched = find_route(&router, "/data/123");
    assert!(matched.is_match);
    assert_eq!(matched.matched_route.unwrap().handler, "HB");

    let router = Router::new();
    add_route(&router, "/data/{id:int}", "first", 0, None).unwrap();
    add_route(&router, "/data/{id:int}", "second", 0, None).unwrap();
    assert_eq!(
        find_route(&router, "/data/7").matched_route.unwrap().handler,
        "second"
    );
}

#[test]
fn test_priority_respected_across_sibling_candidates() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/p/{x}", "low", 0, None).unwrap();
    add_route(&router, "/p/{y}", "high", 5, None).unwrap();

    let matched = find_route(&router, "/p/value");
    assert!(matched.is_match);
    assert_eq!(matched.matched_route.unwrap().handler, "high");
    assert_eq!(
        to_hashmap(matched.params),
        HashMap::from([("y".to_string(), "value".to_string())])
    );
}

#[test]
fn test_min_constraint_rejects_below_bound() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/search/{query}/{page:int:min(1)}", "H7", 0, None).unwrap();

    assert!(!find_route(&router, "/search/phones/0").is_match);

    let matched = find_route(&router, "/search/phones/1");
    assert!(matched.is_match);
    assert_eq!(
        to_hashmap(matched.params),
        HashMap::from([
            ("query".to_string(), "phones".to_string()),
            ("page".to_string(), "1".to_string()),
        ])
    );
}

#[test]
fn test_optional_trailing_parameter() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/api/items/{id:int?}", "optional_item_id", 0, None).unwrap();

    let with_id = find_route(&router, "/api/items/123");
    assert!(with_id.is_match);
    assert_eq!(with_id.params.get("id").unwrap(), "123");

    let without_id = find_route(&router, "/api/items/");
    assert!(without_id.is_match);
    assert_eq!(without_id.matched_route.unwrap().handler, "optional_item_id");
    assert!(without_id.params.get("id").is_none());

    // The constraint still applies when the segment is present.
    assert!(!find_route(&router, "/api/items/abc").is_match);
}

#[test]
fn test_default_values_fill_truncated_suffix() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/list/{page=1:int}", "listing", 0, None).unwrap();

    let truncated = find_route(&router, "/list");
    assert!(truncated.is_match);
    assert_eq!(
        to_hashmap(truncated.params),
        HashMap::from([("page".to_string(), "1".to_string())])
    );

    let explicit = find_route(&router, "/list/5");
    assert!(explicit.is_match);
    assert_eq!(explicit.params.get("page").unwrap(), "5");
}

#[test]
fn test_multi_level_defaults() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/report/{year=2024}/{month=01}", "report", 0, None).unwrap();

    let bare = find_route(&router, "/report");
    assert!(bare.is_match);
    assert_eq!(
        to_hashmap(bare.params),
        HashMap::from([
            ("year".to_string(), "2024".to_string()),
            ("month".to_string(), "01".to_string()),
        ])
    );

    let partial = find_route(&router, "/report/2025");
    assert!(partial.is_match);
    assert_eq!(
        to_hashmap(partial.params),
        HashMap::from([
            ("year".to_string(), "2025".to_string()),
            ("month".to_string(), "01".to_string()),
        ])
    );

    let full = find_route(&router, "/report/2025/12");
    assert_eq!(full.params.get("month").unwrap(), "12");
}

#[test]
fn test_constraint_discrimination_orders_narrow_first() {
    setup_tracing_for_tests();
    let router = Router::new();
    // Registered widest-first on purpose; the tie-break reorders them.
    add_route(&router, "/d/{id}", "any_route", 0, None).unwrap();
    add_route(&router, "/d/{id:guid}", "guid_route", 0, None).unwrap();
    add_route(&router, "/d/{id:int}", "int_route", 0, None).unwrap();

    assert_eq!(
        find_route(&router, "/d/12").matched_route.unwrap().handler,
        "int_route"
    );
    assert_eq!(
        find_route(&router, "/d/550e8400-e29b-41d4-a716-446655440000")
            .matched_route
            .unwrap()
            .handler,
        "guid_route"
    );
    assert_eq!(
        find_route(&router, "/d/plain-text")
            .matched_route
            .unwrap()
            .handler,
        "any_route"
    );
}

#[test]
fn test_backtracking_unbinds_failed_candidates() {
    setup_tracing_for_tests();
    let router = Router::new();
    // The int candidate is tried first but its subtree dead-ends, so the
    // matcher must back out of it, including the `y` binding.
    add_route(&router, "/b/{y:int}/stop", "int_branch", 0, None).unwrap();
    add_route(&router, "/b/{x}/end", "fallback_branch", 0, None).unwrap();

    let matched = find_route(&router, "/b/5/end");
    assert!(matched.is_match);
    assert_eq!(matched.matched_route.unwrap().handler, "fallback_branch");
    assert_eq!(
        to_hashmap(matched.params),
        HashMap::from([("x".to_string(), "5".to_string())])
    );
}

#[test]
fn test_catch_all_capture_and_ordering() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/files/{**path}", "catch_all", 0, None).unwrap();
    add_route(&router, "/files/readme", "readme", 0, None).unwrap();
    add_route(&router, "/files/*", "wildcard", 0, None).unwrap();

    // Static wins, then catch-all, then wildcard.
    assert_eq!(
        find_route(&router, "/files/readme")
            .matched_route
            .unwrap()
            .handler,
        "readme"
    );

    let nested = find_route(&router, "/files/docs/Report.PDF");
    assert!(nested.is_match);
    assert_eq!(nested.matched_route.unwrap().handler, "catch_all");
    assert_eq!(
        to_hashmap(nested.params),
        HashMap::from([("path".to_string(), "docs/Report.PDF".to_string())])
    );
}

#[test]
fn test_catch_all_constraints_fall_back_to_wildcard() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/media/{**rest:maxlength(10)}", "short_rest", 0, None).unwrap();
    add_route(&router, "/media/*", "any_rest", 0, None).unwrap();

    let short = find_route(&router, "/media/a/b");
    assert_eq!(short.matched_route.unwrap().handler, "short_rest");
    assert_eq!(short.params.get("rest").unwrap(), "a/b");

    // Remainder exceeds the catch-all constraint, wildcard takes over.
    let long = find_route(&router, "/media/a/very/long/remainder");
    assert_eq!(long.matched_route.unwrap().handler, "any_rest");
    assert_eq!(
        long.params.get(WILDCARD_PARAM).unwrap(),
        "/a/very/long/remainder/"
    );
}

#[test]
fn test_conflicting_catch_alls_are_rejected() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/files/{**path}", "first", 0, None).unwrap();

    // One catch-all bucket per position: a different name or a different
    // constraint set under the same parent is a registration error.
    assert!(matches!(
        add_route(&router, "/files/{**other}", "second", 0, None),
        Err(RouterError::Structural { reason, .. }) if reason.contains("catch-all")
    ));
    assert!(matches!(
        add_route(&router, "/files/{**path:maxlength(5)}", "third", 0, None),
        Err(RouterError::Structural { .. })
    ));

    // The rejected routes left nothing behind; the original still matches.
    assert_eq!(router.routes().len(), 1);
    let matched = find_route(&router, "/files/a/b");
    assert!(matched.is_match);
    assert_eq!(matched.matched_route.unwrap().handler, "first");
    assert_eq!(matched.params.get("path").unwrap(), "a/b");

    // The identical definition reuses the bucket and shadows as usual.
    add_route(&router, "/files/{**path}", "replacement", 0, None).unwrap();
    assert_eq!(
        find_route(&router, "/files/a/b")
            .matched_route
            .unwrap()
            .handler,
        "replacement"
    );

    // Catch-alls at different positions never conflict.
    add_route(&router, "/docs/{**other}", "docs", 0, None).unwrap();
    assert!(find_route(&router, "/docs/x").is_match);
}

#[test]
fn test_captured_values_preserve_request_casing() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/Users/{UserName}", "profile", 0, None).unwrap();

    let matched = find_route(&router, "/users/MixedCase");
    assert!(matched.is_match);
    // Keys are the lower-cased parameter names; values keep request casing.
    assert_eq!(
        to_hashmap(matched.params),
        HashMap::from([("username".to_string(), "MixedCase".to_string())])
    );
}

#[test]
fn test_unknown_constraint_registers_but_never_matches() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/x/{v:slug}", "never", 0, None).unwrap();

    assert!(!find_route(&router, "/x/anything").is_match);
    assert!(!find_route(&router, "/x/").is_match);
    assert_eq!(router.routes().len(), 1);
}

#[test]
fn test_regex_constraint_end_to_end() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, r"/v/{ver:regex(^v\d+\.\d+$)}", "versioned", 0, None).unwrap();

    assert!(find_route(&router, "/v/v1.2").is_match);
    assert!(!find_route(&router, "/v/1.2").is_match);

    // Malformed expressions reject every candidate instead of erroring.
    add_route(&router, "/w/{bad:regex(()}", "broken", 0, None).unwrap();
    assert!(!find_route(&router, "/w/anything").is_match);
}

#[test]
fn test_invalid_patterns_are_rejected() {
    setup_tracing_for_tests();
    let router: Router<&str> = Router::new();

    assert!(matches!(
        add_route(&router, "/a/{id", "data", 0, None),
        Err(RouterError::PatternSyntax { .. })
    ));
    assert!(matches!(
        add_route(&router, "/a/{}", "data", 0, None),
        Err(RouterError::PatternSyntax { .. })
    ));
    assert!(matches!(
        add_route(&router, "/a/{page=1?}", "data", 0, None),
        Err(RouterError::PatternSyntax { .. })
    ));
    assert!(matches!(
        add_route(&router, "/a/*/b", "data", 0, None),
        Err(RouterError::Structural { .. })
    ));
    assert!(matches!(
        add_route(&router, "/a/{x?}/b", "data", 0, None),
        Err(RouterError::Structural { .. })
    ));
    assert!(matches!(
        add_route(&router, "/a/{**rest?}", "data", 0, None),
        Err(RouterError::Structural { .. })
    ));
    assert!(matches!(
        add_route(&router, "/a/{n:min(abc)}", "data", 0, None),
        Err(RouterError::ConstraintFormat { .. })
    ));

    // Nothing was stored along the way.
    assert!(router.routes().is_empty());
    assert!(!find_route(&router, "/a/b").is_match);
}

#[test]
fn test_index_route_for_empty_path() {
    setup_tracing_for_tests();
    let router = Router::new();
    set_index_route(&router, "index_page");

    for path in ["", "/", "///"] {
        let matched = find_route(&router, path);
        assert!(matched.is_match, "path {path:?} should hit the index route");
        assert_eq!(matched.matched_route.unwrap().handler, "index_page");
        assert!(matched.params.is_empty());
    }
}

#[test]
fn test_controller_index_retry() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/home/index", "home_index", 0, None).unwrap();
    add_controller(&router, "Home");

    // Single-segment clean miss on a known controller retries <name>/index.
    let matched = find_route(&router, "/home");
    assert!(matched.is_match);
    assert_eq!(matched.matched_route.unwrap().handler, "home_index");

    // Unregistered names miss as usual.
    assert!(!find_route(&router, "/shop").is_match);
}

#[test]
fn test_controller_retry_skipped_on_partial_miss() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/{q:int?}", "root_numbers", 0, None).unwrap();
    add_route(&router, "/shop/index", "shop_index", 0, None).unwrap();
    add_controller(&router, "shop");

    // "/shop" fails the int candidate but passed a routable node (the root
    // truncation), so the miss is partial and the retry must not run.
    let result = find_route(&router, "/shop");
    assert!(!result.is_match);
    let partial = result.best_partial.expect("partial expected");
    assert_eq!(partial.handler, "root_numbers");
}

#[test]
fn test_best_partial_reports_deepest_routable_node() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/a", "shallow", 0, None).unwrap();
    add_route(&router, "/a/b", "deep", 0, None).unwrap();
    add_route(&router, "/a/b/c", "deepest", 0, None).unwrap();

    let result = find_route(&router, "/a/b/missing");
    assert!(!result.is_match);
    assert!(result.matched_route.is_none());
    assert_eq!(result.best_partial.unwrap().handler, "deep");
    // A miss never exposes partial bindings.
    assert!(result.params.is_empty());
}

#[test]
fn test_match_is_deterministic() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(&router, "/s/{a}/{b:int?}", "stable", 0, None).unwrap();

    let first = find_route(&router, "/s/one/2");
    let second = find_route(&router, "/s/one/2");
    assert_eq!(first.is_match, second.is_match);
    assert_eq!(
        first.matched_route.as_ref().unwrap().route_id,
        second.matched_route.as_ref().unwrap().route_id
    );
    assert_eq!(to_hashmap(first.params), to_hashmap(second.params));
}

#[test]
fn test_roles_pass_through() {
    setup_tracing_for_tests();
    let router = Router::new();
    add_route(
        &router,
        "/admin/{section}",
        "admin_area",
        0,
        Some(vec!["admin".to_string(), "operator".to_string()]),
    )
    .unwrap();

    let matched = find_route(&router, "/admin/settings");
    assert_eq!(
        matched.matched_route.unwrap().authorized_roles,
        Some(vec!["admin".to_string(), "operator".to_string()])
    );
}

#[test]
fn test_routes_snapshot() {
    setup_tracing_for_tests();
    let router = Router::new();
    let first = add_route(&router, "/one", "one", 0, None).unwrap();
    let second = add_route(&router, "/two/{id:int}", "two", 3, None).unwrap();

    let snapshot = router.routes();
    assert_eq!(snapshot.len(), 2);
    assert_eq!(snapshot[0].id, first);
    assert_eq!(snapshot[0].pattern, "/one");
    assert_eq!(snapshot[1].id, second);
    assert_eq!(snapshot[1].priority, 3);
}

#[test]
fn test_concurrent_adds_are_observed_by_finds() {
    setup_tracing_for_tests();
    let router: Router<usize> = Router::new();

    std::thread::scope(|scope| {
        for t in 0..4usize {
            let router = &router;
            scope.spawn(move || {
                for i in 0..50usize {
                    let pattern = format!("/bulk{t}/{i}/{{id:int}}");
                    add_route(router, &pattern, t * 1000 + i, 0, None).unwrap();
                    // Reads interleave with writes from sibling threads.
                    let matched = find_route(router, &format!("/bulk{t}/{i}/7"));
                    assert!(matched.is_match);
                }
            });
        }
    });

    for t in 0..4usize {
        for i in 0..50usize {
            let matched = find_route(&router, &format!("/bulk{t}/{i}/42"));
            assert!(matched.is_match);
            assert_eq!(matched.matched_route.unwrap().handler, t * 1000 + i);
        }
    }
}
