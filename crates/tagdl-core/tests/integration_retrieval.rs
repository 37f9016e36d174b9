//! Integration tests: real client against a local index server.
//!
//! Starts the minimal test server, resolves and retrieves through
//! `RemoteClient`, and (for the end-to-end case) dispatches downloads into
//! a temp dir and verifies a second pass finds nothing left to do.

mod common;

use common::booru_server::{self, BooruServer};
use serde_json::json;
use tempfile::tempdir;

use tagdl_core::dispatch::{run_dispatch, FetchOptions};
use tagdl_core::remote::{Credentials, RemoteClient, RemoteError};
use tagdl_core::resolver::TagResolver;
use tagdl_core::retriever::collect_work_list;
use tagdl_core::retry::SkipPolicy;
use tagdl_core::store::AcquisitionStore;

fn post(server: &BooruServer, id: u64) -> serde_json::Value {
    json!({
        "id": id,
        "file_url": format!("{}/assets/{id}.png", server.base_url),
        "file_ext": "png",
        "tag_string": "dragon_girl solo highres",
        "rating": "g",
        "score": 3
    })
}

fn client(server: &BooruServer) -> RemoteClient {
    RemoteClient::new(&server.base_url).unwrap()
}

#[test]
fn count_query_reads_post_count() {
    let server = booru_server::start(Vec::new());
    server.set_post_count(4321);
    assert_eq!(client(&server).post_count("dragon_girl").unwrap(), 4321);
}

#[test]
fn count_query_shape_mismatch_is_fatal() {
    let server = booru_server::start(Vec::new());
    let c = client(&server);

    server.set_tags_body("[]");
    assert!(matches!(
        c.post_count("dragon_girl"),
        Err(RemoteError::UnknownTag)
    ));

    server.set_tags_body(r#"[{"name":"dragon_girl"}]"#);
    assert!(matches!(
        c.post_count("dragon_girl"),
        Err(RemoteError::MissingField("post_count"))
    ));

    server.set_tags_body("not json");
    assert!(matches!(
        c.post_count("dragon_girl"),
        Err(RemoteError::Json(_))
    ));
}

#[test]
fn login_rejection_reported() {
    let server = booru_server::start(Vec::new());
    let creds = Credentials {
        login: "tester".into(),
        api_key: "key".into(),
    };
    client(&server).verify_login(&creds).unwrap();
    server.set_auth_ok(false);
    assert!(matches!(
        client(&server).verify_login(&creds),
        Err(RemoteError::LoginRejected(401))
    ));
}

#[test]
fn tag_query_not_url_encoded_on_the_wire() {
    // Parentheses and the rating metatag's colon would both be mangled by a
    // generic parameter serializer; they must hit the wire verbatim.
    let tag = "kirisame_marisa_(touhou)";
    let server = booru_server::start(Vec::new());
    let c = client(&server);
    let store_dir = tempdir().unwrap();
    let store = AcquisitionStore::new(store_dir.path());
    let plan = TagResolver::new(&c, &store)
        .plan(tag, Some("s"), Some(10))
        .unwrap();
    collect_work_list(&c, tag, Some("s"), &plan, SkipPolicy::default());
    let reqs = server.posts_requests();
    assert_eq!(reqs.len(), 1);
    assert!(
        reqs[0].contains("tags=kirisame_marisa_(touhou)+rating:s&"),
        "got: {}",
        reqs[0]
    );
}

#[test]
fn paginates_450_posts_in_three_sized_pages() {
    let server = booru_server::start(Vec::new());
    server.set_posts((1..=450).map(|id| post(&server, id)).collect());

    let c = client(&server);
    let store_dir = tempdir().unwrap();
    let store = AcquisitionStore::new(store_dir.path());
    let plan = TagResolver::new(&c, &store)
        .plan("dragon_girl", None, None)
        .unwrap();
    assert_eq!(plan.desired, 450);

    let r = collect_work_list(&c, "dragon_girl", None, &plan, SkipPolicy::default());
    assert_eq!(r.work.len(), 450);
    let reqs = server.posts_requests();
    assert_eq!(reqs.len(), 3);
    assert!(reqs[0].contains("limit=200&page=1"));
    assert!(reqs[1].contains("limit=200&page=2"));
    assert!(reqs[2].contains("limit=50&page=3"));
}

#[test]
fn status_errors_retry_then_succeed() {
    let server = booru_server::start(Vec::new());
    server.set_posts((1..=5).map(|id| post(&server, id)).collect());
    server.fail_next_statuses(2);

    let c = client(&server);
    let store_dir = tempdir().unwrap();
    let store = AcquisitionStore::new(store_dir.path());
    let plan = TagResolver::new(&c, &store)
        .plan("dragon_girl", None, Some(5))
        .unwrap();
    let r = collect_work_list(&c, "dragon_girl", None, &plan, SkipPolicy::default());
    assert_eq!(r.work.len(), 5);
    assert_eq!(r.stats.retries, 2);
    assert_eq!(r.stats.pages_skipped, 0);
    assert_eq!(server.posts_requests().len(), 3);
}

#[test]
fn dropped_connections_exhaust_budget_and_skip_page() {
    let server = booru_server::start(Vec::new());
    server.set_posts((1..=250).map(|id| post(&server, id)).collect());
    server.drop_next_connections(5);

    let c = client(&server);
    let store_dir = tempdir().unwrap();
    let store = AcquisitionStore::new(store_dir.path());
    let plan = TagResolver::new(&c, &store)
        .plan("dragon_girl", None, Some(250))
        .unwrap();
    let r = collect_work_list(&c, "dragon_girl", None, &plan, SkipPolicy::default());
    // Page 1 dies five times and is skipped; page 2 (the last 50) survives.
    assert_eq!(r.stats.pages_skipped, 1);
    assert_eq!(r.work.len(), 50);
    let reqs = server.posts_requests();
    assert_eq!(reqs.len(), 6);
    assert!(reqs[5].contains("page=2"));
}

#[test]
fn end_to_end_acquire_then_idempotent_rerun() {
    let server = booru_server::start(Vec::new());
    server.set_posts((1..=8).map(|id| post(&server, id)).collect());

    let c = client(&server);
    let out = tempdir().unwrap();
    let store = AcquisitionStore::new(out.path());
    let resolver = TagResolver::new(&c, &store);

    let plan = resolver.plan("dragon_girl", None, None).unwrap();
    assert_eq!(plan.desired, 8);
    let r = collect_work_list(&c, "dragon_girl", None, &plan, SkipPolicy::default());
    assert_eq!(r.work.len(), 8);

    let summary = run_dispatch(
        &c,
        &store,
        "dragon_girl",
        r.work.into_items(),
        &FetchOptions::default(),
        4,
        None,
    );
    assert_eq!(summary.acquired, 8);
    assert_eq!(summary.failed, 0);

    // All three files per item, plus manifest entries.
    let acquired = store.acquired_ids("dragon_girl", None);
    assert_eq!(acquired.len(), 8);
    let paths = store.paths("dragon_girl", "g", 1, "png");
    assert!(paths.image.exists() && paths.tags.exists() && paths.infos.exists());
    let asset = std::fs::read_to_string(&paths.image).unwrap();
    assert_eq!(asset, "asset:/assets/1.png");
    let tags = std::fs::read_to_string(&paths.tags).unwrap();
    assert_eq!(tags, "dragon_girl\nsolo\nhighres");
    let infos: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.infos).unwrap()).unwrap();
    assert_eq!(infos["score"], 3);

    // Second pass: desired is zero, so not a single page request goes out.
    let before = server.posts_requests().len();
    let plan2 = resolver.plan("dragon_girl", None, None).unwrap();
    assert_eq!(plan2.desired, 0);
    let r2 = collect_work_list(&c, "dragon_girl", None, &plan2, SkipPolicy::default());
    assert!(r2.work.is_empty());
    assert_eq!(server.posts_requests().len(), before);
}

#[test]
fn metadata_only_mode_dedupes_via_manifest() {
    let server = booru_server::start(Vec::new());
    server.set_posts((1..=3).map(|id| post(&server, id)).collect());

    let c = client(&server);
    let out = tempdir().unwrap();
    let store = AcquisitionStore::new(out.path());
    let resolver = TagResolver::new(&c, &store);

    let plan = resolver.plan("dragon_girl", None, None).unwrap();
    let r = collect_work_list(&c, "dragon_girl", None, &plan, SkipPolicy::default());
    let opts = FetchOptions {
        only_infos: true,
        ..FetchOptions::default()
    };
    let summary = run_dispatch(&c, &store, "dragon_girl", r.work.into_items(), &opts, 2, None);
    assert_eq!(summary.acquired, 3);
    let paths = store.paths("dragon_girl", "g", 1, "png");
    assert!(!paths.image.exists());
    assert!(paths.tags.exists() && paths.infos.exists());

    // No asset files, but the manifest still marks them acquired.
    let plan2 = resolver.plan("dragon_girl", None, None).unwrap();
    assert_eq!(plan2.desired, 0);
}
