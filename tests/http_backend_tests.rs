// SPDX-License-Identifier: MPL-2.0

use serde_json::json;
use std::sync::Arc;
use tablon::{
    Cursor, FeedBackend, FeedError, FeedSettings, FeedViewModel, HttpBackend, ImpressionTracker,
    ItemId, LikeAck, LoadOutcome,
};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn backend_for(server: &MockServer, token: Option<&str>) -> HttpBackend {
    let settings = FeedSettings {
        service_url: format!("{}/api", server.uri()),
        page_size: 2,
        request_timeout_secs: 2,
        auth_token: token.map(str::to_string),
    };
    HttpBackend::new(&settings).expect("backend")
}

fn publication_json(id: u64, owner: i64, like_count: u32) -> serde_json::Value {
    json!({
        "type": "publication",
        "id": id,
        "profile_id": owner,
        "display_name": format!("profile {owner}"),
        "published_at": "2024-05-01T10:00:00Z",
        "body": "hola",
        "like_count": like_count,
        "liked_by_viewer": false
    })
}

#[tokio::test]
async fn fetches_a_page_with_viewer_limit_and_cursor() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .and(query_param("profile_id", "7"))
        .and(query_param("limit", "2"))
        .and(query_param("cursor", "abc"))
        .and(header("authorization", "Bearer secret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [publication_json(1, 3, 4), {
                "type": "advertisement",
                "id": 1,
                "profile_id": 99,
                "display_name": "Acme",
                "is_company": true,
                "published_at": "2024-05-01T09:00:00Z"
            }],
            "next_cursor": "def",
            "has_more": true
        })))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server, Some("secret"));
    let page = backend
        .fetch_feed_page(7, Some(&Cursor::new("abc")))
        .await
        .unwrap();

    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id(), ItemId::publication(1));
    assert_eq!(page.items[1].id(), ItemId::advertisement(1));
    assert_eq!(page.next_cursor, Some(Cursor::new("def")));
    assert!(page.has_more);
}

#[tokio::test]
async fn maps_error_statuses() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "token expired"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/publications/5/save"))
        .respond_with(ResponseTemplate::new(404).set_body_string("gone"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/publications/6/save"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"message": "maintenance"})))
        .mount(&server)
        .await;

    let backend = backend_for(&server, None);
    assert_eq!(
        backend.fetch_feed_page(1, None).await,
        Err(FeedError::Auth("token expired".into()))
    );
    assert_eq!(
        backend.set_saved(ItemId::publication(5), 1, true).await,
        Err(FeedError::NotFound("gone".into()))
    );
    let error = backend
        .set_saved(ItemId::publication(6), 1, true)
        .await
        .unwrap_err();
    assert_eq!(
        error,
        FeedError::Server {
            status: 503,
            message: "maintenance".into()
        }
    );
    assert!(error.is_retryable());
}

#[tokio::test]
async fn malformed_page_is_an_invalid_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
        .mount(&server)
        .await;

    let backend = backend_for(&server, None);
    assert!(matches!(
        backend.fetch_feed_page(1, None).await,
        Err(FeedError::InvalidResponse(_))
    ));
}

#[tokio::test]
async fn like_sends_state_and_reads_the_count() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/publications/9/like"))
        .and(body_json(json!({"profile_id": 1, "liked": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"like_count": 12})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/publications/10/like"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let backend = backend_for(&server, None);
    assert_eq!(
        backend.set_like(ItemId::publication(9), 1, true).await,
        Ok(LikeAck {
            like_count: Some(12)
        })
    );
    assert_eq!(
        backend.set_like(ItemId::publication(10), 1, false).await,
        Ok(LikeAck::default())
    );
    assert!(matches!(
        backend.set_like(ItemId::advertisement(9), 1, true).await,
        Err(FeedError::InvalidOperation(_))
    ));
}

#[tokio::test]
async fn impressions_are_posted_to_the_ad() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/ads/4/impressions"))
        .and(body_json(json!({"profile_id": 8})))
        .respond_with(ResponseTemplate::new(202))
        .expect(1)
        .mount(&server)
        .await;

    let backend = backend_for(&server, None);
    assert_eq!(
        backend.report_impression(ItemId::advertisement(4), 8).await,
        Ok(())
    );
}

#[tokio::test]
async fn view_model_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .and(query_param("cursor", "p2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [publication_json(2, 3, 0), publication_json(3, 3, 0)],
            "has_more": false
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/feed"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "items": [publication_json(1, 3, 4), publication_json(2, 3, 0)],
            "next_cursor": "p2",
            "has_more": true
        })))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/publications/1/like"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({"message": "already liked"})))
        .mount(&server)
        .await;

    let vm = FeedViewModel::with_impressions(
        Arc::new(backend_for(&server, None)),
        ImpressionTracker::new(),
    );
    assert_eq!(vm.load_initial(1).await, LoadOutcome::Loaded(2));
    assert_eq!(vm.load_more(1).await, LoadOutcome::Loaded(1));
    assert!(!vm.has_more());

    let result = vm.toggle_like(ItemId::publication(1), 1).unwrap().await;
    assert_eq!(result, Err(FeedError::Conflict("already liked".into())));
    let item = vm.item(&ItemId::publication(1)).unwrap();
    let publication = item.as_publication().unwrap();
    assert_eq!(publication.like_count, 4);
    assert!(!publication.viewer_has_liked);
}
