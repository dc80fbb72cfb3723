mod common;

use std::sync::Arc;
use std::time::Duration;

use common::{config_for, detail_json, issue_json, note_json, paged, user_json};
use issuelens::browse::{
    AssetResolver, DetailLoader, FilterPatch, IssueBrowser, IssueQueryEngine, ListOutcome,
    SearchOutcome, TempAssetStore, member_search,
};
use issuelens::display::markdown::resolve_images;
use issuelens::display::rendered_notes;
use issuelens::{GitLabClient, GitLabConfig, IssueIid, IssueKey, ProjectId};
use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

type Client = GitLabClient<GitLabConfig>;

fn client(server: &MockServer) -> Arc<Client> {
    Arc::new(GitLabClient::new(config_for(server)).unwrap())
}

#[tokio::test]
async fn test_last_filter_wins_over_slower_earlier_response() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/1/issues"))
        .respond_with(
            paged(json!([issue_json(1, 1, "")]), 1, 1, 1, 20)
                .set_delay(Duration::from_millis(400)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/2/issues"))
        .respond_with(paged(json!([issue_json(2, 5, "")]), 1, 1, 1, 20))
        .mount(&server)
        .await;

    let browser = IssueBrowser::new(IssueQueryEngine::new(client(&server), 20));

    let (first, second) = tokio::join!(
        browser.apply(FilterPatch::project(Some(ProjectId(1)))),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            browser.apply(FilterPatch::project(Some(ProjectId(2)))).await
        }
    );

    assert_eq!(first, ListOutcome::Stale);
    assert_eq!(second, ListOutcome::Applied);
    let state = browser.snapshot();
    assert_eq!(state.items.len(), 1);
    assert_eq!(state.items[0].project_id, ProjectId(2));
}

#[tokio::test]
async fn test_pagination_scenario_45_items() {
    let server = MockServer::start().await;
    let issues: Vec<_> = (1..=20).map(|iid| issue_json(7, iid, "")).collect();
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/7/issues"))
        .and(query_param("page", "1"))
        .respond_with(paged(json!(issues), 45, 3, 1, 20))
        .mount(&server)
        .await;

    let browser = IssueBrowser::new(IssueQueryEngine::new(client(&server), 20));
    browser.apply(FilterPatch::project(Some(ProjectId(7)))).await;

    let pagination = browser.snapshot().pagination;
    assert_eq!(pagination.total_items, 45);
    assert_eq!(pagination.per_page, 20);
    assert_eq!(pagination.total_pages, 3);
    assert!(pagination.contains_page(3));
    assert!(!pagination.contains_page(4));
}

#[tokio::test]
async fn test_missing_pagination_headers_default_to_one_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/issues"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([issue_json(7, 1, ""), issue_json(8, 2, "")])),
        )
        .mount(&server)
        .await;

    let browser = IssueBrowser::new(IssueQueryEngine::new(client(&server), 20));
    browser.refresh().await;

    let pagination = browser.snapshot().pagination;
    assert_eq!(pagination.total_pages, 1);
    assert_eq!(pagination.total_items, 2);
    assert_eq!(pagination.current_page, 1);
}

#[tokio::test]
async fn test_issue_view_with_protected_images() {
    let server = MockServer::start().await;
    let description = "Broken:\n\n![one](/uploads/aa/one.png)\n\n![two](/uploads/bb/two.png)\n";

    Mock::given(method("GET"))
        .and(path("/api/v4/projects/7/issues/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(detail_json(7, 3, description)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/7/issues/3/notes"))
        .respond_with(paged(
            json!([
                note_json(2, "Same shot ![one](/uploads/aa/one.png)", "2024-03-02T10:00:00Z", false),
                note_json(1, "changed the description", "2024-03-01T10:00:00Z", true),
            ]),
            2,
            1,
            1,
            100,
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/7/uploads/aa/one.png"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(vec![1, 2, 3])
                .insert_header("content-type", "image/png")
                .set_delay(Duration::from_millis(100)),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/7/uploads/bb/two.png"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let api = client(&server);
    let assets = Arc::new(AssetResolver::new(
        Arc::clone(&api),
        TempAssetStore::new().unwrap(),
    ));
    let loader = DetailLoader::new(Arc::clone(&api), Arc::clone(&assets));

    loader
        .select(IssueKey {
            project_id: ProjectId(7),
            iid: IssueIid(3),
        })
        .await;
    let state = loader.snapshot();
    let detail = state.detail.unwrap();
    let notes = state.notes.unwrap();

    // Oldest first, system note kept in state but not rendered.
    assert_eq!(notes.iter().map(|n| n.id).collect::<Vec<_>>(), vec![1, 2]);
    let shown = rendered_notes(&notes);
    assert_eq!(shown.len(), 1);

    let resolve = |source: String| {
        let loader = &loader;
        async move { loader.resolve_asset(&source).await }
    };
    let body = detail.issue.description.unwrap();
    let (description, note_body) = tokio::join!(
        resolve_images(&body, resolve),
        resolve_images(&shown[0].body, resolve)
    );

    assert!(!description.contains("/uploads/aa/one.png"));
    assert!(description.contains("file://"));
    // Failed fetch keeps the original reference.
    assert!(description.contains("![two](/uploads/bb/two.png)"));
    assert!(note_body.contains("file://"));

    assets.release_all();
    assert!(assets.is_empty());
}

#[tokio::test]
async fn test_member_search_against_server() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v4/projects/7/users"))
        .respond_with(paged(
            json!([user_json(1, "alice"), user_json(2, "bob")]),
            2,
            1,
            1,
            100,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let search = member_search(client(&server), ProjectId(7), Duration::from_millis(20));

    let (early, late) = tokio::join!(search.search("a"), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        search.search("bo").await
    });

    assert_eq!(early, SearchOutcome::Superseded);
    let late = late.into_results().unwrap();
    assert_eq!(late.len(), 1);
    assert_eq!(late[0].username, "bob");
}
