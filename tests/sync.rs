use mockito::{Matcher, Server, ServerGuard};
use serde_json::json;
use tagsync::config::{GitHubConfig, MirrorConfig, SyncConfig, UpstreamConfig};

fn config(upstream: &ServerGuard, mirror: &ServerGuard, github: &ServerGuard) -> SyncConfig {
    SyncConfig {
        upstream: UpstreamConfig {
            base_url: upstream.url(),
            repository: "library/golang".to_string(),
            username: "u".to_string(),
            password: "p".to_string(),
        },
        mirror: MirrorConfig {
            base_url: mirror.url(),
            owner: "hongfs".to_string(),
            repo: "golang".to_string(),
            access_key_id: "ak".to_string(),
            access_key_secret: "as".to_string(),
        },
        github: GitHubConfig {
            base_url: github.url(),
            owner: "hongfs".to_string(),
            repo: "golang".to_string(),
            token: "t".to_string(),
            tagger_email: "hong@hongfs.cn".to_string(),
        },
    }
}

async fn upstream_mocks(server: &mut Server, names: &[&str]) -> Vec<mockito::Mock> {
    let results: Vec<serde_json::Value> = names
        .iter()
        .enumerate()
        .map(|(i, name)| {
            json!({
                "id": i + 1,
                "name": name,
                "tag_status": "active",
                "tag_last_pushed": "2024-01-15T10:00:00Z"
            })
        })
        .collect();

    vec![
        server
            .mock("POST", "/v2/users/login")
            .with_status(200)
            .with_body(r#"{"token": "test-token"}"#)
            .create_async()
            .await,
        server
            .mock("GET", "/v2/repositories/library/golang/tags/")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(json!({"results": results, "next": null}).to_string())
            .create_async()
            .await,
    ]
}

async fn publish_mocks(server: &mut Server, count: usize) -> Vec<mockito::Mock> {
    vec![
        server
            .mock("GET", "/repos/hongfs/golang/contents/Dockerfile")
            .with_status(200)
            .with_body(r#"{"sha": "old-sha"}"#)
            .expect(count)
            .create_async()
            .await,
        server
            .mock("PUT", "/repos/hongfs/golang/contents/Dockerfile")
            .with_status(200)
            .with_body(r#"{"commit": {"sha": "commit-sha"}}"#)
            .expect(count)
            .create_async()
            .await,
        server
            .mock("POST", "/repos/hongfs/golang/git/tags")
            .with_status(201)
            .with_body(r#"{"sha": "tag-sha"}"#)
            .expect(count)
            .create_async()
            .await,
        server
            .mock("DELETE", Matcher::Regex("^/repos/hongfs/golang/git/refs/tags/".to_string()))
            .with_status(204)
            .expect(count)
            .create_async()
            .await,
        server
            .mock("POST", "/repos/hongfs/golang/git/refs")
            .with_status(201)
            .with_body(r#"{"ref": "created"}"#)
            .expect(count)
            .create_async()
            .await,
    ]
}

#[tokio::test]
async fn missing_mirror_tag_is_published_while_fresh_ones_are_left_alone() {
    let mut upstream = Server::new_async().await;
    let mut mirror = Server::new_async().await;
    let mut github = Server::new_async().await;

    let up = upstream_mocks(&mut upstream, &["1.21"]).await;

    // mirror already has "1.21" but not "1.21-alpine"
    let mirror_mock = mirror
        .mock("GET", "/repos/hongfs/golang/tags")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(
            json!({"data": {"tags": [
                {"tag": "1.21", "status": "NORMAL", "imageUpdate": 1705312800000i64}
            ]}})
            .to_string(),
        )
        .create_async()
        .await;

    // exactly one publish: the alpine variant, forced because it is absent
    let contents = github
        .mock("GET", "/repos/hongfs/golang/contents/Dockerfile")
        .with_status(200)
        .with_body(r#"{"sha": "old-sha"}"#)
        .create_async()
        .await;
    let put = github
        .mock("PUT", "/repos/hongfs/golang/contents/Dockerfile")
        .match_body(Matcher::PartialJson(json!({"message": "auto-1.21-alpine"})))
        .with_status(200)
        .with_body(r#"{"commit": {"sha": "commit-sha"}}"#)
        .create_async()
        .await;
    let tag = github
        .mock("POST", "/repos/hongfs/golang/git/tags")
        .match_body(Matcher::PartialJson(json!({"tag": "release-v1.21-alpine"})))
        .with_status(201)
        .with_body(r#"{"sha": "tag-sha"}"#)
        .create_async()
        .await;
    let delete = github
        .mock(
            "DELETE",
            "/repos/hongfs/golang/git/refs/tags/release-v1.21-alpine",
        )
        .with_status(204)
        .create_async()
        .await;
    let create_ref = github
        .mock("POST", "/repos/hongfs/golang/git/refs")
        .match_body(Matcher::PartialJson(
            json!({"ref": "refs/tags/release-v1.21-alpine"}),
        ))
        .with_status(201)
        .with_body(r#"{"ref": "created"}"#)
        .create_async()
        .await;

    tagsync::sync::run(&config(&upstream, &mirror, &github))
        .await
        .unwrap();

    for mock in up {
        mock.assert_async().await;
    }
    mirror_mock.assert_async().await;
    contents.assert_async().await;
    put.assert_async().await;
    tag.assert_async().await;
    delete.assert_async().await;
    create_ref.assert_async().await;
}

#[tokio::test]
async fn mirror_failure_degrades_to_full_forced_republish() {
    let mut upstream = Server::new_async().await;
    let mut mirror = Server::new_async().await;
    let mut github = Server::new_async().await;

    let _up = upstream_mocks(&mut upstream, &["1.21"]).await;

    let mirror_mock = mirror
        .mock("GET", "/repos/hongfs/golang/tags")
        .match_query(Matcher::Any)
        .with_status(500)
        .with_body("boom")
        .create_async()
        .await;

    // both "1.21" and "1.21-alpine" are treated as missing
    let gh = publish_mocks(&mut github, 2).await;

    tagsync::sync::run(&config(&upstream, &mirror, &github))
        .await
        .unwrap();

    mirror_mock.assert_async().await;
    for mock in gh {
        mock.assert_async().await;
    }
}

#[tokio::test]
async fn upstream_failure_aborts_before_any_publish() {
    let mut upstream = Server::new_async().await;
    let mirror = Server::new_async().await;
    let mut github = Server::new_async().await;

    let login = upstream
        .mock("POST", "/v2/users/login")
        .with_status(200)
        .with_body(r#"{"detail": "incorrect authentication credentials"}"#)
        .create_async()
        .await;

    let gh = github
        .mock("PUT", "/repos/hongfs/golang/contents/Dockerfile")
        .expect(0)
        .create_async()
        .await;

    let result = tagsync::sync::run(&config(&upstream, &mirror, &github)).await;

    login.assert_async().await;
    gh.assert_async().await;
    assert!(result.is_err());
}

#[tokio::test]
async fn per_tag_publish_failure_does_not_stop_the_run() {
    let mut upstream = Server::new_async().await;
    let mut mirror = Server::new_async().await;
    let mut github = Server::new_async().await;

    let _up = upstream_mocks(&mut upstream, &["1.21"]).await;

    let _mirror_mock = mirror
        .mock("GET", "/repos/hongfs/golang/tags")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(json!({"data": {"tags": []}}).to_string())
        .create_async()
        .await;

    let _contents = github
        .mock("GET", "/repos/hongfs/golang/contents/Dockerfile")
        .with_status(200)
        .with_body(r#"{"sha": "old-sha"}"#)
        .expect(2)
        .create_async()
        .await;

    // every commit fails; both tags are still attempted and the run succeeds
    let put = github
        .mock("PUT", "/repos/hongfs/golang/contents/Dockerfile")
        .with_status(500)
        .with_body("boom")
        .expect(2)
        .create_async()
        .await;

    tagsync::sync::run(&config(&upstream, &mirror, &github))
        .await
        .unwrap();

    put.assert_async().await;
}
