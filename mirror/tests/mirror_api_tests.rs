use std::sync::Arc;

use keygate_mirror::{
    build_router, AggregateResponse, HealthResponse, MirrorDir, MirrorState,
    OwnerLicensesResponse, SyncResponse, UploadResponse,
};
use keygate_types::{DurationKind, LicenseMap, LicenseRecord};
use tempfile::TempDir;

const SECRET: &str = "test-upload-secret";

fn subset(keys: &[&str]) -> LicenseMap {
    let mut map = LicenseMap::new();
    for key in keys {
        let mut record = LicenseRecord::issued(DurationKind::SevenDays);
        record.redeemed = true;
        record.owner_id = Some("42".into());
        map.insert((*key).into(), record);
    }
    map
}

/// Spin up the mirror on an OS-assigned port, returning the base URL and
/// the data directory guard.
async fn spawn_test_server() -> (String, TempDir) {
    let dir = TempDir::new().unwrap();
    let state = Arc::new(MirrorState {
        upload_secret: SECRET.to_string(),
        files: MirrorDir::new(dir.path()),
    });
    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (format!("http://127.0.0.1:{}", port), dir)
}

#[tokio::test]
async fn health_endpoint_reports_healthy() {
    let (base, _dir) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/health", base)).await.unwrap();

    assert_eq!(resp.status(), 200);
    let body: HealthResponse = resp.json().await.unwrap();
    assert_eq!(body.status, "healthy");
    assert!(!body.timestamp.is_empty());
}

#[tokio::test]
async fn upload_without_secret_is_unauthorized() {
    let (base, _dir) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/upload/42", base))
        .json(&subset(&["KG-7DAYS-AAAAAA"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);

    let resp = client
        .post(format!("{}/upload/42", base))
        .bearer_auth("wrong-secret")
        .json(&subset(&["KG-7DAYS-AAAAAA"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn upload_rejects_empty_body() {
    let (base, _dir) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/upload/42", base))
        .bearer_auth(SECRET)
        .json(&LicenseMap::new())
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    // No body at all is also a 400, not a 500.
    let resp = client
        .post(format!("{}/upload/42", base))
        .bearer_auth(SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn upload_rejects_path_hostile_owner_id() {
    let (base, _dir) = spawn_test_server().await;
    let client = reqwest::Client::new();

    let resp = client
        .post(format!("{}/upload/a.b", base))
        .bearer_auth(SECRET)
        .json(&subset(&["KG-7DAYS-AAAAAA"]))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn upload_then_lookup_round_trips() {
    let (base, _dir) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let licenses = subset(&["KG-7DAYS-AAAAAA", "KG-7DAYS-BBBBBB"]);

    let resp = client
        .post(format!("{}/upload/42", base))
        .bearer_auth(SECRET)
        .json(&licenses)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let ack: UploadResponse = resp.json().await.unwrap();
    assert!(ack.success);
    assert_eq!(ack.count, 2);

    let resp = reqwest::get(format!("{}/licenses/42", base)).await.unwrap();
    assert_eq!(resp.status(), 200);
    let body: OwnerLicensesResponse = resp.json().await.unwrap();
    assert_eq!(body.owner_id, "42".into());
    assert_eq!(body.licenses, licenses);
}

#[tokio::test]
async fn upload_replaces_previous_subset() {
    let (base, _dir) = spawn_test_server().await;
    let client = reqwest::Client::new();

    for keys in [
        &["KG-7DAYS-AAAAAA", "KG-7DAYS-BBBBBB"][..],
        &["KG-7DAYS-CCCCCC"][..],
    ] {
        let resp = client
            .post(format!("{}/upload/42", base))
            .bearer_auth(SECRET)
            .json(&subset(keys))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // Full replace, not merge: only the second upload's key remains.
    let body: OwnerLicensesResponse = reqwest::get(format!("{}/licenses/42", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body.licenses.len(), 1);
    assert!(body.licenses.contains_key(&"KG-7DAYS-CCCCCC".into()));
}

#[tokio::test]
async fn lookup_unknown_owner_is_404() {
    let (base, _dir) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/licenses/999", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn aggregate_requires_secret() {
    let (base, _dir) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/licenses", base)).await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn aggregate_unions_owner_files() {
    let (base, _dir) = spawn_test_server().await;
    let client = reqwest::Client::new();

    client
        .post(format!("{}/upload/42", base))
        .bearer_auth(SECRET)
        .json(&subset(&["KG-7DAYS-AAAAAA"]))
        .send()
        .await
        .unwrap();
    client
        .post(format!("{}/upload/99", base))
        .bearer_auth(SECRET)
        .json(&subset(&["KG-7DAYS-BBBBBB", "KG-7DAYS-CCCCCC"]))
        .send()
        .await
        .unwrap();

    let resp = client
        .get(format!("{}/licenses", base))
        .bearer_auth(SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: AggregateResponse = resp.json().await.unwrap();
    assert_eq!(body.total, 3);
    assert!(body.licenses.contains_key(&"KG-7DAYS-AAAAAA".into()));
    assert!(body.licenses.contains_key(&"KG-7DAYS-CCCCCC".into()));
}

#[tokio::test]
async fn sync_rebuilds_aggregate_from_owner_files() {
    let (base, dir) = spawn_test_server().await;
    let client = reqwest::Client::new();

    // Drop an owner file in place without going through /upload, as a
    // restore from backup would.
    let files = MirrorDir::new(dir.path());
    files
        .save_owner(&"7".into(), &subset(&["KG-7DAYS-DDDDDD"]))
        .unwrap();

    let resp = client
        .post(format!("{}/sync", base))
        .bearer_auth(SECRET)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let body: SyncResponse = resp.json().await.unwrap();
    assert!(body.success);

    let agg: AggregateResponse = client
        .get(format!("{}/licenses", base))
        .bearer_auth(SECRET)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(agg.total, 1);
}

#[tokio::test]
async fn sync_requires_secret() {
    let (base, _dir) = spawn_test_server().await;
    let client = reqwest::Client::new();
    let resp = client.post(format!("{}/sync", base)).send().await.unwrap();
    assert_eq!(resp.status(), 401);
}

#[tokio::test]
async fn unknown_route_returns_404() {
    let (base, _dir) = spawn_test_server().await;
    let resp = reqwest::get(format!("{}/nonexistent", base)).await.unwrap();
    assert_eq!(resp.status(), 404);
}
