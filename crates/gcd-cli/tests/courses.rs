//! `gcd courses` against a mock backend.

mod support;

use predicates::prelude::*;
use serde_json::Value;
use support::{can_bind_localhost, gcd, sign_in, temp_gcd_home, three_courses};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_courses_lists_ids_and_names() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gcd_home();
    sign_in(home.path());
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_courses()))
        .mount(&server)
        .await;

    gcd(home.path(), &server.uri())
        .arg("courses")
        .assert()
        .success()
        .stdout(predicate::str::contains("a  Math"))
        .stdout(predicate::str::contains("b  Art  (Period 2)"))
        .stdout(predicate::str::contains("c  CS"));
}

#[tokio::test]
async fn test_courses_json_output() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gcd_home();
    sign_in(home.path());
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_courses()))
        .mount(&server)
        .await;

    let output = gcd(home.path(), &server.uri())
        .args(["courses", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let courses: Value = serde_json::from_slice(&output.stdout).unwrap();
    let ids: Vec<&str> = courses
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["id"].as_str().unwrap())
        .collect();
    assert_eq!(ids, ["a", "b", "c"]);
}

#[tokio::test]
async fn test_courses_null_list_is_empty() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gcd_home();
    sign_in(home.path());
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/list"))
        .respond_with(ResponseTemplate::new(200).set_body_string("null"))
        .mount(&server)
        .await;

    gcd(home.path(), &server.uri())
        .arg("courses")
        .assert()
        .success()
        .stdout(predicate::str::contains("No courses found."));
}

#[tokio::test]
async fn test_courses_refresh_discovers_first() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gcd_home();
    sign_in(home.path());
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/discover"))
        .respond_with(ResponseTemplate::new(303).insert_header("location", "http://frontend.test/"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/courses/list"))
        .respond_with(ResponseTemplate::new(200).set_body_json(three_courses()))
        .expect(1)
        .mount(&server)
        .await;

    gcd(home.path(), &server.uri())
        .args(["courses", "--refresh"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Math"));
}

#[tokio::test]
async fn test_courses_unauthenticated_suggests_login() {
    if !can_bind_localhost() {
        eprintln!("Skipping: cannot bind localhost TCP port in this environment.");
        return;
    }
    let home = temp_gcd_home();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/courses/list"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    gcd(home.path(), &server.uri())
        .arg("courses")
        .assert()
        .failure()
        .stderr(predicate::str::contains("gcd login"));
}
