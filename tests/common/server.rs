//! Mock export API

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use super::fixtures::{created_body, listing_body, status_body};

/// Mount a group export that goes PENDING -> FINISHED and lists `chunks`
///
/// Each chunk is served from `/files/<n>.csv`; `None` makes that chunk fail
/// with a 403, as an expired signed URL would.
pub async fn mount_group_export(server: &MockServer, chunks: &[Option<&str>]) {
    Mock::given(method("POST"))
        .and(path("/rest/groups/grp-1/export"))
        .and(query_param("version", "2024-10-15"))
        .and(header("authorization", "token integration-token"))
        .respond_with(ResponseTemplate::new(202).set_body_json(created_body("job-1")))
        .expect(1)
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/rest/groups/grp-1/jobs/export/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("PENDING")))
        .up_to_n_times(1)
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/groups/grp-1/jobs/export/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(status_body("FINISHED")))
        .mount(server)
        .await;

    let urls: Vec<String> = (1..=chunks.len())
        .map(|i| format!("{}/files/{i}.csv", server.uri()))
        .collect();
    Mock::given(method("GET"))
        .and(path("/rest/groups/grp-1/export/job-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(listing_body(&urls, 6)))
        .mount(server)
        .await;

    for (i, chunk) in chunks.iter().enumerate() {
        let response = match chunk {
            Some(body) => ResponseTemplate::new(200).set_body_string(*body),
            None => ResponseTemplate::new(403).set_body_string("Request has expired"),
        };
        Mock::given(method("GET"))
            .and(path(format!("/files/{}.csv", i + 1)))
            .respond_with(response)
            .expect(1)
            .mount(server)
            .await;
    }
}
