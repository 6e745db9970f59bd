//! Export chunk and API response fixtures

use serde_json::{Value, json};

/// Header of the full default column set
pub const FULL_HEADER: &str = "GROUP_PUBLIC_ID,GROUP_SLUG,ORG_PUBLIC_ID,ORG_DISPLAY_NAME,ISSUE_SEVERITY_RANK,ISSUE_SEVERITY,SCORE,PROBLEM_TITLE,CVE,CWE,PROJECT_NAME,PROJECT_URL,FIRST_INTRODUCED,PRODUCT_NAME,ISSUE_URL,ISSUE_STATUS";

/// Chunk with two organizations and two statuses
pub const CHUNK_ONE: &str = "\
GROUP_PUBLIC_ID,GROUP_SLUG,ORG_PUBLIC_ID,ORG_DISPLAY_NAME,ISSUE_SEVERITY_RANK,ISSUE_SEVERITY,SCORE,PROBLEM_TITLE,CVE,CWE,PROJECT_NAME,PROJECT_URL,FIRST_INTRODUCED,PRODUCT_NAME,ISSUE_URL,ISSUE_STATUS
g-1,acme,o-1,payments,1,Critical,900,Remote Code Execution,\"[\"\"CVE-2024-0001\"\"]\",\"[\"\"CWE-94\"\"]\",payments-api,https://app.snyk.io/p/1,2025-01-03 10:00:00,Snyk Open Source,https://app.snyk.io/i/1,Open
g-1,acme,o-2,web,3,Medium,410,Cross-site Scripting (XSS),,\"[\"\"CWE-79\"\"]\",web-ui,https://app.snyk.io/p/2,2025-01-04 11:00:00,Snyk Code,https://app.snyk.io/i/2,Open
g-1,acme,o-1,payments,2,High,650,Prototype Pollution,\"[\"\"CVE-2024-0002\"\"]\",,payments-api,https://app.snyk.io/p/1,2025-01-05 12:00:00,Snyk Open Source,https://app.snyk.io/i/3,Resolved
";

/// Chunk continuing the same export, including an unrecognized severity
pub const CHUNK_TWO: &str = "\
GROUP_PUBLIC_ID,GROUP_SLUG,ORG_PUBLIC_ID,ORG_DISPLAY_NAME,ISSUE_SEVERITY_RANK,ISSUE_SEVERITY,SCORE,PROBLEM_TITLE,CVE,CWE,PROJECT_NAME,PROJECT_URL,FIRST_INTRODUCED,PRODUCT_NAME,ISSUE_URL,ISSUE_STATUS
g-1,acme,o-2,web,4,Low,120,Information Exposure,,,web-ui,https://app.snyk.io/p/2,2025-01-06 09:00:00,Snyk Code,https://app.snyk.io/i/4,Open
g-1,acme,o-1,payments,1,critical,880,Deserialization of Untrusted Data,,,payments-api,https://app.snyk.io/p/1,2025-01-07 09:30:00,Snyk Open Source,https://app.snyk.io/i/5,Open
g-1,acme,o-2,web,2,High,700,SQL Injection,,\"[\"\"CWE-89\"\"]\",web-ui,https://app.snyk.io/p/2,2025-01-08 15:00:00,Snyk Code,https://app.snyk.io/i/6,Ignored
";

/// Chunk with the same columns as [`CHUNK_ONE`] in a different order
pub const CHUNK_REORDERED: &str = "\
ISSUE_STATUS,ISSUE_SEVERITY,ORG_DISPLAY_NAME,ORG_PUBLIC_ID,PROBLEM_TITLE,SCORE,ISSUE_SEVERITY_RANK,GROUP_PUBLIC_ID,GROUP_SLUG,CVE,CWE,PROJECT_NAME,PROJECT_URL,FIRST_INTRODUCED,PRODUCT_NAME,ISSUE_URL
Open,Low,web,o-2,Information Exposure,120,4,g-1,acme,,,web-ui,https://app.snyk.io/p/2,2025-01-06 09:00:00,Snyk Code,https://app.snyk.io/i/4
Resolved,Critical,payments,o-1,Remote Code Execution,910,1,g-1,acme,\"[\"\"CVE-2024-0009\"\"]\",,payments-api,https://app.snyk.io/p/1,2025-01-09 08:00:00,Snyk Open Source,https://app.snyk.io/i/7
Open,High,web,o-2,SQL Injection,700,2,g-1,acme,,\"[\"\"CWE-89\"\"]\",web-ui,https://app.snyk.io/p/2,2025-01-08 15:00:00,Snyk Code,https://app.snyk.io/i/6
";

/// Accepted job-creation body
pub fn created_body(id: &str) -> Value {
    json!({
        "data": {
            "id": id,
            "type": "resource",
            "attributes": { "created": "2025-02-01T00:00:00Z" }
        }
    })
}

/// Status response
pub fn status_body(status: &str) -> Value {
    json!({ "data": { "id": "job-1", "attributes": { "status": status } } })
}

/// Result listing pointing at `urls`
pub fn listing_body(urls: &[String], row_count: u64) -> Value {
    let results: Vec<Value> = urls
        .iter()
        .map(|url| json!({ "url": url, "file_size": 2048, "row_count": 3 }))
        .collect();
    json!({
        "data": {
            "id": "job-1",
            "type": "resource",
            "attributes": {
                "finished": "2025-02-01T00:01:00Z",
                "formats": ["csv"],
                "introduced_date_range": {
                    "from": "2025-01-01T00:00:00Z",
                    "to": "2025-01-31T23:59:59Z"
                },
                "results": results,
                "row_count": row_count,
                "status": "FINISHED"
            }
        }
    })
}
